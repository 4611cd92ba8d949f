//! External transforms the pipeline delegates to: minifiers, the transpiler and the linter.
//!
//! The fingerprinting core never calls these itself. The builder invokes them between
//! stages and only relies on their input/output path contracts.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::json;

use crate::asset_paths::to_web_path;

/// Black-box transforms invoked by the build pipeline.
pub trait AssetTransforms {
  /// Minify a stylesheet into `output`, writing a companion `<output>.map`.
  fn minify_css(&self, input: &Path, output: &Path) -> Result<()>;

  /// Minify a script into `output`, writing a companion `<output>.map`.
  fn minify_js(&self, input: &Path, output: &Path) -> Result<()>;

  /// Convert a pending-transpile script into a plain script at `output`.
  fn transpile(&self, input: &Path, output: &Path) -> Result<()>;

  /// Check scripts and return advisory findings. Findings never affect the output.
  fn lint(&self, files: &[PathBuf]) -> Result<Vec<String>>;
}

/// Path of the source map accompanying a minified file.
pub fn map_path_for(output: &Path) -> PathBuf {
  let mut name = OsString::from(output.as_os_str());
  name.push(".map");
  PathBuf::from(name)
}

/// Transforms that copy content unchanged.
///
/// Useful for dry runs and tests. The stylesheet maps it writes carry the fully qualified
/// input path in `sources`, the same way the real CSS minifier does.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransforms;

impl PassthroughTransforms {
  fn copy_with_map(&self, input: &Path, output: &Path, qualified_sources: bool) -> Result<()> {
    copy_if_distinct(input, output)?;

    let source = if qualified_sources {
      to_web_path(input)
    } else {
      file_name_of(input)
    };
    let map = json!({
      "version": 3,
      "file": file_name_of(output),
      "sources": [source],
      "names": [],
      "mappings": ""
    });
    let map_path = map_path_for(output);
    fs::write(&map_path, serde_json::to_string(&map)?)
      .with_context(|| format!("failed to write {}", map_path.display()))
  }
}

impl AssetTransforms for PassthroughTransforms {
  fn minify_css(&self, input: &Path, output: &Path) -> Result<()> {
    self.copy_with_map(input, output, true)
  }

  fn minify_js(&self, input: &Path, output: &Path) -> Result<()> {
    self.copy_with_map(input, output, false)
  }

  fn transpile(&self, input: &Path, output: &Path) -> Result<()> {
    copy_if_distinct(input, output)
  }

  fn lint(&self, _files: &[PathBuf]) -> Result<Vec<String>> {
    Ok(Vec::new())
  }
}

/// Command templates for the external tools. Arguments may contain `{input}` and
/// `{output}` placeholders; the linter receives the file list appended to its arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransformCommands {
  /// Stylesheet minifier, e.g. `["cleancss", "--source-map", "-o", "{output}", "{input}"]`.
  pub css_minifier: Option<Vec<String>>,
  /// Script minifier.
  pub js_minifier: Option<Vec<String>>,
  /// Pending-transpile script compiler.
  pub transpiler: Option<Vec<String>>,
  /// Advisory lint checker.
  pub linter: Option<Vec<String>>,
}

/// Transforms backed by operator-configured commands, falling back to passthrough for
/// every stage without a command.
#[derive(Debug, Clone, Default)]
pub struct CommandTransforms {
  commands: TransformCommands,
  fallback: PassthroughTransforms,
}

impl CommandTransforms {
  /// Create transforms for the configured commands.
  pub fn new(commands: TransformCommands) -> Self {
    Self {
      commands,
      fallback: PassthroughTransforms,
    }
  }

  fn run(template: &[String], input: &Path, output: &Path) -> Result<()> {
    let (program, args) = template
      .split_first()
      .ok_or_else(|| anyhow!("empty transform command"))?;
    let status = Command::new(program)
      .args(args.iter().map(|arg| substitute(arg, input, output)))
      .status()
      .with_context(|| format!("failed to run `{program}`"))?;

    if !status.success() {
      return Err(anyhow!(
        "`{program}` failed with status {status} for {}",
        input.display()
      ));
    }
    Ok(())
  }
}

impl AssetTransforms for CommandTransforms {
  fn minify_css(&self, input: &Path, output: &Path) -> Result<()> {
    match &self.commands.css_minifier {
      Some(template) => Self::run(template, input, output),
      None => self.fallback.minify_css(input, output),
    }
  }

  fn minify_js(&self, input: &Path, output: &Path) -> Result<()> {
    match &self.commands.js_minifier {
      Some(template) => Self::run(template, input, output),
      None => self.fallback.minify_js(input, output),
    }
  }

  fn transpile(&self, input: &Path, output: &Path) -> Result<()> {
    match &self.commands.transpiler {
      Some(template) => Self::run(template, input, output),
      None => self.fallback.transpile(input, output),
    }
  }

  fn lint(&self, files: &[PathBuf]) -> Result<Vec<String>> {
    let Some(template) = &self.commands.linter else {
      return self.fallback.lint(files);
    };
    if files.is_empty() {
      return Ok(Vec::new());
    }
    let (program, args) = template
      .split_first()
      .ok_or_else(|| anyhow!("empty lint command"))?;

    let output = Command::new(program)
      .args(args)
      .args(files)
      .output()
      .with_context(|| format!("failed to run `{program}`"))?;

    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }
}

fn substitute(arg: &str, input: &Path, output: &Path) -> String {
  arg
    .replace("{input}", &input.to_string_lossy())
    .replace("{output}", &output.to_string_lossy())
}

fn copy_if_distinct(input: &Path, output: &Path) -> Result<()> {
  if input == output {
    return Ok(());
  }
  if let Some(parent) = output.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  fs::copy(input, output).with_context(|| {
    format!(
      "failed to copy {} to {}",
      input.display(),
      output.display()
    )
  })?;
  Ok(())
}

fn file_name_of(path: &Path) -> String {
  path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default()
}
