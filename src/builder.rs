//! Build orchestrator running the copy, transform, rewrite and publish stages in order.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use same_file::is_same_file;
use tracing::{error, info, warn};

use crate::content::FsContent;
use crate::fingerprint::FingerprintNamer;
use crate::mapper::PathMapper;
use crate::models::BuildReport;
use crate::project::{BuildContext, COMMON_JS_DIR, CSS_DIR, FONTS_DIR, SCRIPTS_SCOPE, THIRD_PARTY_DIR};
use crate::rewrite::{DocumentPaths, ReferenceRewriter, RewriteRule, rewrite_document};
use crate::selection::{ALL_FILE_TYPES, SourceSelection, select_files, third_party_file_types};
use crate::transforms::AssetTransforms;

/// Generic build result type used across the orchestration layer.
pub type BuildResult<T> = anyhow::Result<T>;

#[derive(Debug, Clone, Copy)]
enum Minify {
  Stylesheet,
  Script,
}

#[derive(Debug, Clone, Copy)]
enum Naming {
  Hashed,
  Versioned,
}

/// Runs the build stages against one [`PathMapper`] shared by all of them.
///
/// Stages must run in order: the copy stages register every asset before the HTML stage
/// rewrites references. [`AssetBuilder::build`] enforces that order; callers running
/// stages individually are responsible for it.
pub struct AssetBuilder<T: AssetTransforms> {
  context: BuildContext,
  transforms: T,
  mapper: PathMapper,
  report: BuildReport,
}

impl<T: AssetTransforms> AssetBuilder<T> {
  /// Create a builder for the provided context and external transforms.
  pub fn new(context: BuildContext, transforms: T) -> Self {
    Self {
      context,
      transforms,
      mapper: PathMapper::new(),
      report: BuildReport::default(),
    }
  }

  /// Path mappings registered so far.
  pub fn mapper(&self) -> &PathMapper {
    &self.mapper
  }

  /// Counters collected so far.
  pub fn report(&self) -> &BuildReport {
    &self.report
  }

  /// Run every stage from a clean slate and return the report.
  pub fn build(&mut self) -> BuildResult<&BuildReport> {
    self.mapper.clear();
    self.report = BuildReport::default();

    self.clean_all()?;
    self.common_css()?;
    self.common_js()?;
    self.third_party()?;
    self.html()?;
    self.hint()?;
    self.finalize()?;

    info!(
      assets = self.report.assets_registered,
      documents = self.report.documents_rewritten,
      bundles = self.report.bundles_written,
      published = self.report.files_published,
      "build finished"
    );
    Ok(&self.report)
  }

  /// Remove the target and intermediate trees.
  pub fn clean_all(&self) -> BuildResult<()> {
    remove_tree(&self.context.layout.target_root)?;
    self.clean_intermediate()
  }

  /// Remove the intermediate tree, leaving published output alone.
  pub fn clean_intermediate(&self) -> BuildResult<()> {
    remove_tree(&self.context.layout.intermediate_root)
  }

  /// Run only the copy stages, registering every asset without transforming anything.
  pub fn fingerprint_sources(&mut self) -> BuildResult<()> {
    self.copy_common_css()?;
    self.copy_common_js()?;
    self.copy_third_party()?;
    Ok(())
  }

  /// Fingerprint, minify and repair the maps of the project stylesheets.
  pub fn common_css(&mut self) -> BuildResult<()> {
    self.copy_common_css()?;
    let dir = self.context.layout.intermediate(CSS_DIR);
    let stylesheets = self.stylesheets();
    self.minify_all(&dir, &stylesheets, Minify::Stylesheet);
    self.repair_maps(&dir)?;
    Ok(())
  }

  /// Fingerprint, transpile and minify the first-party scripts.
  pub fn common_js(&mut self) -> BuildResult<()> {
    self.copy_common_js()?;
    let dir = self.context.layout.intermediate(COMMON_JS_DIR);
    let pending = SourceSelection::new()
      .with_extensions(self.script_extensions())
      .excluding_suffixes([self.minified_suffix(&self.context.conventions.script_ext)]);
    let scripts = self.plain_scripts();
    self.transpile_all(&dir, &pending);
    self.minify_all(&dir, &scripts, Minify::Script);
    Ok(())
  }

  /// Version, minify and repair the vendor files, then copy vendor fonts verbatim.
  pub fn third_party(&mut self) -> BuildResult<()> {
    self.copy_third_party()?;
    let dir = self.context.layout.intermediate(THIRD_PARTY_DIR);
    let (stylesheets, scripts) = (self.stylesheets(), self.plain_scripts());
    self.minify_all(&dir, &stylesheets, Minify::Stylesheet);
    self.repair_maps(&dir)?;
    self.minify_all(&dir, &scripts, Minify::Script);

    let fonts = select_files(&self.context.layout.source_fonts(), &SourceSelection::new())?;
    for relative in &fonts {
      install_asset(
        &self.context.layout.source_fonts().join(relative),
        &self.context.layout.intermediate_fonts().join(relative),
      )?;
    }
    info!(count = fonts.len(), "copied third-party fonts");
    Ok(())
  }

  /// Rewrite every HTML page into the intermediate tree, then transpile and minify the
  /// page-level scripts and bundles.
  pub fn html(&mut self) -> BuildResult<()> {
    let layout = &self.context.layout;
    let rules = RewriteRule::html_rules(&self.context.markers);
    let pages = select_files(
      &layout.source_root,
      &SourceSelection::new().with_extensions(["html"]),
    )?;

    for relative in &pages {
      let source = layout.source_root.join(relative);
      let destination = layout.intermediate_root.join(relative);
      let text = fs::read_to_string(&source)
        .with_context(|| format!("failed to read {}", source.display()))?;
      let paths = DocumentPaths::new(&source, &destination)?;

      let outcome = rewrite_document(
        &self.mapper,
        &FsContent,
        &self.context.conventions,
        &text,
        &paths,
        &rules,
      )?;

      write_output(&destination, outcome.text.as_bytes())?;
      self.report.documents_rewritten += 1;
      self.report.unresolved_references.extend(outcome.unresolved);
      for bundle in outcome.bundles {
        self.report.bundles_written += 1;
        self.report.missing_bundled_files.extend(bundle.missing);
      }
    }
    info!(count = pages.len(), "rewrote html documents");

    let root = self.context.layout.intermediate_root.clone();
    let page_pending = SourceSelection::new()
      .with_extensions([self.context.conventions.pending_script_ext.clone()])
      .excluding_scopes([SCRIPTS_SCOPE]);
    self.transpile_all(&root, &page_pending);
    let page_scripts = self.plain_scripts().excluding_scopes([SCRIPTS_SCOPE]);
    self.minify_all(&root, &page_scripts, Minify::Script);
    Ok(())
  }

  /// Run the advisory lint checker over every non-minified script.
  pub fn hint(&mut self) -> BuildResult<()> {
    let common_dir = self.context.layout.intermediate(COMMON_JS_DIR);
    let root = self.context.layout.intermediate_root.clone();

    let mut files: Vec<PathBuf> = select_files(&common_dir, &self.plain_scripts())?
      .into_iter()
      .map(|relative| common_dir.join(relative))
      .collect();
    let page_scripts = self.plain_scripts().excluding_scopes([SCRIPTS_SCOPE]);
    files.extend(
      select_files(&root, &page_scripts)?
        .into_iter()
        .map(|relative| root.join(relative)),
    );

    match self.transforms.lint(&files) {
      Ok(findings) => {
        for finding in &findings {
          warn!(finding = %finding, "lint");
        }
        self.report.lint_findings.extend(findings);
      }
      Err(err) => warn!(error = %err, "lint checker failed, continuing"),
    }
    Ok(())
  }

  /// Publish known file types from the intermediate tree into the target tree.
  pub fn finalize(&mut self) -> BuildResult<()> {
    let layout = &self.context.layout;
    let published = SourceSelection::new().with_extensions(ALL_FILE_TYPES.iter().copied());
    let files = select_files(&layout.intermediate_root, &published)?;
    for relative in &files {
      install_asset(
        &layout.intermediate_root.join(relative),
        &layout.target_root.join(relative),
      )?;
    }
    self.report.files_published = files.len();
    self.report.assets_registered = self.mapper.len();
    info!(count = files.len(), target = %layout.target_root.display(), "published build");

    if !self.context.keep_intermediate {
      remove_tree(&layout.intermediate_root)?;
    }
    Ok(())
  }

  /// Fingerprint `css/**/*.css` into the intermediate tree.
  pub fn copy_common_css(&mut self) -> BuildResult<()> {
    let selection = SourceSelection::new()
      .with_extensions([self.context.conventions.stylesheet_ext.clone()]);
    self.copy_renamed(CSS_DIR, &selection, Naming::Hashed)
  }

  /// Fingerprint `js/common/**/*.{js,jsx}` into the intermediate tree.
  pub fn copy_common_js(&mut self) -> BuildResult<()> {
    let selection = SourceSelection::new()
      .with_extensions(self.script_extensions())
      .excluding_names(self.context.excluded_scripts.iter().cloned());
    self.copy_renamed(COMMON_JS_DIR, &selection, Naming::Hashed)
  }

  /// Version `js/third/**` into the intermediate tree, skipping minified files and fonts.
  pub fn copy_third_party(&mut self) -> BuildResult<()> {
    let conventions = &self.context.conventions;
    let selection = SourceSelection::new()
      .with_extensions(third_party_file_types())
      .excluding_suffixes([
        self.minified_suffix(&conventions.stylesheet_ext),
        self.minified_suffix(&conventions.script_ext),
      ])
      .excluding_scopes([FONTS_DIR]);
    self.copy_renamed(THIRD_PARTY_DIR, &selection, Naming::Versioned)
  }

  fn copy_renamed(&mut self, section: &str, selection: &SourceSelection, naming: Naming) -> BuildResult<()> {
    let source_dir = self.context.layout.source(section);
    let dest_dir = self.context.layout.intermediate(section);
    let namer = FingerprintNamer::new(&FsContent, &self.context.conventions, &self.context.versions);

    let files = select_files(&source_dir, selection)?;
    for relative in &files {
      let next = match naming {
        Naming::Hashed => namer.hashed_name(&mut self.mapper, &source_dir, &dest_dir, relative)?,
        Naming::Versioned => {
          namer.versioned_name(&mut self.mapper, &source_dir, &dest_dir, relative)?
        }
      };
      install_asset(&source_dir.join(relative), &dest_dir.join(next))?;
    }

    info!(section, count = files.len(), "copied assets into the intermediate tree");
    Ok(())
  }

  fn minify_all(&mut self, dir: &Path, selection: &SourceSelection, kind: Minify) {
    let files = match select_files(dir, selection) {
      Ok(files) => files,
      Err(err) => {
        error!(dir = %dir.display(), error = %err, "failed to list files for minifying");
        self.report.transform_failures.push(dir.to_path_buf());
        return;
      }
    };

    for relative in files {
      let input = dir.join(&relative);
      let Some(output) = self.minified_path(&input) else {
        continue;
      };
      let result = match kind {
        Minify::Stylesheet => self.transforms.minify_css(&input, &output),
        Minify::Script => self.transforms.minify_js(&input, &output),
      };
      if let Err(err) = result {
        error!(file = %input.display(), error = %err, "minifier failed");
        self.report.transform_failures.push(input);
      }
    }
  }

  fn transpile_all(&mut self, dir: &Path, selection: &SourceSelection) {
    let files = match select_files(dir, selection) {
      Ok(files) => files,
      Err(err) => {
        error!(dir = %dir.display(), error = %err, "failed to list files for transpiling");
        self.report.transform_failures.push(dir.to_path_buf());
        return;
      }
    };

    for relative in files {
      let input = dir.join(&relative);
      let output = input.with_extension(&self.context.conventions.script_ext);
      if let Err(err) = self.transforms.transpile(&input, &output) {
        error!(file = %input.display(), error = %err, "transpiler failed");
        self.report.transform_failures.push(input);
      }
    }
  }

  fn repair_maps(&mut self, dir: &Path) -> BuildResult<()> {
    let suffix = format!("{}.map", self.minified_suffix(&self.context.conventions.stylesheet_ext));
    let maps = select_files(dir, &SourceSelection::new().with_extensions(["map"]))?;
    let rules = [RewriteRule::map_sources()];
    let rewriter = ReferenceRewriter::new(&self.mapper, &FsContent);

    for relative in maps {
      let path = dir.join(&relative);
      if !path.to_string_lossy().ends_with(&suffix) {
        continue;
      }
      let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
      let paths = DocumentPaths::new(&path, &path)?;
      let repaired = rewriter.rewrite(&text, &paths, &rules)?;
      if repaired.text != text {
        write_output(&path, repaired.text.as_bytes())?;
      }
      self.report.maps_repaired += repaired.sources_repaired;
    }
    Ok(())
  }

  fn minified_path(&self, input: &Path) -> Option<PathBuf> {
    let stem = input.file_stem()?.to_str()?;
    let ext = input.extension()?.to_str()?;
    Some(input.with_file_name(self.context.conventions.minified_name(stem, ext)))
  }

  fn minified_suffix(&self, ext: &str) -> String {
    format!(".{}.{ext}", self.context.conventions.minified_marker)
  }

  fn script_extensions(&self) -> [String; 2] {
    [
      self.context.conventions.script_ext.clone(),
      self.context.conventions.pending_script_ext.clone(),
    ]
  }

  fn stylesheets(&self) -> SourceSelection {
    let ext = &self.context.conventions.stylesheet_ext;
    SourceSelection::new()
      .with_extensions([ext.clone()])
      .excluding_suffixes([self.minified_suffix(ext)])
  }

  fn plain_scripts(&self) -> SourceSelection {
    let ext = &self.context.conventions.script_ext;
    SourceSelection::new()
      .with_extensions([ext.clone()])
      .excluding_suffixes([self.minified_suffix(ext)])
  }
}

fn remove_tree(root: &Path) -> BuildResult<()> {
  match fs::remove_dir_all(root) {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
    Err(err) => Err(err).with_context(|| format!("failed to remove {}", root.display())),
  }
}

fn write_output(destination: &Path, bytes: &[u8]) -> BuildResult<()> {
  if let Some(parent) = destination.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  fs::write(destination, bytes).with_context(|| format!("failed to write {}", destination.display()))
}

/// Copy `source` to `destination`, creating parent directories. Installing a file onto
/// itself is a no-op.
fn install_asset(source: &Path, destination: &Path) -> BuildResult<()> {
  if destination.exists() && is_same_file(source, destination)? {
    return Ok(());
  }
  if let Some(parent) = destination.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  fs::copy(source, destination).with_context(|| {
    format!(
      "failed to copy {} to {}",
      source.display(),
      destination.display()
    )
  })?;
  Ok(())
}
