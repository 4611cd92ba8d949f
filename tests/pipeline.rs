use std::fs;
use std::path::{Path, PathBuf};

use hashed_assets::AssetBuilder;
use hashed_assets::config::ProjectConfig;
use hashed_assets::fingerprint::content_fingerprint;
use hashed_assets::transforms::PassthroughTransforms;
use tempfile::tempdir;

const INDEX: &str = r#"<html>
<head>
<link rel="stylesheet" href="js/third/bootstrap.css">
<link rel="stylesheet" href="css/site.css">
<link rel="stylesheet" href="https://fonts.example.com/roboto.css">
</head>
<body>
<script src="js/third/jquery.js"></script>
<script src="js/common/app.js"></script>
<!-- Project javascripts starts here -->
<script src="page.jsx"></script>
<script src="js/common/widget.jsx"></script>
<script src='extra.jsx'></script>
<script src="gone.jsx"></script>
<!-- Project javascripts ends here -->
</body>
</html>
"#;

fn write(root: &Path, relative: &str, content: &str) {
  let path = root.join(relative);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

fn seed_project(project: &Path) {
  let source = project.join("source");
  write(&source, "css/site.css", "body{margin:0}");
  write(&source, "js/common/app.js", "lib();");
  write(&source, "js/common/widget.jsx", "widget();");
  write(&source, "js/common/entry.jsx", "boot();");
  write(&source, "js/third/bootstrap.css", ".btn{}");
  write(&source, "js/third/bootstrap.min.css", ".btn{}");
  write(&source, "js/third/jquery.js", "jq();");
  write(&source, "js/third/fonts/glyphs.woff", "woff");
  write(&source, "page.jsx", "page();");
  write(&source, "extra.jsx", "extra();");
  write(&source, "index.html", INDEX);
  write(
    &source,
    "pages/about.html",
    r#"<link rel="stylesheet" href="../css/site.css">"#,
  );
}

fn config() -> ProjectConfig {
  ProjectConfig {
    third_party_versions: [("bootstrap", "3-3-5")].into_iter().collect(),
    ..ProjectConfig::default()
  }
}

fn bundle_in(dir: &Path) -> PathBuf {
  fs::read_dir(dir)
    .unwrap()
    .map(|entry| entry.unwrap().path())
    .find(|path| {
      let name = path.file_name().unwrap().to_string_lossy();
      name.starts_with("index-bundle-") && name.ends_with(".min.js")
    })
    .expect("bundle was not published")
}

#[test]
fn build_publishes_fingerprinted_site() {
  let temp = tempdir().unwrap();
  let project = temp.path();
  seed_project(project);

  let context = config().to_context(project).unwrap();
  let mut builder = AssetBuilder::new(context, PassthroughTransforms);
  let report = builder.build().unwrap().clone();

  let target = project.join("target");
  let site_hash = content_fingerprint(b"body{margin:0}", 8);
  let app_hash = content_fingerprint(b"lib();", 8);
  let widget_hash = content_fingerprint(b"widget();", 8);

  let index = fs::read_to_string(target.join("index.html")).unwrap();
  assert!(index.contains(r#"href="js/third/bootstrap-3-3-5.min.css""#));
  assert!(index.contains(&format!(r#"href="css/site-{site_hash}.min.css""#)));
  assert!(index.contains(r#"href="https://fonts.example.com/roboto.css""#));
  assert!(index.contains(r#"src="js/third/jquery.min.js""#));
  assert!(index.contains(&format!(r#"src="js/common/app-{app_hash}.min.js""#)));
  assert!(!index.contains("Project javascripts"));

  let bundle = bundle_in(&target);
  let bundle_name = bundle.file_name().unwrap().to_string_lossy().into_owned();
  assert!(index.contains(&format!(r#"<script src="{bundle_name}"></script>"#)));
  let body = fs::read_to_string(&bundle).unwrap();
  let page = body.find("page();").unwrap();
  let widget = body.find("widget();").unwrap();
  assert!(page < widget);
  let extra = body.find("extra();").unwrap();
  assert!(widget < extra);
  assert!(body.contains("/* #INFO: Merged from [js/common/widget.jsx]. */\nwidget();"));
  assert!(body.contains("/* #INFO: Merged from [extra.jsx]. */\nextra();"));
  assert!(body.contains("/* #WARN: Should be merged from [gone.jsx], but the file missed. */"));

  let about = fs::read_to_string(target.join("pages/about.html")).unwrap();
  assert_eq!(
    about,
    format!(r#"<link rel="stylesheet" href="../css/site-{site_hash}.min.css">"#)
  );

  assert!(target.join(format!("css/site-{site_hash}.min.css")).is_file());
  assert!(target.join(format!("js/common/widget-{widget_hash}.min.js")).is_file());
  assert!(target.join("js/third/fonts/glyphs.woff").is_file());
  assert!(!target.join("js/third/bootstrap.min.css").exists());
  let common: Vec<String> = fs::read_dir(target.join("js/common"))
    .unwrap()
    .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
    .collect();
  assert!(common.iter().all(|name| !name.starts_with("entry")));

  let map = fs::read_to_string(target.join("js/third/bootstrap-3-3-5.min.css.map")).unwrap();
  assert!(map.contains(r#""sources":["bootstrap-3-3-5.css"]"#));

  assert!(!project.join("intermediate").exists());
  assert_eq!(report.assets_registered, 5);
  assert_eq!(report.documents_rewritten, 2);
  assert_eq!(report.bundles_written, 1);
  assert_eq!(report.maps_repaired, 2);
  assert_eq!(report.missing_bundled_files, vec!["gone.jsx".to_string()]);
  assert!(report.transform_failures.is_empty());
  assert!(report.unresolved_references.contains(&"page.jsx".to_string()));
  assert!(report.has_problems());
}

#[test]
fn rebuilding_unchanged_sources_is_deterministic() {
  let temp = tempdir().unwrap();
  let project = temp.path();
  seed_project(project);

  let context = config().to_context(project).unwrap();
  let mut builder = AssetBuilder::new(context, PassthroughTransforms);
  builder.build().unwrap();
  let first_index = fs::read_to_string(project.join("target/index.html")).unwrap();
  let first_mapping: Vec<_> = builder.mapper().records().collect();

  builder.build().unwrap();
  let second_index = fs::read_to_string(project.join("target/index.html")).unwrap();
  let second_mapping: Vec<_> = builder.mapper().records().collect();

  assert_eq!(first_index, second_index);
  assert_eq!(first_mapping, second_mapping);
}

#[test]
fn fingerprinting_alone_registers_every_tracked_asset() {
  let temp = tempdir().unwrap();
  let project = temp.path();
  seed_project(project);

  let context = config().to_context(project).unwrap();
  let mut builder = AssetBuilder::new(context, PassthroughTransforms);
  builder.fingerprint_sources().unwrap();

  let source = project.join("source");
  let intermediate = project.join("intermediate");
  let mapper = builder.mapper();
  assert_eq!(mapper.len(), 5);
  assert_eq!(
    mapper.resolve(&source.join("js/third/bootstrap.css")),
    Some(intermediate.join("js/third/bootstrap-3-3-5.min.css").as_path())
  );
  assert!(mapper.resolve(&source.join("js/common/entry.jsx")).is_none());
  assert!(!project.join("target").exists());
}
