use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use specimen_static::{BuildConfig, GuideBuilder};
use tempfile::{tempdir, TempDir};

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config(dest: &Path) -> BuildConfig {
    let fixtures = fixtures();

    BuildConfig {
        guide_src: fixtures.join("guide"),
        guide_dest: dest.to_path_buf(),
        css_src: Some(fixtures.join("guide/css")),
        copy_internal_assets: false,
        excluded_sass_files: Some("^excluded".to_string()),
        excluded_css_files: Some("^excluded".to_string()),
        partials: [
            ("assetshead", "includes/assetshead.html"),
            ("assetsfooter", "includes/assetsfooter.html"),
        ]
        .into_iter()
        .map(|(name, path)| (name.to_string(), fixtures.join(path)))
        .collect(),
        templates: [("guide".to_string(), fixtures.join("templates/guide.html"))]
            .into_iter()
            .collect(),
        ..Default::default()
    }
}

fn setup() -> (TempDir, GuideBuilder) {
    let temp = tempdir().unwrap();
    let builder = GuideBuilder::new(config(temp.path())).unwrap();
    (temp, builder)
}

fn written_files(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }

    let mut files: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn single_component_from_absolute_path() {
    let (temp, builder) = setup();
    let target = fixtures().join("guide/_component.scss");

    let report = builder.build(Some(target.as_path())).await.unwrap();

    assert!(report.is_success());
    assert_eq!(written_files(temp.path()), vec!["component.html"]);

    let page = fs::read_to_string(temp.path().join("component.html")).unwrap();
    assert!(page.contains("h1-b-component-test"));
    assert!(page.contains("project.css"));
    assert!(page.contains("project.js"));
}

#[tokio::test]
async fn single_component_from_relative_path() {
    let (temp, builder) = setup();
    let target = Path::new("./tests/fixtures/guide/_component-deprecated.scss");

    let report = builder.build(Some(target)).await.unwrap();

    assert_eq!(report.written, vec![temp.path().join("component-deprecated.html")]);
    let page = fs::read_to_string(temp.path().join("component-deprecated.html")).unwrap();
    assert!(page.contains("h1-b-component-deprecated"));
}

#[tokio::test]
async fn unresolvable_targets_are_no_ops() {
    let (temp, builder) = setup();
    let guide = fixtures().join("guide");

    let targets = [
        PathBuf::from("./tests/fixtures/guide_component.scss"),
        guide.join("_some.scss"),
        PathBuf::from("./tests/fixtures/guide/"),
        guide.join("category"),
        guide.join("_excluded.scss"),
        guide.join("css/project.css"),
    ];

    for target in &targets {
        let report = builder.build(Some(target.as_path())).await.unwrap();

        assert!(report.is_success(), "{}", target.display());
        assert_eq!(report.files(), 0, "{}", target.display());
    }

    assert!(written_files(temp.path()).is_empty());
}

#[tokio::test]
async fn unchanged_page_is_not_rewritten() {
    let (temp, builder) = setup();
    let target = fixtures().join("guide/category/_component.scss");
    let expected = temp.path().join("category-component.html");

    let first = builder.build(Some(target.as_path())).await.unwrap();
    assert_eq!(first.written, vec![expected.clone()]);

    let second = builder.build(Some(target.as_path())).await.unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.unchanged, vec![expected.clone()]);

    fs::remove_file(&expected).unwrap();
    let third = builder.build(Some(target.as_path())).await.unwrap();
    assert_eq!(third.written, vec![expected.clone()]);
}

#[tokio::test]
async fn full_build_writes_every_page() {
    let (temp, builder) = setup();

    let report = builder.build(None).await.unwrap();

    assert!(report.is_success());
    assert_eq!(
        written_files(temp.path()),
        vec![
            "category-component-no-stat.html",
            "category-component.html",
            "category-doc-guide.html",
            "component-deprecated.html",
            "component.html",
            "doc-guide.html",
            "index.html",
        ]
    );
    assert_eq!(report.written.len(), 7);
}

#[tokio::test]
async fn full_rebuild_is_idempotent() {
    let (temp, builder) = setup();

    builder.build(None).await.unwrap();
    let before = fs::read_to_string(temp.path().join("index.html")).unwrap();

    let report = builder.build(None).await.unwrap();

    assert!(report.written.is_empty());
    assert_eq!(report.unchanged.len(), 7);
    assert_eq!(fs::read_to_string(temp.path().join("index.html")).unwrap(), before);
}

#[tokio::test]
async fn single_build_matches_full_build_output() {
    let (temp, builder) = setup();
    builder.build(None).await.unwrap();

    let report = builder
        .build(Some(fixtures().join("guide/_component.scss").as_path()))
        .await
        .unwrap();

    assert!(report.written.is_empty());
    assert_eq!(report.unchanged, vec![temp.path().join("component.html")]);
}

#[tokio::test]
async fn component_page_shows_data_uri_statistics() {
    let (temp, builder) = setup();

    builder.build(None).await.unwrap();

    let page = fs::read_to_string(temp.path().join("component.html")).unwrap();
    let sizes: Vec<usize> = page
        .split("data-bytes=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(|n| n.parse().unwrap())
        .collect();

    assert_eq!(sizes.len(), 3);
    assert!(sizes.windows(2).all(|w| w[0] >= w[1]), "largest first: {:?}", sizes);

    let no_stat = fs::read_to_string(temp.path().join("category-component-no-stat.html")).unwrap();
    assert!(!no_stat.contains("class=\"stats\""));
}

#[tokio::test]
async fn index_lists_pages_but_not_excluded_files() {
    let (temp, builder) = setup();

    builder.build(None).await.unwrap();

    let index = fs::read_to_string(temp.path().join("index.html")).unwrap();
    assert!(index.contains("category-component.html"));
    assert!(index.contains("Getting started"));
    assert!(!index.contains("excluded"));
    assert!(index.contains("project.css"));
}
