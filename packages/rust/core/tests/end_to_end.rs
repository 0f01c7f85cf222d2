//! Full group builds against a temporary docs tree.

use std::path::Path;

use conceptbuild_core::{BuildGroupConfig, SilentProgress, build_group};
use conceptbuild_shared::{BuildSettings, FilterConfig, FilterKind};
use tempfile::TempDir;

const A: &str = "aaaaaaaa-0000-0000-0000-000000000001";
const B: &str = "bbbbbbbb-0000-0000-0000-000000000002";
const C: &str = "cccccccc-0000-0000-0000-000000000003";

fn write_docs(root: &Path, files: &[&str]) {
    let docs = root.join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    for file in files {
        std::fs::write(
            docs.join(file),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<developerConceptualDocument>\n  <introduction/>\n</developerConceptualDocument>\n",
        )
        .unwrap();
    }
}

fn write_content(root: &Path, items: &str) -> std::path::PathBuf {
    let path = root.join("docs").join("Guide.content");
    std::fs::write(
        &path,
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<conceptualContent version=\"1.0\">\n  <items>\n{items}\n  </items>\n</conceptualContent>"
        ),
    )
    .unwrap();
    path
}

fn settings(root: &Path) -> BuildSettings {
    BuildSettings {
        working_dir: root.join("out"),
        project_name: "Guide".into(),
        ..BuildSettings::default()
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("{needle} not found in\n{text}"))
}

#[test]
fn two_level_tree_produces_consistent_outputs() {
    let tmp = TempDir::new().unwrap();
    write_docs(tmp.path(), &["a.xml", "b.xml"]);
    let content = write_content(
        tmp.path(),
        &format!(
            r#"    <item id="{A}"><title>Root A</title><path>a.xml</path>
      <item id="{B}"><title>Child B</title><path>b.xml</path></item>
    </item>"#
        ),
    );

    let config = BuildGroupConfig::new(&content, settings(tmp.path()));
    let result = build_group(&config, &SilentProgress).unwrap();
    assert_eq!(result.group_name, "Guide");
    assert_eq!(result.topic_count, 2);
    assert_eq!(result.visit.materialized, 2);
    assert!(result.visit.failed.is_empty());

    let toc = read(result.visit.toc_file.as_deref().unwrap());
    assert!(toc.contains(&format!(
        "<topic id=\"{A}\" file=\"{A}\">\n    <topic id=\"{B}\" file=\"{B}\"/>\n  </topic>"
    )));

    let metadata = read(result.visit.metadata_file.as_deref().unwrap());
    assert_eq!(metadata.matches("<topic ").count(), 2);
    assert!(position(&metadata, A) < position(&metadata, B));

    let manifest = read(result.visit.manifest_file.as_deref().unwrap());
    assert_eq!(manifest.matches("<topic ").count(), 2);
    assert!(position(&manifest, A) < position(&manifest, B));

    let out = tmp.path().join("out");
    let topic_a = read(&out.join("DdueXml").join(format!("{A}.xml")));
    assert!(topic_a.contains(&format!("<topic id=\"{A}\" revisionNumber=\"1\">")));
    assert!(topic_a.contains("<developerConceptualDocument>"));
    assert!(out.join("DdueXmlComp").join(format!("{B}.cmp.xml")).is_file());
}

#[test]
fn hidden_items_stay_and_filtered_items_vanish() {
    let tmp = TempDir::new().unwrap();
    write_docs(tmp.path(), &["a.xml", "b.xml", "c.xml"]);
    let content = write_content(
        tmp.path(),
        &format!(
            r#"    <item id="{A}"><title>Public</title><path>a.xml</path></item>
    <item id="{B}" visible="false"><title>Hidden</title><path>b.xml</path></item>
    <item id="{C}"><title>Secret</title><path include="internal">c.xml</path></item>"#
        ),
    );

    let mut settings = settings(tmp.path());
    settings.filters = vec![FilterConfig {
        kind: FilterKind::Category,
        values: vec!["internal".into()],
        enabled: true,
    }];
    let config = BuildGroupConfig::new(&content, settings);
    let result = build_group(&config, &SilentProgress).unwrap();
    assert_eq!(result.topic_count, 2);

    let outputs = [
        read(result.visit.toc_file.as_deref().unwrap()),
        read(result.visit.metadata_file.as_deref().unwrap()),
        read(result.visit.manifest_file.as_deref().unwrap()),
        read(&result.build_manifest_file),
    ];
    for output in &outputs {
        assert!(output.contains(B), "hidden item missing from\n{output}");
        assert!(!output.contains(C), "filtered item present in\n{output}");
    }
    let out = tmp.path().join("out");
    assert!(!out.join("DdueXml").join(format!("{C}.xml")).exists());
}

#[test]
fn build_manifest_lists_each_topic_twice_plus_fixed_assets() {
    let tmp = TempDir::new().unwrap();
    write_docs(tmp.path(), &["a.xml"]);
    let content = write_content(
        tmp.path(),
        &format!(r#"    <item id="{A}"><title>Only</title><path>a.xml</path></item>"#),
    );

    let config = BuildGroupConfig::new(&content, settings(tmp.path()));
    let result = build_group(&config, &SilentProgress).unwrap();
    let manifest = read(&result.build_manifest_file);

    assert_eq!(manifest.matches("<fileAsset ").count(), 8);
    assert_eq!(manifest.matches(&format!("fileAssetGuid=\"{A}\"")).count(), 2);
    assert!(manifest.contains(&format!("fileName=\"{A}.xml\"")));
    assert!(manifest.contains(&format!("fileName=\"{A}.cmp.xml\"")));
    assert!(manifest.contains("fileRelativeDirectory=\"Content\\Guide\\Content\""));
    assert!(manifest.contains("fileRelativeDirectory=\"Content\\Guide\\XmlComp\""));
    assert_eq!(
        manifest
            .matches("fileRelativeDirectory=\"Content\\Guide\\ExtractedFiles\"")
            .count(),
        6
    );
}

#[test]
fn repeated_builds_rewrite_topic_files_identically() {
    let tmp = TempDir::new().unwrap();
    write_docs(tmp.path(), &["a.xml"]);
    let content = write_content(
        tmp.path(),
        &format!(r#"    <item id="{A}"><title>Only</title><path>a.xml</path></item>"#),
    );
    let config = BuildGroupConfig::new(&content, settings(tmp.path()));
    let topic = tmp.path().join("out").join("DdueXml").join(format!("{A}.xml"));

    build_group(&config, &SilentProgress).unwrap();
    let first = std::fs::read(&topic).unwrap();
    build_group(&config, &SilentProgress).unwrap();
    assert_eq!(std::fs::read(&topic).unwrap(), first);
}
