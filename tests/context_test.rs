//! Loading contexts from JSON data files.

use std::fs;

use tagfill::{Context, Error};
use tempfile::TempDir;

#[test]
fn test_nested_csv_sources_resolve_against_json_dir() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("tables");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("top.csv"), "a,b\n").unwrap();
    fs::write(sub.join("inner.csv"), "x\ny\nz\n").unwrap();

    let json = dir.path().join("report.json");
    fs::write(
        &json,
        r#"{
            "TextTags": {"@title@": ["Quarterly"]},
            "TableTags": {"@top@": {"ContentFromFile": "tables/top.csv", "HasHeader": true}},
            "Templates": [{
                "StartTag": "@s@", "EndTag": "@e@",
                "Contexts": [{"TableTags": {"@inner@": {"ContentFromFile": "tables/inner.csv"}}}]
            }]
        }"#,
    )
    .unwrap();

    let context = Context::from_json_file(&json).unwrap();
    assert_eq!(
        context.text_tags.get("@title@").unwrap(),
        &vec!["Quarterly".to_string()]
    );

    let top = context.table_tags.get("@top@").unwrap();
    assert!(top.source().unwrap().is_absolute());
    assert_eq!(top.content().unwrap(), &[vec!["a", "b"]]);

    let inner = context.templates[0].contexts[0]
        .table_tags
        .get("@inner@")
        .unwrap();
    assert_eq!(inner.content().unwrap().len(), 3);
}

#[test]
fn test_missing_csv_fails_on_first_access_only() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("report.json");
    fs::write(
        &json,
        r#"{"TableTags": {"@t@": {"ContentFromFile": "absent.csv"}}}"#,
    )
    .unwrap();

    let context = Context::from_json_file(&json).unwrap();
    let table = context.table_tags.get("@t@").unwrap();
    assert!(matches!(table.content(), Err(Error::TableSource(_))));
}

#[test]
fn test_malformed_json() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("report.json");
    fs::write(&json, r#"{"TextTags": ["not", "a", "map"]}"#).unwrap();
    assert!(matches!(Context::from_json_file(&json), Err(Error::Json(_))));
}

#[test]
fn test_missing_json_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        Context::from_json_file(dir.path().join("none.json")),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_misspelled_section_is_rejected() {
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("report.json");
    fs::write(&json, r#"{"TextTag": {"@name@": ["Alice"]}}"#).unwrap();
    assert!(matches!(Context::from_json_file(&json), Err(Error::Json(_))));
}
