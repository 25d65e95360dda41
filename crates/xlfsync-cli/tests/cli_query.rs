use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod helpers;
use helpers::*;

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Untranslated {
    id: String,
    source_text: String,
    source_language: String,
    comment: Option<String>,
    max_length: Option<u32>,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct WithState {
    id: String,
    source_text: String,
    target_text: String,
    translation_state: Option<String>,
    review_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct MapRow {
    source_text: String,
    target_texts: Vec<String>,
}

fn swedish(root: &Path) -> PathBuf {
    let mut first = unit("1", "Cat", Some("Katt"), Some("translated"));
    first = first.replace(
        "</trans-unit>",
        "<note from=\"Developer\" annotates=\"general\" priority=\"2\">Pet</note></trans-unit>",
    );
    write(
        root,
        "App.sv-SE.xlf",
        &xlf(
            "sv-SE",
            &[
                first,
                unit("2", "Dog", Some("Hund"), Some("needs-review-translation")),
                unit("3", "Cat", Some("Kisse"), Some("final")),
                unit("4", "Total", Some(""), Some("new")),
                unit("5", "Bird", None, None),
                unit("6", "Fish", Some("Fisk"), Some("signed-off")),
            ],
        ),
    )
}

#[test]
fn untranslated_lists_placeholders_and_missing_targets() {
    let tmp = tempfile::tempdir().unwrap();
    let file = swedish(tmp.path());
    let assert = bin_cmd(tmp.path())
        .arg("untranslated")
        .arg(&file)
        .args(["--format", "json"])
        .assert()
        .success();
    let rows: Vec<Untranslated> = serde_json::from_str(&stdout_of(&assert)).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["4", "5"]);
    assert_eq!(rows[0].source_language, "en-US");
}

#[test]
fn untranslated_can_take_sources_from_another_language() {
    let tmp = tempfile::tempdir().unwrap();
    let file = swedish(tmp.path());
    let danish = write(
        tmp.path(),
        "App.da-DK.xlf",
        &xlf("da-DK", &[unit("5", "Bird", Some("Fugl"), Some("translated"))]),
    );
    let assert = bin_cmd(tmp.path())
        .arg("untranslated")
        .arg(&file)
        .arg("--source-file")
        .arg(&danish)
        .args(["--format", "json"])
        .assert()
        .success();
    let rows: Vec<Untranslated> = serde_json::from_str(&stdout_of(&assert)).unwrap();
    assert_eq!(rows[1].source_text, "Fugl");
    assert_eq!(rows[1].source_language, "da-DK");
}

#[test]
fn translated_filters_by_state_and_pages() {
    let tmp = tempfile::tempdir().unwrap();
    let file = swedish(tmp.path());

    let assert = bin_cmd(tmp.path())
        .arg("translated")
        .arg(&file)
        .args(["--state", "needs-review", "--format", "json"])
        .assert()
        .success();
    let rows: Vec<WithState> = serde_json::from_str(&stdout_of(&assert)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "2");
    assert_eq!(rows[0].translation_state.as_deref(), Some("needs-review-translation"));
    assert!(rows[0].review_reason.is_some());

    let assert = bin_cmd(tmp.path())
        .arg("translated")
        .arg(&file)
        .args(["--offset", "1", "--limit", "2", "--format", "json"])
        .assert()
        .success();
    let rows: Vec<WithState> = serde_json::from_str(&stdout_of(&assert)).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["2", "3"]);
}

#[test]
fn default_limit_comes_from_config() {
    let tmp = tempfile::tempdir().unwrap();
    let file = swedish(tmp.path());
    write(tmp.path(), "xlfsync.toml", "[query]\ndefault_limit = 1\n");
    let assert = bin_cmd(tmp.path())
        .arg("translated")
        .arg(&file)
        .args(["--format", "json"])
        .assert()
        .success();
    let rows: Vec<WithState> = serde_json::from_str(&stdout_of(&assert)).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn unknown_state_filter_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let file = swedish(tmp.path());
    bin_cmd(tmp.path())
        .arg("translated")
        .arg(&file)
        .args(["--state", "reviewed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid filter 'reviewed'"));
}

#[test]
fn search_matches_targets_with_regex() {
    let tmp = tempfile::tempdir().unwrap();
    let file = swedish(tmp.path());
    let assert = bin_cmd(tmp.path())
        .arg("search")
        .arg(&file)
        .args(["--keyword", "^k", "--regex", "--in-target", "--format", "json"])
        .assert()
        .success();
    let rows: Vec<WithState> = serde_json::from_str(&stdout_of(&assert)).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["1", "3"]);
}

#[test]
fn search_with_bad_regex_names_the_pattern() {
    let tmp = tempfile::tempdir().unwrap();
    let file = swedish(tmp.path());
    bin_cmd(tmp.path())
        .arg("search")
        .arg(&file)
        .args(["--keyword", "(", "--regex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pattern '('"));
}

#[test]
fn map_groups_finished_translations() {
    let tmp = tempfile::tempdir().unwrap();
    let file = swedish(tmp.path());
    let assert = bin_cmd(tmp.path())
        .arg("map")
        .arg(&file)
        .args(["--format", "json"])
        .assert()
        .success();
    let rows: Vec<MapRow> = serde_json::from_str(&stdout_of(&assert)).unwrap();
    assert_eq!(rows[0].source_text, "Cat");
    assert_eq!(rows[0].target_texts, ["Katt", "Kisse"]);
    assert_eq!(rows[1].source_text, "Fish");
}

#[test]
fn text_output_lists_state_and_texts() {
    let tmp = tempfile::tempdir().unwrap();
    let file = swedish(tmp.path());
    bin_cmd(tmp.path())
        .arg("translated")
        .arg(&file)
        .args(["--state", "translated"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 [translated] Cat => Katt"));
}

#[test]
fn malformed_file_reports_location() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write(tmp.path(), "Broken.sv-SE.xlf", "<xliff><file></xliff>");
    bin_cmd(tmp.path())
        .arg("untranslated")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a valid XML document"));
}
