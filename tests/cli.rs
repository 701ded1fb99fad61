use std::fs;

use assert_cmd::Command;
use csv_batchload::schema::{FieldSpec, FieldType, Schema};
use predicates::str::contains;
use tempfile::tempdir;

fn write_contact_meta(dir: &std::path::Path) -> std::path::PathBuf {
    let schema = Schema::new(vec![
        FieldSpec::new("name", FieldType::String)
            .required()
            .labeled("Name"),
        FieldSpec::new("email", FieldType::String).labeled("Email"),
    ]);
    let meta_path = dir.join("contacts.meta");
    schema.save(&meta_path).expect("save schema");
    meta_path
}

#[test]
fn import_commits_a_valid_document() {
    let dir = tempdir().expect("temp dir");
    let meta_path = write_contact_meta(dir.path());
    let csv_path = dir.path().join("contacts.csv");
    fs::write(&csv_path, "name,email\nAlice,a@x.com\nBob,b@x.com\n").expect("write csv");
    let output_path = dir.path().join("records.csv");

    Command::cargo_bin("csv-batchload")
        .expect("binary exists")
        .args([
            "import",
            "-i",
            csv_path.to_str().unwrap(),
            "-m",
            meta_path.to_str().unwrap(),
            "-o",
            output_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(contains("Imported 2 row(s)"));

    let contents = fs::read_to_string(&output_path).expect("read output");
    assert!(contents.contains("Alice"));
    assert!(contents.contains("Bob"));
}

#[test]
fn import_aborts_and_reports_every_issue() {
    let dir = tempdir().expect("temp dir");
    let meta_path = write_contact_meta(dir.path());
    let csv_path = dir.path().join("contacts.csv");
    fs::write(&csv_path, "name,email\n,a@x.com\nBob,b@x.com\n,c@x.com\n").expect("write csv");
    let output_path = dir.path().join("records.csv");

    Command::cargo_bin("csv-batchload")
        .expect("binary exists")
        .args([
            "import",
            "-i",
            csv_path.to_str().unwrap(),
            "-m",
            meta_path.to_str().unwrap(),
            "-o",
            output_path.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("row 1: column Name - This field is required"))
        .stderr(contains("row 3: column Name - This field is required"))
        .stderr(contains("import aborted with 2 issue(s)"));

    assert!(!output_path.exists());
}

#[test]
fn import_supports_positional_mapping_without_headers() {
    let dir = tempdir().expect("temp dir");
    let meta_path = write_contact_meta(dir.path());
    let csv_path = dir.path().join("contacts.csv");
    fs::write(&csv_path, "a@x.com,Alice\n").expect("write csv");
    let output_path = dir.path().join("records.csv");

    Command::cargo_bin("csv-batchload")
        .expect("binary exists")
        .args([
            "import",
            "-i",
            csv_path.to_str().unwrap(),
            "-m",
            meta_path.to_str().unwrap(),
            "-o",
            output_path.to_str().unwrap(),
            "--no-headers",
            "--positional",
            "email,name",
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output_path).expect("read output");
    assert!(contents.lines().nth(1).unwrap().starts_with("\"Alice\""));
}

#[test]
fn unknown_positional_field_is_a_configuration_error() {
    let dir = tempdir().expect("temp dir");
    let meta_path = write_contact_meta(dir.path());
    let csv_path = dir.path().join("contacts.csv");
    fs::write(&csv_path, "Alice\n").expect("write csv");

    Command::cargo_bin("csv-batchload")
        .expect("binary exists")
        .args([
            "import",
            "-i",
            csv_path.to_str().unwrap(),
            "-m",
            meta_path.to_str().unwrap(),
            "-o",
            dir.path().join("records.csv").to_str().unwrap(),
            "--no-headers",
            "--positional",
            "nickname",
        ])
        .assert()
        .failure()
        .stderr(contains("unknown field 'nickname'"));
}

#[test]
fn template_writes_starred_labels() {
    let dir = tempdir().expect("temp dir");
    let meta_path = write_contact_meta(dir.path());
    let template_path = dir.path().join("template.csv");

    Command::cargo_bin("csv-batchload")
        .expect("binary exists")
        .args([
            "template",
            "-m",
            meta_path.to_str().unwrap(),
            "-o",
            template_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&template_path).expect("read template");
    assert_eq!(contents.trim(), "\"Name*\",\"Email\"");
}

#[test]
fn schema_prints_expected_fields() {
    let dir = tempdir().expect("temp dir");
    let meta_path = write_contact_meta(dir.path());

    Command::cargo_bin("csv-batchload")
        .expect("binary exists")
        .args(["schema", "-m", meta_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Expected fields: name, email"));
}
