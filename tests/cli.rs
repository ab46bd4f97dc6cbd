mod common;

use assert_cmd::Command;
use common::{square, Fixture};

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("geoprep --help"));
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("geoprep 0.3.0\n");
}

// Split subcommand tests

#[test]
fn split_prints_reference_permutation() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.args(["split", "--count", "10", "--seed", "42"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("train (7): 8 1 5 0 7 2 9"))
        .stdout(predicates::str::contains("test (2): 4 3"))
        .stdout(predicates::str::contains("validation (1): 6"));
}

#[test]
fn split_json_output_format() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.args([
        "split", "--count", "4", "--seed", "1", "--train", "0.5", "--test", "0.5", "--output",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"train\""))
        .stdout(predicates::str::contains("\"validation\": []"));
}

#[test]
fn split_rejects_proportions_above_one() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.args(["split", "--count", "10", "--seed", "42", "--train", "0.9", "--test", "0.2"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("exceed 1"));
}

#[test]
fn split_requires_a_seed() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.args(["split", "--count", "10"]);
    cmd.assert().failure();
}

// Validate subcommand tests

#[test]
fn validate_valid_document_succeeds() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.args(["validate", "tests/fixtures/valid.coco.json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Validation passed"));
}

#[test]
fn validate_invalid_document_fails() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.args(["validate", "tests/fixtures/invalid.coco.json"]);
    cmd.assert()
        .failure()
        .stdout(predicates::str::contains("error(s)"))
        .stdout(predicates::str::contains("DuplicateImageId"))
        .stdout(predicates::str::contains("MissingImageRef"))
        .stdout(predicates::str::contains("MissingCategoryRef"))
        .stdout(predicates::str::contains("SegmentationOutOfBounds"));
}

#[test]
fn validate_json_output_format() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.args([
        "validate",
        "tests/fixtures/valid.coco.json",
        "--output",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"error_count\": 0"))
        .stdout(predicates::str::contains("\"warning_count\": 0"));
}

#[test]
fn validate_nonexistent_file_fails() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.args(["validate", "tests/fixtures/missing.coco.json"]);
    cmd.assert().failure().stderr(predicates::str::contains("Error"));
}

// Prepare subcommand tests

#[test]
fn prepare_writes_documents() {
    let fixture = Fixture::new();
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.arg("prepare").arg("--config").arg(fixture.config_path());
    cmd.assert().success().stdout(predicates::str::contains(
        "stdl_geneva_2018_2056_ortho_18: 4 tile(s), 5 fragment(s), split 2/1/1",
    ));

    for name in ["COCO_trn.json", "COCO_tst.json", "COCO_val.json", "split.csv"] {
        assert!(fixture.output_dir().join(name).is_file(), "{name}");
    }
}

#[test]
fn prepare_reads_config_from_environment() {
    let fixture = Fixture::new();
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.arg("prepare").env("GEOPREP_CONFIG", fixture.config_path());
    cmd.assert().success();
}

#[test]
fn prepare_reports_orphan_tile() {
    let fixture = Fixture::new();
    fixture.write_labels(&[("a", square(10.0, 10.0, 20.0))]);

    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.arg("prepare").arg("--config").arg(fixture.config_path());
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Tile tile_1.tif has no label"));
}

#[test]
fn prepare_missing_config_fails() {
    let mut cmd = Command::cargo_bin("geoprep").unwrap();
    cmd.args(["prepare", "--config", "tests/fixtures/missing.yaml"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Configuration error"));
}
