//! Smoke tests for the `idmask` binary.

#[path = "../../idmask-core/src/fixtures.rs"]
mod fixtures;

use std::fs;

use assert_cmd::Command;
use fixtures::Run;
use predicates::prelude::*;

fn idmask() -> Command {
    Command::cargo_bin("idmask").unwrap()
}

#[test]
fn help_lists_subcommands() {
    idmask()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("locate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn convert_writes_redacted_document_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    let out = dir.path().join("out");
    fs::create_dir(&input).unwrap();
    fs::write(
        input.join("report.pdf"),
        fixtures::pdf_with_runs(&[Run::new("##674508##", 100.0, 700.0)]),
    )
    .unwrap();
    fs::write(input.join("unknown.pdf"), fixtures::pdf_with_runs(&[Run::new("##999999##", 100.0, 700.0)])).unwrap();
    fs::write(dir.path().join("records.csv"), "id,name\n674508,Tanaka\n").unwrap();
    fs::write(dir.path().join("font.ttf"), fixtures::minimal_ttf()).unwrap();

    idmask()
        .arg("--config")
        .arg(dir.path().join("missing-config.json"))
        .args(["convert", "--json", "--summary"])
        .arg(&input)
        .arg("--records")
        .arg(dir.path().join("records.csv"))
        .arg("--output-dir")
        .arg(&out)
        .arg("--font")
        .arg(dir.path().join("font.ttf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing-config.json"));

    idmask()
        .args(["convert", "--json", "--summary"])
        .arg(&input)
        .arg("--records")
        .arg(dir.path().join("records.csv"))
        .arg("--output-dir")
        .arg(&out)
        .arg("--font")
        .arg(dir.path().join("font.ttf"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mask-by-detect\""))
        .stdout(predicate::str::contains("\"outPath\""))
        .stdout(predicate::str::contains("identifier not found in records"));

    assert!(out.join("Tanaka.pdf").is_file());
    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("file,status,mode,out_path,reason,error"));
    assert!(summary.contains("report.pdf,ok,mask-by-detect"));
    assert!(summary.contains("unknown.pdf,skipped"));
}

#[test]
fn convert_without_font_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("records.csv"), "id,name\n1,A\n").unwrap();

    idmask()
        .arg("convert")
        .arg(dir.path())
        .arg("--records")
        .arg(dir.path().join("records.csv"))
        .arg("--font")
        .arg(dir.path().join("missing.ttf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("font not found"));
}

#[test]
fn convert_rejects_bad_record_header() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("records.csv"), "code,label\n1,A\n").unwrap();

    idmask()
        .arg("convert")
        .arg(dir.path())
        .arg("--records")
        .arg(dir.path().join("records.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("`id` and `name`"));
}

#[test]
fn locate_reports_detection() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("doc.pdf");
    fs::write(&pdf, fixtures::pdf_with_runs(&[Run::new("##674508##", 100.0, 700.0)])).unwrap();

    idmask()
        .arg("locate")
        .arg(&pdf)
        .arg("--fragments")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"strategy\": \"delimited\""))
        .stdout(predicate::str::contains("\"id_text\": \"674508\""))
        .stdout(predicate::str::contains("\"fragments\""));
}

#[test]
fn config_init_set_get_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");

    idmask()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.is_file());

    idmask()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "detection.digit_length", "8"])
        .assert()
        .success();

    idmask()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "detection.digit_length"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8"));

    idmask()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "detection.no_such_key", "1"])
        .assert()
        .failure();
}
