//! CLI binary smoke tests using assert_cmd.
//!
//! These exercise the compiled `esg_report` binary end to end. Chart output
//! needs system fonts, so the runs below stick to spreadsheet and document.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn cmd() -> Command {
    Command::cargo_bin("esg_report").unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("esg_cli_{}_{}", name, std::process::id()))
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--targets"))
        .stdout(predicate::str::contains("--summarizer-cmd"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("esg_report"));
}

#[test]
fn sample_run_writes_spreadsheet_and_document() {
    let dir = scratch_dir("sample");
    cmd()
        .args(["--targets", "spreadsheet,document", "--output-dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sustainability Report"))
        .stdout(predicate::str::contains("Total emissions: 3,280 tCO2"))
        .stdout(predicate::str::contains("This period, DemoCo produced 3280 tCO2 emissions"));

    assert!(dir.join("sustainability_report_democo_sample_data.xlsx").exists());
    assert!(dir.join("sustainability_report_democo_sample_data.pptx").exists());
    assert!(!dir.join("sample_data_esg_metrics_chart.png").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn json_output_lists_reports() {
    let dir = scratch_dir("json");
    cmd()
        .args(["--json", "--company", "Acme", "--period", "quarter", "--targets", "xlsx", "--output-dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"company_name\": \"Acme\""))
        .stdout(predicate::str::contains("\"total_emissions\""))
        .stdout(predicate::str::contains("This quarter, Acme produced"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_columns_fail_with_names() {
    let dir = scratch_dir("missing");
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("partial.csv");
    std::fs::write(&input, "Emissions_tCO2,Waste_kg\n1200,320\n").unwrap();

    cmd()
        .arg(&input)
        .args(["--targets", "spreadsheet", "--output-dir"])
        .arg(dir.join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Energy_kWh"));

    assert!(!dir.join("out").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn several_inputs_write_separate_reports() {
    let dir = scratch_dir("several");
    std::fs::create_dir_all(&dir).unwrap();
    let q1 = dir.join("q1.csv");
    let q2 = dir.join("q2.csv");
    std::fs::write(&q1, "Emissions_tCO2,Energy_kWh,Waste_kg\n500,6000,120\n").unwrap();
    std::fs::write(&q2, "Emissions_tCO2,Energy_kWh,Waste_kg\n450,5800,110\n").unwrap();

    cmd()
        .arg(&q1)
        .arg(&q2)
        .args(["--targets", "spreadsheet", "--output-dir"])
        .arg(dir.join("out"))
        .assert()
        .success();

    assert!(dir.join("out/sustainability_report_democo_q1.xlsx").exists());
    assert!(dir.join("out/sustainability_report_democo_q2.xlsx").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn inputs_sharing_a_stem_are_rejected() {
    let dir = scratch_dir("stem");
    std::fs::create_dir_all(&dir).unwrap();
    let csv = dir.join("q1.csv");
    let json = dir.join("q1.json");
    std::fs::write(&csv, "Emissions_tCO2,Energy_kWh,Waste_kg\n500,6000,120\n").unwrap();
    std::fs::write(&json, r#"[{"Emissions_tCO2": 1, "Energy_kWh": 2, "Waste_kg": 3}]"#).unwrap();

    cmd()
        .arg(&csv)
        .arg(&json)
        .args(["--targets", "spreadsheet", "--output-dir"])
        .arg(dir.join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("would write the same report files"));

    assert!(!dir.join("out").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unknown_target_is_rejected() {
    cmd()
        .args(["--targets", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown export target"));
}

#[test]
fn nonexistent_input_errors() {
    cmd()
        .args(["/nonexistent/esg.csv", "--targets", "spreadsheet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input"));
}
