use std::fs;
use std::process::Command;

fn loan_calc(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_loan-calc"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("loan-calc")
}

#[test]
fn minimal_output_uses_form_defaults() {
    let output = loan_calc(&["--output", "minimal"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "$1,342.05");
}

#[test]
fn table_output_has_schedule_and_chart() {
    let output = loan_calc(&["--amount", "10000", "--rate", "0", "--years", "1"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Monthly Payment: $833.33"));
    assert!(stdout.contains("Remaining Balance"));
    assert!(stdout.contains("Loan Amortization Schedule"));
}

#[test]
fn json_input_file_drives_the_calculation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("loan.json");
    fs::write(&path, r#"{"principal": 10000.0, "annual_rate": 0.0, "term_years": 1}"#)
        .expect("write input");

    let output = loan_calc(&["--input", path.to_str().unwrap(), "--output", "json"]);
    assert!(output.status.success());

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(payload["schedule"].as_array().map(|rows| rows.len()), Some(12));
    assert_eq!(payload["schedule"][0]["Interest Payment"], 0.);
}

#[test]
fn invalid_input_exits_with_error() {
    let output = loan_calc(&["--years", "0"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "stderr={stderr}");
    assert!(stderr.contains("term_years"), "stderr={stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn malformed_input_file_exits_with_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("loan.json");
    fs::write(&path, "{ not json").expect("write input");

    let output = loan_calc(&["--input", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Serialization error"));
}
