use std::io::Write;
use std::process::{Command, Output, Stdio};

fn ogcfilter() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ogcfilter"));
    command.env_remove("FES_SCHEMA_PATH").env_remove("FES_VALIDATE_SCHEMA");
    command
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn cql_argument_to_xml() {
    let output = ogcfilter()
        .arg("DEPTH < 30")
        .output()
        .expect("failed to execute process");

    assert!(output.status.success(), "{}", stderr(&output));
    let xml = stdout(&output);
    assert!(xml.starts_with("<fes:Filter xmlns:fes=\"http://www.opengis.net/fes/2.0\">"));
    assert!(xml.contains("<fes:PropertyIsLessThan matchCase=\"true\" matchAction=\"Any\">"));
    assert!(xml.contains("<fes:ValueReference>DEPTH</fes:ValueReference>"));
    assert!(xml.contains("<fes:Literal>30</fes:Literal>"));
}

#[test]
fn xml_file_to_json() {
    let output = ogcfilter()
        .arg("--input")
        .arg("fixture/equal_to.xml")
        .arg("--format")
        .arg("json")
        .arg("--verbose")
        .output()
        .expect("failed to execute process");

    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(json.is_object());
    let text = json.to_string();
    assert!(text.contains("SomeProperty"));
    assert!(text.contains("PropertyIsEqualTo"));
}

#[test]
fn filter_from_stdin() {
    let mut child = ogcfilter()
        .arg("--input")
        .arg("-")
        .arg("--format")
        .arg("debug")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to execute process");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"name IS NULL")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Null"));
}

#[test]
fn multi_line_filter_from_stdin() {
    let mut child = ogcfilter()
        .arg("--input")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to execute process");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"DEPTH < 30\r\nAND name = 'x'\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let xml = stdout(&output);
    assert!(xml.contains("<fes:And>"), "{xml}");
    assert!(xml.contains("<fes:ValueReference>name</fes:ValueReference>"), "{xml}");
}

#[test]
fn schema_config_rejects_undeclared_elements() {
    let output = ogcfilter()
        .arg("--config")
        .arg("fixture/parser.yaml")
        .arg("--input")
        .arg("fixture/undeclared.xml")
        .output()
        .expect("failed to execute process");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("is not declared"), "{}", stderr(&output));

    let output = ogcfilter()
        .arg("--config")
        .arg("fixture/parser.yaml")
        .arg("--input")
        .arg("fixture/equal_to.xml")
        .output()
        .expect("failed to execute process");
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn config_limits_syntaxes() {
    let mut config = tempfile::NamedTempFile::with_suffix(".yaml").unwrap();
    writeln!(config, "syntaxes: [cql]").unwrap();

    let output = ogcfilter()
        .arg("--config")
        .arg(config.path())
        .arg("--input")
        .arg("fixture/equal_to.xml")
        .output()
        .expect("failed to execute process");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("could not parse filter"), "{}", stderr(&output));
}

#[test]
fn garbage_fails() {
    let output = ogcfilter()
        .arg("garbage ~")
        .output()
        .expect("failed to execute process");

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Parse: Failed to parse filter"), "{err}");
    assert!(err.contains("could not parse filter"), "{err}");
}

#[test]
fn validate_needs_a_schema() {
    let output = ogcfilter()
        .arg("--validate")
        .arg("DEPTH < 30")
        .output()
        .expect("failed to execute process");

    assert!(!output.status.success());
    assert!(stderr(&output).contains("--validate needs a schema"));
}
