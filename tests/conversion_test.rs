//! End-to-end conversion of npm audit fixtures through the public API.

use npm_audit_depscan::models::report::{Report, SCHEMA_VERSION};
use npm_audit_depscan::{convert, convert_with, ConversionError, ConversionOptions};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const V1_REPORT: &str = include_str!("fixtures/v1_report.json");
const V1_REPORT_EMPTY: &str = include_str!("fixtures/v1_report_0vuls.json");
const V2_REPORT: &str = include_str!("fixtures/v2_report.json");
const V2_REPORT_EMPTY: &str = include_str!("fixtures/v2_report_0vuls.json");

fn report(input: &str) -> Report {
    serde_json::from_str(&convert(input).expect("conversion")).expect("report json")
}

#[test]
fn v1_fixture_converts() {
    let report = report(V1_REPORT);

    let ids: Vec<&str> = report.vulnerabilities.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "npm::advisory:1179::minimist",
            "npm::advisory:1523::lodash",
            "npm::advisory:1673::lodash",
        ]
    );

    assert_eq!(report.remediations.len(), 2);
    assert_eq!(report.remediations[0].summary, "Upgrade lodash to v4.17.21.");
    assert_eq!(
        report.remediations[0].fix_ids(),
        vec!["npm::advisory:1523::lodash", "npm::advisory:1673::lodash"]
    );
    assert_eq!(
        report.remediations[1].summary,
        "Upgrade minimist to version 0.2.1 or later."
    );

    let deps = &report.dependency_files[0];
    assert_eq!(deps.path, "package.json");
    assert_eq!(deps.dependencies.len(), 3);
    assert_eq!(deps.dependencies[0].package.name, "minimist");
    assert_eq!(deps.dependencies[2].version, "<4.17.21");
}

#[test]
fn v2_fixture_converts_and_consolidates() {
    let report = report(V2_REPORT);

    assert_eq!(report.vulnerabilities.len(), 3);
    assert_eq!(report.remediations.len(), 1);
    assert_eq!(
        report.remediations[0].summary,
        "Upgrade mkdirp to version >=0.5.6"
    );
    assert_eq!(
        report.remediations[0].fix_ids(),
        vec!["npm::advisory:1179::minimist", "npm::advisory:1066::minimist"]
    );

    let deps = &report.dependency_files[0];
    assert_eq!(deps.path, "package-lock.json");
    let names: Vec<&str> = deps
        .dependencies
        .iter()
        .map(|d| d.package.name.as_str())
        .collect();
    assert_eq!(names, vec!["minimist", "minimist", "node-fetch"]);
}

#[test]
fn left_pad_scenario() {
    let input = r#"{"auditReportVersion":1,"actions":[],"advisories":{"1":{"module_name":"left-pad","severity":"High","title":"Prototype Pollution","overview":"...","cves":[],"cwe":"CWE-1321","vulnerable_versions":"<1.3.0","recommendation":"update to >=1.3.0","id":1}}}"#;
    let output: Value = serde_json::from_str(&convert(input).unwrap()).unwrap();

    let vulns = output["vulnerabilities"].as_array().unwrap();
    assert_eq!(vulns.len(), 1);
    assert_eq!(vulns[0]["id"], "npm::advisory:1::left-pad");
    assert_eq!(vulns[0]["severity"], "High");
    assert_eq!(vulns[0]["confidence"], "High");
    assert_eq!(
        vulns[0]["identifiers"],
        json!([{
            "type": "cwe",
            "name": "CWE-1321",
            "value": "1321",
            "url": "https://cwe.mitre.org/data/definitions/1321.html"
        }])
    );

    let remediations = output["remediations"].as_array().unwrap();
    assert_eq!(remediations.len(), 1);
    assert_eq!(remediations[0]["summary"], "Upgrade left-pad to >=1.3.0");
    assert_eq!(
        remediations[0]["fixes"],
        json!([{"id": "npm::advisory:1::left-pad", "cve": "npm::advisory:1::left-pad"}])
    );
}

#[test]
fn sparse_fix_available_still_converts() {
    let input = r#"{"auditReportVersion":2,"vulnerabilities":{"a":{"name":"a","severity":"high","range":"<2.0.0","via":[{"source":9,"title":"Bad"}],"fixAvailable":{"name":"a","isSemVerMajor":false}}}}"#;
    let report = report(input);

    assert_eq!(report.vulnerabilities.len(), 1);
    assert_eq!(report.vulnerabilities[0].id, "npm::advisory:9::a");
    assert!(report.vulnerabilities[0].solution.is_none());
    assert!(report.remediations.is_empty());
}

#[test]
fn one_fix_per_resolved_path() {
    let input = r#"{"actions":[{"action":"install","module":"a","target":"2.0.0","resolves":[{"id":7,"path":"a"},{"id":7,"path":"x>a"}]}],"advisories":{"7":{"id":7,"module_name":"a","severity":"low"}}}"#;
    let report = report(input);

    assert_eq!(report.vulnerabilities.len(), 1);
    assert_eq!(report.remediations.len(), 1);
    assert_eq!(
        report.remediations[0].fix_ids(),
        vec!["npm::advisory:7::a", "npm::advisory:7::a"]
    );
}

#[test]
fn empty_reports_have_one_empty_dependency_file() {
    for input in [V1_REPORT_EMPTY, V2_REPORT_EMPTY] {
        let report = report(input);
        assert!(report.vulnerabilities.is_empty());
        assert!(report.remediations.is_empty());
        assert_eq!(report.dependency_files.len(), 1);
        assert!(report.dependency_files[0].dependencies.is_empty());
        assert_eq!(report.dependency_files[0].package_manager, "npm");
    }
}

#[test]
fn conversion_is_idempotent() {
    for input in [V1_REPORT, V2_REPORT] {
        assert_eq!(convert(input).unwrap(), convert(input).unwrap());
    }
}

#[test]
fn run_script_prefix_is_ignored() {
    let prefixed = format!(
        "\n> project@v1.2.3 dependency-security\n> npm audit --audit-level=moderate\n\n{}",
        V2_REPORT
    );
    assert_eq!(convert(&prefixed).unwrap(), convert(V2_REPORT).unwrap());

    let minimal = "> some log line\n{\"auditReportVersion\":2,\"vulnerabilities\":{}}";
    let bare = "{\"auditReportVersion\":2,\"vulnerabilities\":{}}";
    assert_eq!(convert(minimal).unwrap(), convert(bare).unwrap());
}

#[test]
fn schema_fields_track_schema_version() {
    let output: Value = serde_json::from_str(&convert(V2_REPORT).unwrap()).unwrap();
    assert_eq!(output["version"], SCHEMA_VERSION);
    assert!(output["schema"]
        .as_str()
        .unwrap()
        .contains(&format!("/v{SCHEMA_VERSION}/")));
    assert_eq!(output["scan"]["type"], "dependency_scanning");
    assert_eq!(output["scan"]["status"], "success");
}

#[test]
fn v2_identifier_carries_advisory_source() {
    let output: Value = serde_json::from_str(&convert(V2_REPORT).unwrap()).unwrap();
    let ident = &output["vulnerabilities"][2]["identifiers"][0];
    assert_eq!(ident["type"], "cve");
    assert_eq!(ident["value"], "1556");
}

#[test]
fn malformed_input_is_reported() {
    let err = convert("npm ERR! audit endpoint returned an error").unwrap_err();
    assert!(matches!(err, ConversionError::MalformedInput(_)));
    assert_eq!(
        err.to_string(),
        "Data provided is not JSON parsable. Check input format."
    );
}

#[test]
fn mapping_failure_is_internal() {
    let err = convert(r#"{"auditReportVersion":2,"vulnerabilities":"none"}"#).unwrap_err();
    assert!(matches!(err, ConversionError::Internal(_)));
}

#[test]
fn manifest_override_applies_everywhere() {
    let options = ConversionOptions {
        manifest_path: Some("frontend/package-lock.json".to_string()),
    };
    let report: Report =
        serde_json::from_str(&convert_with(V2_REPORT, &options).unwrap()).unwrap();
    assert_eq!(report.dependency_files[0].path, "frontend/package-lock.json");
    assert!(report
        .vulnerabilities
        .iter()
        .all(|v| v.location.file == "frontend/package-lock.json"));
}
