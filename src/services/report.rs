//! Report assembly: wraps parser output into the final document.

use crate::models::report::{
    schema_url, DependencyFile, Report, Scan, ScanStatus, ScanTool, Vendor, SCHEMA_VERSION,
};
use crate::parsers::{ParseResult, PACKAGE_MANAGER};
use crate::services::remediation;

const ANALYZER_ID: &str = "gitlab-depscan";
const ANALYZER_NAME: &str = "gitlab-depscan";
const SCANNER_NAME: &str = "GitLab Depscan";
const TOOL_URL: &str = "https://gitlab.com/gitlab-org/security-products/gitlab-depscan";
const TOOL_VERSION: &str = "2.4.0";
const VENDOR: &str = "GitLab";
const SCAN_TYPE: &str = "dependency_scanning";

// Fixed so repeated conversions of the same input are byte-identical.
const SCAN_START_TIME: &str = "2023-09-14T21:23:29";
const SCAN_END_TIME: &str = "2023-09-14T21:23:31";

/// Build the final report from one parser run.
pub fn assemble(result: ParseResult) -> Report {
    let ParseResult {
        vulnerabilities,
        remediations,
        manifest,
        version,
    } = result;

    // npm audit reviews a single lockfile per run.
    let dependency_file = DependencyFile {
        path: manifest,
        package_manager: PACKAGE_MANAGER.to_string(),
        dependencies: vulnerabilities
            .iter()
            .map(|v| v.location.dependency.clone())
            .collect(),
    };

    let remediations = remediation::consolidate(remediations);

    tracing::info!(
        report_version = %version,
        vulnerabilities = vulnerabilities.len(),
        remediations = remediations.len(),
        "Assembled dependency scanning report"
    );

    Report {
        version: SCHEMA_VERSION.to_string(),
        schema: schema_url(),
        vulnerabilities,
        remediations,
        dependency_files: vec![dependency_file],
        scan: scan(),
    }
}

fn tool(name: &str) -> ScanTool {
    ScanTool {
        id: ANALYZER_ID.to_string(),
        name: name.to_string(),
        url: TOOL_URL.to_string(),
        vendor: Vendor {
            name: VENDOR.to_string(),
        },
        version: TOOL_VERSION.to_string(),
    }
}

fn scan() -> Scan {
    Scan {
        analyzer: tool(ANALYZER_NAME),
        scanner: tool(SCANNER_NAME),
        kind: SCAN_TYPE.to_string(),
        start_time: SCAN_START_TIME.to_string(),
        end_time: SCAN_END_TIME.to_string(),
        status: ScanStatus::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ReportVersion;
    use crate::services::builders;

    fn empty(version: ReportVersion, manifest: &str) -> ParseResult {
        ParseResult {
            vulnerabilities: vec![],
            remediations: vec![],
            manifest: manifest.to_string(),
            version,
        }
    }

    #[test]
    fn empty_result_has_one_dependency_file() {
        let report = assemble(empty(ReportVersion::V2, "package-lock.json"));
        assert!(report.vulnerabilities.is_empty());
        assert!(report.remediations.is_empty());
        assert_eq!(report.dependency_files.len(), 1);
        assert_eq!(report.dependency_files[0].path, "package-lock.json");
        assert_eq!(report.dependency_files[0].package_manager, "npm");
        assert!(report.dependency_files[0].dependencies.is_empty());
    }

    #[test]
    fn schema_metadata_injected() {
        let report = assemble(empty(ReportVersion::V1, "package.json"));
        assert_eq!(report.version, SCHEMA_VERSION);
        assert_eq!(report.schema, schema_url());
        assert_eq!(report.scan.kind, "dependency_scanning");
        assert_eq!(report.scan.status, ScanStatus::Success);
        assert_eq!(report.scan.scanner.vendor.name, "GitLab");
    }

    #[test]
    fn remediations_consolidated() {
        let mut result = empty(ReportVersion::V2, "package-lock.json");
        result.remediations = vec![
            builders::remediation("Upgrade a to version >=2", &["A"]).unwrap(),
            builders::remediation("Upgrade a to version >=2", &["B"]).unwrap(),
        ];
        let report = assemble(result);
        assert_eq!(report.remediations.len(), 1);
        assert_eq!(report.remediations[0].fix_ids(), vec!["A", "B"]);
    }
}
