//! Root report document in the GitLab dependency-scanning format.

use serde::{Deserialize, Serialize};

use crate::models::vulnerability::{Dependency, Vulnerability};

/// Version of the dependency-scanning report schema the output conforms to.
pub const SCHEMA_VERSION: &str = "15.0.6";

/// Schema URL derived from [`SCHEMA_VERSION`].
pub fn schema_url() -> String {
    format!(
        "https://gitlab.com/gitlab-org/security-products/security-report-schemas/-/raw/v{SCHEMA_VERSION}/dist/dependency-scanning-report-format.json"
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fix {
    pub id: String,
    /// Deprecated upstream but still required; mirrors `id`.
    pub cve: String,
}

/// One upgrade action and the vulnerabilities it resolves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Remediation {
    pub fixes: Vec<Fix>,
    pub summary: String,
    pub diff: String,
}

impl Remediation {
    pub fn fix_ids(&self) -> Vec<&str> {
        self.fixes.iter().map(|f| f.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyFile {
    pub path: String,
    pub package_manager: String,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vendor {
    pub name: String,
}

/// Analyzer or scanner identity inside the scan block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanTool {
    pub id: String,
    pub name: String,
    pub url: String,
    pub vendor: Vendor,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scan {
    pub analyzer: ScanTool,
    pub scanner: ScanTool,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_time: String,
    pub end_time: String,
    pub status: ScanStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub version: String,
    pub schema: String,
    pub vulnerabilities: Vec<Vulnerability>,
    pub remediations: Vec<Remediation>,
    pub dependency_files: Vec<DependencyFile>,
    pub scan: Scan,
}
