//! Typed views of `npm audit --json` output for both report schemas.
//!
//! Every field npm may leave out is optional or defaulted so that a sparse
//! report decodes cleanly instead of failing half-way through conversion.

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

/// Advisory identifier; npm emits numbers, some registries emit strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AdvisoryId {
    Number(u64),
    Text(String),
}

impl AdvisoryId {
    /// Numeric form used for resolved-set membership.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for AdvisoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A field npm emits either as a single value or as a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn first(&self) -> Option<&T> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(values) => values.first(),
        }
    }
}

// -- Schema v1 (npm 6) --

#[derive(Debug, Default, Deserialize)]
pub struct AuditReportV1 {
    #[serde(default)]
    pub actions: Vec<ActionV1>,
    #[serde(default)]
    pub advisories: IndexMap<String, AdvisoryV1>,
}

/// One installer action proposed by npm.
#[derive(Debug, Deserialize)]
pub struct ActionV1 {
    pub action: String,
    #[serde(default)]
    pub module: String,
    pub target: Option<String>,
    #[serde(default)]
    pub resolves: Vec<ResolveV1>,
}

impl ActionV1 {
    pub fn is_install(&self) -> bool {
        self.action == "install"
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveV1 {
    pub id: AdvisoryId,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdvisoryV1 {
    pub id: Option<AdvisoryId>,
    #[serde(default)]
    pub module_name: String,
    pub severity: Option<String>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub vulnerable_versions: Option<String>,
    pub cwe: Option<OneOrMany<String>>,
    #[serde(default)]
    pub cves: Vec<String>,
    pub recommendation: Option<String>,
    pub url: Option<String>,
}

// -- Schema v2 (npm 7+) --

#[derive(Debug, Default, Deserialize)]
pub struct AuditReportV2 {
    #[serde(default)]
    pub vulnerabilities: IndexMap<String, AdvisoryV2>,
}

#[derive(Debug, Deserialize)]
pub struct AdvisoryV2 {
    pub name: Option<String>,
    pub severity: Option<String>,
    pub range: Option<String>,
    #[serde(default)]
    pub via: Vec<Via>,
    #[serde(rename = "fixAvailable", default)]
    pub fix_available: FixAvailable,
}

/// One cause for a package being flagged.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Via {
    Advisory(ViaAdvisory),
    /// Transitive reference to another flagged package; carries no detail.
    Package(String),
}

#[derive(Debug, Deserialize)]
pub struct ViaAdvisory {
    pub source: Option<AdvisoryId>,
    pub id: Option<AdvisoryId>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub severity: Option<String>,
    pub range: Option<String>,
}

impl ViaAdvisory {
    pub fn source_or_id(&self) -> Option<&AdvisoryId> {
        self.source.as_ref().or(self.id.as_ref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FixAvailable {
    Upgrade(FixTarget),
    Flag(bool),
    /// Any other shape; treated as no known fix.
    Unrecognized(serde_json::Value),
}

impl Default for FixAvailable {
    fn default() -> Self {
        Self::Flag(false)
    }
}

#[derive(Debug, Deserialize)]
pub struct FixTarget {
    pub name: Option<String>,
    pub version: Option<String>,
}

impl FixAvailable {
    /// Upgrade instruction, when npm named both the package and the version.
    pub fn solution(&self) -> Option<String> {
        match self {
            Self::Upgrade(FixTarget {
                name: Some(name),
                version: Some(version),
            }) => Some(format!("Upgrade {name} to version >={version}")),
            _ => None,
        }
    }
}
