//! npm audit report parsers for normalizing advisories from both schemas.
//!
//! Each parser implements the `Parser` trait, producing canonical
//! vulnerabilities and remediation proposals from one `npm audit --json`
//! report schema.

pub mod npm_audit_v1;
pub mod npm_audit_v2;

use std::fmt;

use serde_json::Value;

use crate::errors::ConversionError;
use crate::models::report::Remediation;
use crate::models::vulnerability::{Severity, Vulnerability};

/// Ecosystem prefix of every canonical vulnerability id.
pub const ECOSYSTEM: &str = "npm";

/// Package manager reported in the dependency file.
pub const PACKAGE_MANAGER: &str = "npm";

/// Schema of the `npm audit --json` document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVersion {
    V1,
    V2,
}

impl ReportVersion {
    /// Detect the schema from the `auditReportVersion` field.
    ///
    /// Missing, non-numeric or zero values mean v1: older npm releases do
    /// not emit the field at all.
    pub fn detect(document: &Value) -> Self {
        let version = document.get("auditReportVersion").and_then(|v| match v {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => leading_integer(s),
            _ => None,
        });

        match version {
            Some(2) => Self::V2,
            _ => Self::V1,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }
}

impl fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// Integer prefix of a string, ignoring leading whitespace and an optional sign.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Result of converting one audit report.
#[derive(Debug)]
pub struct ParseResult {
    pub vulnerabilities: Vec<Vulnerability>,
    /// Unconsolidated remediation proposals, in emission order.
    pub remediations: Vec<Remediation>,
    /// Manifest or lockfile the findings are located in.
    pub manifest: String,
    pub version: ReportVersion,
}

/// Trait for pluggable audit report parsers.
pub trait Parser {
    /// Convert a parsed audit document into canonical records.
    fn parse(&self, document: Value) -> Result<ParseResult, ConversionError>;

    /// The report schema this parser handles.
    fn report_version(&self) -> ReportVersion;

    /// Map npm severity text to the canonical severity.
    fn map_severity(&self, severity: Option<&str>) -> Option<Severity> {
        severity.and_then(Severity::normalize)
    }
}

/// Build the parser for a detected report version.
pub fn parser_for(version: ReportVersion, manifest: Option<&str>) -> Box<dyn Parser> {
    match version {
        ReportVersion::V1 => Box::new(npm_audit_v1::NpmAuditV1Parser::new(manifest)),
        ReportVersion::V2 => Box::new(npm_audit_v2::NpmAuditV2Parser::new(manifest)),
    }
}
