//! npm audit report v2 parser (npm 7+, `auditReportVersion: 2`).

use serde_json::Value;

use crate::errors::ConversionError;
use crate::models::audit::{AdvisoryV2, AuditReportV2, FixAvailable, Via, ViaAdvisory};
use crate::models::report::Remediation;
use crate::models::vulnerability::{Confidence, Vulnerability};
use crate::parsers::{ParseResult, Parser, ReportVersion};
use crate::services::builders;

/// Default lockfile the v2 report locates findings in.
pub const DEFAULT_MANIFEST: &str = "package-lock.json";

/// Id segment used when a via entry names no advisory.
const UNKNOWN_SOURCE: &str = "unknown";

/// Parser for npm audit v2 JSON output.
#[derive(Debug)]
pub struct NpmAuditV2Parser {
    manifest: String,
}

impl Default for NpmAuditV2Parser {
    fn default() -> Self {
        Self::new(None)
    }
}

impl NpmAuditV2Parser {
    pub fn new(manifest: Option<&str>) -> Self {
        Self {
            manifest: manifest.unwrap_or(DEFAULT_MANIFEST).to_string(),
        }
    }
}

impl Parser for NpmAuditV2Parser {
    fn parse(&self, document: Value) -> Result<ParseResult, ConversionError> {
        let report: AuditReportV2 =
            serde_json::from_value(document).map_err(ConversionError::Decode)?;

        let mut vulnerabilities = Vec::new();
        let mut remediations = Vec::new();

        for (key, advisory) in &report.vulnerabilities {
            let name = advisory.name.as_deref().unwrap_or(key);
            if let FixAvailable::Unrecognized(raw) = &advisory.fix_available {
                tracing::warn!(package = name, fix = %raw, "Ignoring unrecognized fixAvailable value");
            }
            let solution = advisory.fix_available.solution();

            // Bare strings point at other flagged packages and carry no detail.
            for via in advisory.via.iter().filter_map(|v| match v {
                Via::Advisory(detail) => Some(detail),
                Via::Package(_) => None,
            }) {
                let (vulnerability, remediation) =
                    self.convert_via(name, advisory, via, solution.as_deref())?;
                vulnerabilities.push(vulnerability);
                remediations.extend(remediation);
            }
        }

        tracing::debug!(
            packages = report.vulnerabilities.len(),
            vulnerabilities = vulnerabilities.len(),
            remediations = remediations.len(),
            "v2 conversion complete"
        );

        Ok(ParseResult {
            vulnerabilities,
            remediations,
            manifest: self.manifest.clone(),
            version: self.report_version(),
        })
    }

    fn report_version(&self) -> ReportVersion {
        ReportVersion::V2
    }
}

impl NpmAuditV2Parser {
    fn convert_via(
        &self,
        name: &str,
        advisory: &AdvisoryV2,
        via: &ViaAdvisory,
        solution: Option<&str>,
    ) -> Result<(Vulnerability, Option<Remediation>), ConversionError> {
        let source = via.source_or_id();
        let id = match source {
            Some(source) => builders::vulnerability_id(source, name),
            None => builders::vulnerability_id(UNKNOWN_SOURCE, name),
        };

        let title = via.title.clone().unwrap_or_default();
        let range = via
            .range
            .as_deref()
            .or(advisory.range.as_deref())
            .unwrap_or_default();
        let severity = self
            .map_severity(via.severity.as_deref())
            .or_else(|| self.map_severity(advisory.severity.as_deref()));

        let remediation = solution
            .map(|summary| builders::remediation(summary, &[id.as_str()]))
            .transpose()?;

        let vulnerability = Vulnerability {
            id,
            name: name.to_string(),
            message: title.clone(),
            description: title.clone(),
            severity,
            confidence: Confidence::High,
            scanner: builders::scanner(self.report_version()),
            location: builders::location(&self.manifest, name, range),
            identifiers: builders::source_identifier(&title, source, via.url.as_deref())
                .into_iter()
                .collect(),
            solution: solution.map(str::to_string),
            links: via.url.as_deref().map(builders::link).into_iter().collect(),
        };

        Ok((vulnerability, remediation))
    }
}
