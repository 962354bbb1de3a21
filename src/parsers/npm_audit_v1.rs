//! npm audit report v1 parser (npm 6 and `--json` without `auditReportVersion`).
//!
//! Runs two passes that share one advisory-id naming scheme:
//! installer actions first, which give authoritative upgrade advice for the
//! advisories they resolve, then the advisory map itself, which falls back to
//! the advisory's own recommendation text for everything left unresolved.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::errors::ConversionError;
use crate::models::audit::{ActionV1, AdvisoryId, AdvisoryV1, AuditReportV1};
use crate::models::report::Remediation;
use crate::models::vulnerability::{Confidence, Vulnerability};
use crate::parsers::{ParseResult, Parser, ReportVersion};
use crate::services::builders;

/// Default manifest the v1 report locates findings in.
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Parser for npm audit v1 JSON output.
#[derive(Debug)]
pub struct NpmAuditV1Parser {
    manifest: String,
}

impl Default for NpmAuditV1Parser {
    fn default() -> Self {
        Self::new(None)
    }
}

impl NpmAuditV1Parser {
    pub fn new(manifest: Option<&str>) -> Self {
        Self {
            manifest: manifest.unwrap_or(DEFAULT_MANIFEST).to_string(),
        }
    }
}

impl Parser for NpmAuditV1Parser {
    fn parse(&self, document: Value) -> Result<ParseResult, ConversionError> {
        let report: AuditReportV1 =
            serde_json::from_value(document).map_err(ConversionError::Decode)?;
        self.convert_report(&report)
    }

    fn report_version(&self) -> ReportVersion {
        ReportVersion::V1
    }
}

/// Canonical ids allocated lazily per numeric advisory id.
#[derive(Debug, Default)]
struct AdvisoryIds {
    ids: HashMap<u64, String>,
}

impl AdvisoryIds {
    fn resolve(&mut self, raw: u64, module_name: &str) -> String {
        self.ids
            .entry(raw)
            .or_insert_with(|| builders::vulnerability_id(raw, module_name))
            .clone()
    }
}

/// Outcome of the action pass.
#[derive(Debug, Default)]
struct ActionPass {
    remediations: Vec<Remediation>,
    /// Advisory ids covered by an install action.
    resolved: HashSet<u64>,
    /// First install summary covering each advisory.
    solutions: HashMap<u64, String>,
}

impl NpmAuditV1Parser {
    fn convert_report(&self, report: &AuditReportV1) -> Result<ParseResult, ConversionError> {
        let mut ids = AdvisoryIds::default();
        let index = index_advisories(report);

        let actions = self.action_pass(&report.actions, &index, &mut ids)?;
        tracing::debug!(
            actions = report.actions.len(),
            remediations = actions.remediations.len(),
            resolved = actions.resolved.len(),
            "v1 action pass complete"
        );

        let mut remediations = actions.remediations;
        let mut vulnerabilities = Vec::with_capacity(report.advisories.len());

        for (key, advisory) in &report.advisories {
            let raw_id = advisory_number(key, advisory);
            let id = match raw_id {
                Some(raw) => ids.resolve(raw, &advisory.module_name),
                None => builders::vulnerability_id(key, &advisory.module_name),
            };

            let resolved = raw_id.is_some_and(|raw| actions.resolved.contains(&raw));
            let solution = if resolved {
                raw_id.and_then(|raw| actions.solutions.get(&raw).cloned())
            } else {
                let fallback = advisory
                    .recommendation
                    .as_deref()
                    .and_then(|text| fallback_summary(&advisory.module_name, text));
                if let Some(summary) = &fallback {
                    remediations.push(builders::remediation(summary, &[id.as_str()])?);
                }
                fallback
            };

            vulnerabilities.push(self.convert_advisory(key, advisory, id, solution));
        }

        tracing::debug!(
            advisories = report.advisories.len(),
            remediations = remediations.len(),
            "v1 advisory pass complete"
        );

        Ok(ParseResult {
            vulnerabilities,
            remediations,
            manifest: self.manifest.clone(),
            version: self.report_version(),
        })
    }

    fn action_pass(
        &self,
        actions: &[ActionV1],
        index: &HashMap<u64, &AdvisoryV1>,
        ids: &mut AdvisoryIds,
    ) -> Result<ActionPass, ConversionError> {
        let mut pass = ActionPass::default();

        for action in actions.iter().filter(|a| a.is_install()) {
            let target = action.target.as_deref().unwrap_or_default();
            let summary = format!("Upgrade {} to v{}.", action.module, target);

            let mut fix_ids = Vec::new();
            for resolve in &action.resolves {
                let Some(raw) = resolve.id.as_number() else {
                    tracing::warn!(
                        id = %resolve.id,
                        path = resolve.path.as_deref().unwrap_or_default(),
                        "Skipping non-numeric resolved advisory id"
                    );
                    continue;
                };
                // npm lists one resolve per dependency path; each one is a fix.
                let module_name = index
                    .get(&raw)
                    .map(|a| a.module_name.as_str())
                    .unwrap_or(action.module.as_str());
                fix_ids.push(ids.resolve(raw, module_name));
                pass.resolved.insert(raw);
                pass.solutions.entry(raw).or_insert_with(|| summary.clone());
            }

            pass.remediations
                .push(builders::remediation(&summary, &fix_ids)?);
        }

        Ok(pass)
    }

    fn convert_advisory(
        &self,
        key: &str,
        advisory: &AdvisoryV1,
        id: String,
        solution: Option<String>,
    ) -> Vulnerability {
        let mut identifiers = Vec::with_capacity(2);
        identifiers.extend(builders::cve_identifier(&advisory.cves));
        identifiers.extend(builders::cwe_identifier(
            advisory.cwe.as_ref().and_then(|c| c.first()).map(String::as_str),
        ));

        let link = match &advisory.url {
            Some(url) if !url.is_empty() => builders::link(url),
            _ => {
                let source = advisory
                    .id
                    .as_ref()
                    .map(AdvisoryId::to_string)
                    .unwrap_or_else(|| key.to_string());
                builders::link(&format!("https://npmjs.com/advisories/{source}"))
            }
        };

        Vulnerability {
            id,
            name: advisory.module_name.clone(),
            message: advisory.title.clone().unwrap_or_default(),
            description: advisory.overview.clone().unwrap_or_default(),
            severity: self.map_severity(advisory.severity.as_deref()),
            confidence: Confidence::High,
            scanner: builders::scanner(self.report_version()),
            location: builders::location(
                &self.manifest,
                &advisory.module_name,
                advisory.vulnerable_versions.as_deref().unwrap_or_default(),
            ),
            identifiers,
            solution,
            links: vec![link],
        }
    }
}

/// Index advisories by numeric id so actions can look up module names.
fn index_advisories(report: &AuditReportV1) -> HashMap<u64, &AdvisoryV1> {
    report
        .advisories
        .iter()
        .filter_map(|(key, advisory)| advisory_number(key, advisory).map(|n| (n, advisory)))
        .collect()
}

/// Numeric id of an advisory: its map key, else its `id` field.
fn advisory_number(key: &str, advisory: &AdvisoryV1) -> Option<u64> {
    key.trim()
        .parse()
        .ok()
        .or_else(|| advisory.id.as_ref().and_then(AdvisoryId::as_number))
}

fn update_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:please\s+)?update\s+to\s+").expect("valid update prefix regex")
    })
}

/// Rephrase an advisory recommendation as `Upgrade <name> to <target>`.
fn fallback_summary(module_name: &str, recommendation: &str) -> Option<String> {
    let target = update_prefix().replace(recommendation, "");
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    Some(format!("Upgrade {module_name} to {target}"))
}
