//! Constructors for the canonical sub-records of a vulnerability.

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;

use crate::errors::ConversionError;
use crate::models::audit::AdvisoryId;
use crate::models::report::{Fix, Remediation};
use crate::models::vulnerability::{
    Dependency, Identifier, IdentifierKind, Link, Location, Package, Scanner,
};
use crate::parsers::{ReportVersion, ECOSYSTEM};

/// Scanner id shared by every finding this tool produces.
pub const SCANNER_ID: &str = "npm_audit_advisories";

/// Placeholder diff; no patch can be derived from an audit report.
const BLANK_DIFF: &str = " ";

/// Deterministic canonical id: `npm::advisory:<source>::<module>`.
pub fn vulnerability_id(source_id: impl Display, module_name: &str) -> String {
    format!("{ECOSYSTEM}::advisory:{source_id}::{module_name}")
}

pub fn location(file: &str, package_name: &str, version_range: &str) -> Location {
    Location {
        file: file.to_string(),
        dependency: Dependency {
            package: Package {
                name: package_name.to_string(),
            },
            version: version_range.to_string(),
        },
    }
}

pub fn scanner(version: ReportVersion) -> Scanner {
    Scanner {
        id: SCANNER_ID.to_string(),
        name: format!("NPM Audit v{}", version.number()),
    }
}

pub fn link(url: &str) -> Link {
    Link {
        url: url.to_string(),
    }
}

/// Build a CWE identifier from a `CWE-<n>` string.
///
/// Returns `None` when there is nothing left after stripping the prefix.
pub fn cwe_identifier(cwe: Option<&str>) -> Option<Identifier> {
    let raw = cwe?.trim();
    let id = raw.replacen("CWE-", "", 1);
    if id.is_empty() {
        return None;
    }

    Some(Identifier {
        kind: IdentifierKind::Cwe,
        name: raw.to_string(),
        url: Some(format!("https://cwe.mitre.org/data/definitions/{id}.html")),
        value: id,
    })
}

/// Build a CVE identifier from the first listed CVE.
pub fn cve_identifier(cves: &[String]) -> Option<Identifier> {
    let cve = cves.iter().map(|c| c.trim()).find(|c| !c.is_empty())?;

    Some(Identifier {
        kind: IdentifierKind::Cve,
        name: cve.to_string(),
        value: cve.to_string(),
        url: Some(format!("https://nvd.nist.gov/vuln/detail/{cve}")),
    })
}

/// Build the v2 cross-reference identifier.
///
/// Typed `cve` for downstream compatibility, but the value is the advisory
/// source id: npm v2 reports rarely carry a real CVE number.
pub fn source_identifier(
    title: &str,
    source: Option<&AdvisoryId>,
    url: Option<&str>,
) -> Option<Identifier> {
    let value = source?.to_string();
    if value.is_empty() {
        return None;
    }

    Some(Identifier {
        kind: IdentifierKind::Cve,
        name: title.to_string(),
        value,
        url: url.map(str::to_string),
    })
}

/// Build a remediation for the given vulnerability ids.
///
/// `fixes` may come from external data, so it is checked to be an ordered
/// list of id strings before use.
pub fn remediation<T>(summary: &str, fixes: &T) -> Result<Remediation, ConversionError>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(fixes)?;
    let mismatch = || ConversionError::TypeMismatch {
        expected: "string[]".to_string(),
        found: value.to_string(),
    };

    let ids = match &value {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(mismatch)?,
        _ => return Err(mismatch()),
    };

    Ok(Remediation {
        fixes: ids
            .into_iter()
            .map(|id| Fix {
                cve: id.clone(),
                id,
            })
            .collect(),
        summary: summary.to_string(),
        diff: BLANK_DIFF.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vulnerability_id_format() {
        assert_eq!(vulnerability_id(1, "left-pad"), "npm::advisory:1::left-pad");
        assert_eq!(
            vulnerability_id("GHSA-x", "minimist"),
            "npm::advisory:GHSA-x::minimist"
        );
    }

    #[test]
    fn cwe_prefix_stripped() {
        let ident = cwe_identifier(Some("CWE-1321")).unwrap();
        assert_eq!(ident.kind, IdentifierKind::Cwe);
        assert_eq!(ident.name, "CWE-1321");
        assert_eq!(ident.value, "1321");
        assert_eq!(
            ident.url.as_deref(),
            Some("https://cwe.mitre.org/data/definitions/1321.html")
        );
    }

    #[test]
    fn missing_cwe_omitted() {
        assert!(cwe_identifier(None).is_none());
        assert!(cwe_identifier(Some("")).is_none());
        assert!(cwe_identifier(Some("CWE-")).is_none());
    }

    #[test]
    fn first_cve_only() {
        let cves = vec!["CVE-2019-10744".to_string(), "CVE-2020-8203".to_string()];
        let ident = cve_identifier(&cves).unwrap();
        assert_eq!(ident.kind, IdentifierKind::Cve);
        assert_eq!(ident.value, "CVE-2019-10744");
        assert_eq!(
            ident.url.as_deref(),
            Some("https://nvd.nist.gov/vuln/detail/CVE-2019-10744")
        );
        assert!(cve_identifier(&[]).is_none());
    }

    #[test]
    fn source_identifier_uses_advisory_id() {
        let ident = source_identifier(
            "Prototype Pollution in minimist",
            Some(&AdvisoryId::Number(1179)),
            Some("https://github.com/advisories/GHSA-vh95-rmgr-6w4m"),
        )
        .unwrap();
        assert_eq!(ident.kind, IdentifierKind::Cve);
        assert_eq!(ident.value, "1179");
        assert_eq!(ident.name, "Prototype Pollution in minimist");
        assert!(source_identifier("t", None, None).is_none());
    }

    #[test]
    fn scanner_embeds_version() {
        let s = scanner(ReportVersion::V2);
        assert_eq!(s.id, "npm_audit_advisories");
        assert_eq!(s.name, "NPM Audit v2");
    }

    #[test]
    fn location_binds_fields() {
        let loc = location("package.json", "left-pad", "<1.3.0");
        assert_eq!(loc.file, "package.json");
        assert_eq!(loc.dependency.package.name, "left-pad");
        assert_eq!(loc.dependency.version, "<1.3.0");
    }

    #[test]
    fn remediation_mirrors_ids_into_cve() {
        let r = remediation("Upgrade a to v2.", &["A", "B"]).unwrap();
        assert_eq!(r.fix_ids(), vec!["A", "B"]);
        assert_eq!(r.fixes[1].cve, "B");
        assert_eq!(r.diff, " ");
    }

    #[test]
    fn remediation_rejects_non_list() {
        let err = remediation("Upgrade a to v2.", &json!("A")).unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { .. }));
        let err = remediation("Upgrade a to v2.", &json!({"id": "A"})).unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { .. }));
    }

    #[test]
    fn remediation_rejects_non_string_ids() {
        let err = remediation("Upgrade a to v2.", &json!(["A", 2])).unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { .. }));
    }
}
