//! Conversion entry point orchestrating parsing, dispatch, and serialization.
//!
//! Accepts raw `npm audit --json` text, drops any log noise in front of the
//! JSON document, detects the report schema, runs the matching parser, and
//! serializes the assembled report.

use serde_json::Value;

use crate::errors::ConversionError;
use crate::models::report::Report;
use crate::parsers::{self, ReportVersion};
use crate::services::report;

/// Knobs for a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Manifest path written into locations and the dependency file.
    pub manifest_path: Option<String>,
}

/// Convert audit output text into a pretty-printed report.
pub fn convert(input: &str) -> Result<String, ConversionError> {
    convert_with(input, &ConversionOptions::default())
}

/// Convert audit output text with explicit options.
pub fn convert_with(input: &str, options: &ConversionOptions) -> Result<String, ConversionError> {
    let document = parse_input(input)?;

    build_report(document, options)
        .and_then(|report| serde_json::to_string_pretty(&report).map_err(ConversionError::from))
        .map_err(|e| {
            tracing::error!(error = %e, "Conversion failed");
            ConversionError::internal(e)
        })
}

/// Parse raw input into a JSON document.
pub fn parse_input(input: &str) -> Result<Value, ConversionError> {
    serde_json::from_str(strip_log_prefix(input)).map_err(ConversionError::from_parse)
}

/// Detect the schema and build the canonical report.
pub fn build_report(document: Value, options: &ConversionOptions) -> Result<Report, ConversionError> {
    let version = ReportVersion::detect(&document);
    tracing::debug!(report_version = %version, "Detected npm audit report version");

    let parser = parsers::parser_for(version, options.manifest_path.as_deref());
    let result = parser.parse(document)?;
    Ok(report::assemble(result))
}

/// Drop everything before the first `{` (e.g. `npm run-script` banners).
fn strip_log_prefix(input: &str) -> &str {
    if input.trim_start().starts_with('{') {
        return input;
    }
    match input.find('{') {
        Some(start) => {
            tracing::debug!(skipped_bytes = start, "Stripped log prefix before JSON");
            &input[start..]
        }
        None => input,
    }
}
