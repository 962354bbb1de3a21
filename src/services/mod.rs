//! Conversion services.

pub mod builders;
pub mod conversion;
pub mod fingerprint;
pub mod remediation;
pub mod report;
