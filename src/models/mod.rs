//! Input and output data models for the conversion.

pub mod audit;
pub mod report;
pub mod vulnerability;
