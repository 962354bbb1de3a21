pub mod config;
pub mod errors;
pub mod models;
pub mod parsers;
pub mod services;

pub use errors::ConversionError;
pub use services::conversion::{convert, convert_with, ConversionOptions};
