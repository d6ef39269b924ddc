//! Display configuration loading
//!
//! The configuration is compiled into the image from display.toml and
//! parsed once at boot by a small no_std parser.

pub mod toml;

pub use toml::{parse_config, ParseError};
