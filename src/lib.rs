//! qrgen - client for the qr-code-generator.com API
//!
//! Collects QR rendering parameters, validates them, sends them to the
//! generator API and writes the returned image to a local output folder.
//!
//! # Features
//!
//! - **Fixed parameter set**: every API option with its default, iterated in a stable order
//! - **Client-side validation**: output paths, filenames and required parameters are checked before any request
//! - **Typed errors**: each API status maps onto one [`Error`] variant
//! - **Layered configuration**: toml/yaml/ini files plus `QRGEN_*` environment overrides
//!
//! # Example
//!
//! ```no_run
//! use qrgen::{AccessToken, QrGenerator, Settings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut generator = QrGenerator::new(
//!         Settings::default(),
//!         Some(AccessToken::FromEnv),
//!         [("qr_code_text", "https://example.com")],
//!     )?;
//!
//!     let path = generator.request(Some("homepage")).await?;
//!     println!("Saved to {}", path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod params;

// Re-exports for convenience
pub use error::{Error, Result};

pub use client::{AccessToken, ApiResponse, HttpTransport, QrGenerator, Transport};
pub use config::{LogRotation, LoggingOptions, QrGenConfig, Settings};
pub use output::OutputTarget;
pub use params::{DEFAULT_PARAMETERS, ImageFormat, ParamValue, Parameter, ParameterSet};
