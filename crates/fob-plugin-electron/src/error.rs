//! Error types for the Electron renderer plugin

use crate::runtime::RuntimeError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for plugin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring the plugin or materializing adapters
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A declared module identifier could not be turned into a matching pattern
    #[error("Invalid module pattern for '{identifier}': {source}")]
    #[diagnostic(
        code(fob::electron::invalid_pattern),
        help("Check the keys of the `resolve` option; they must be module identifiers")
    )]
    InvalidPattern {
        identifier: String,
        #[source]
        source: regex::Error,
    },

    /// Plugin options failed validation
    #[error("Invalid plugin options: {0}")]
    #[diagnostic(code(fob::electron::invalid_options))]
    InvalidOptions(String),

    /// The secondary bundler failed for a declared ESM module
    #[error("Failed to pre-bundle '{module}': {reason}")]
    #[diagnostic(
        code(fob::electron::prebundle_failed),
        help("Make sure the package is installed and can be bundled for Node.js")
    )]
    Prebundle { module: String, reason: String },

    /// The secondary bundler produced no entry chunk
    #[error("Pre-bundling '{module}' produced no entry chunk")]
    #[diagnostic(code(fob::electron::no_entry_chunk))]
    NoEntryChunk { module: String },

    /// A user-supplied builder failed
    #[error("Custom builder for '{module}' failed: {reason}")]
    #[diagnostic(code(fob::electron::custom_builder))]
    CustomBuilder { module: String, reason: String },

    /// JavaScript source could not be parsed while scanning exports
    #[error("Failed to parse module source: {reason}")]
    #[diagnostic(code(fob::electron::parse_failed))]
    ParseFailed { reason: String },

    /// File-system failure while reading or writing the cache
    #[error(transparent)]
    #[diagnostic(
        code(fob::electron::runtime),
        help("Check permissions on the node_modules cache directory")
    )]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn prebundle(module: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Prebundle {
            module: module.into(),
            reason: reason.to_string(),
        }
    }

    pub fn custom_builder(module: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::CustomBuilder {
            module: module.into(),
            reason: reason.to_string(),
        }
    }
}
