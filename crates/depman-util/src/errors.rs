use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all depman operations.
#[derive(Debug, Error, Diagnostic)]
pub enum DepmanError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed configuration file.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check your depman.toml for syntax errors"))]
    Config { message: String },

    /// A POM could not be read, parsed or built into an effective model.
    #[error("POM error: {message}")]
    Pom { message: String },

    /// Resolving the BOMs imported into a dependency management scope failed.
    #[error("Failed to resolve imported BOMs ({coordinates}): {cause}")]
    #[diagnostic(help("Check that every imported BOM exists and that its properties resolve"))]
    BomImport { coordinates: String, cause: String },

    /// Dependency resolution failed.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type DepmanResult<T> = miette::Result<T>;

/// The message of the deepest error in a report's cause chain.
///
/// Wrapping errors are usually uninformative ("failed to resolve"), so BOM
/// failures are surfaced with this instead.
pub fn root_cause_message(report: &miette::Report) -> String {
    report.root_cause().to_string()
}
