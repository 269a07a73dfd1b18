//! Error types for render and publish operations

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors that can occur while rendering or publishing an analysis document
#[derive(Debug)]
pub enum ExportError {
    /// The input text was empty or contained only whitespace
    NoContent,
    /// No render target is registered under the requested name
    UnknownTarget { name: String },
    /// The target produces binary artifacts and cannot write to a console
    OutputPathRequired { target: String },
    /// A target failed to convert the document into its artifact
    ConversionFailed { target: String, reason: String },
    /// Assembling a container artifact (archive parts, serialized model) failed
    PackagingFailed { reason: String },
    /// Writing the finished artifact to disk failed
    WriteFailed { path: PathBuf, source: io::Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NoContent => {
                write!(f, "Document is empty: nothing to render")
            }
            ExportError::UnknownTarget { name } => {
                write!(f, "Unknown render target '{}'", name)
            }
            ExportError::OutputPathRequired { target } => {
                write!(
                    f,
                    "Target '{}' produces a binary artifact and needs an output path",
                    target
                )
            }
            ExportError::ConversionFailed { target, reason } => {
                write!(f, "Conversion to '{}' failed: {}", target, reason)
            }
            ExportError::PackagingFailed { reason } => {
                write!(f, "Packaging failed: {}", reason)
            }
            ExportError::WriteFailed { path, source } => {
                write!(f, "Could not write '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::WriteFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl ExportError {
    /// A short, user-facing suggestion for how to recover from this error.
    ///
    /// Returned alongside the message so a front end can show both without
    /// matching on variants itself.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ExportError::NoContent => "Provide a document with at least one non-blank line",
            ExportError::UnknownTarget { .. } => {
                "Run the target listing to see which names are available"
            }
            ExportError::OutputPathRequired { .. } => {
                "Pass an output file path instead of printing to the console"
            }
            ExportError::ConversionFailed { .. } => {
                "Validate the document first; malformed blocks are the usual cause"
            }
            ExportError::PackagingFailed { .. } => {
                "Retry the export; if it persists the document may be too large"
            }
            ExportError::WriteFailed { .. } => {
                "Check that the directory exists and is writable"
            }
        }
    }

    /// True when retrying the same call with the same input cannot succeed.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ExportError::NoContent
                | ExportError::UnknownTarget { .. }
                | ExportError::OutputPathRequired { .. }
        )
    }
}

/// Type alias for render and publish results
pub type ExportResult<T> = Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_target() {
        let err = ExportError::UnknownTarget {
            name: "pdf".to_string(),
        };
        assert!(err.to_string().contains("'pdf'"));
    }

    #[test]
    fn write_failure_keeps_the_io_source() {
        let err = ExportError::WriteFailed {
            path: PathBuf::from("/tmp/out.html"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("/tmp/out.html"));
    }

    #[test]
    fn every_variant_has_a_recovery_hint() {
        let errors = [
            ExportError::NoContent,
            ExportError::UnknownTarget {
                name: "x".to_string(),
            },
            ExportError::OutputPathRequired {
                target: "package".to_string(),
            },
            ExportError::ConversionFailed {
                target: "pages".to_string(),
                reason: "layout".to_string(),
            },
            ExportError::PackagingFailed {
                reason: "archive".to_string(),
            },
            ExportError::WriteFailed {
                path: PathBuf::from("a"),
                source: io::Error::new(io::ErrorKind::Other, "x"),
            },
        ];
        for err in errors {
            assert!(!err.recovery_hint().is_empty());
        }
    }
}
