use std::fmt;

use crate::classify::Format;

/// A raw input as selected by the operator: a filename, an optional
/// declared content type, and the file's bytes. May be a loose image or
/// a ZIP container.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }
}

/// One accepted unit of work: image bytes with the original name and the
/// classified source format. Immutable once created; owned by the
/// current run and discarded when a new input selection is loaded.
#[derive(Debug, Clone)]
pub struct SourceItem {
    pub bytes: Vec<u8>,
    pub name: String,
    pub format: Format,
}

/// A human-readable rejection or failure reason tied to one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
}

impl Diagnostic {
    pub fn unsupported_extension(name: &str) -> Self {
        Self {
            message: format!("{name}: unsupported file extension"),
        }
    }

    pub fn unsupported_type(name: &str, declared: &str) -> Self {
        Self {
            message: format!("{name}: unsupported content type \"{declared}\""),
        }
    }

    pub fn archive_open(name: &str, err: &anyhow::Error) -> Self {
        Self {
            message: format!("{name}: could not open archive ({err})"),
        }
    }

    pub fn archive_mismatch(name: &str) -> Self {
        Self {
            message: format!("{name}: named like a ZIP archive but not declared as one"),
        }
    }

    pub fn unreadable_entry(name: &str, err: &anyhow::Error) -> Self {
        Self {
            message: format!("{name}: unreadable archive entry ({err})"),
        }
    }

    pub fn conversion_failed(name: &str) -> Self {
        Self {
            message: format!("{name}: conversion failed"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A successfully converted item, ready for individual download or for
/// packing into the output archive.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// The inferred source-format state of the current input selection.
///
/// The source format is always derived from the accepted items, never
/// asserted by the operator: no items disables the selector, a single
/// shared tag locks it to that tag, and a spread of tags locks it to the
/// mixed placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLock {
    Empty,
    Uniform(Format),
    Mixed,
}

impl fmt::Display for SourceLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLock::Empty => f.write_str("-"),
            SourceLock::Uniform(format) => write!(f, "{format}"),
            SourceLock::Mixed => f.write_str("mixed"),
        }
    }
}
