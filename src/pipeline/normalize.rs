//! Input normalization.
//!
//! Flattens a heterogeneous input selection (loose image files plus ZIP
//! containers) into a uniform, ordered work list. An archive's entries
//! are expanded inline at the archive's position, each entry classified
//! individually. Every rejection becomes a [`Diagnostic`]; nothing in
//! this stage aborts the batch.

use std::sync::Arc;

use tracing::{debug, warn};

use super::types::{Diagnostic, RawFile, SourceItem, SourceLock};
use crate::classify::{self, Rejected};
use crate::io::MemoryReader;
use crate::zip::ZipExtractor;

/// Declared content type that marks a raw input as a ZIP container.
pub const ZIP_MIME: &str = "application/zip";

/// Outcome of normalizing one input selection.
#[derive(Default)]
pub struct Normalized {
    pub items: Vec<SourceItem>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Flatten raw inputs into the work list, in input order.
pub async fn normalize(inputs: Vec<RawFile>) -> Normalized {
    let mut out = Normalized::default();

    for file in inputs {
        if is_archive(&file) {
            expand_archive(file, &mut out).await;
        } else {
            accept_loose(file, &mut out);
        }
    }

    out
}

/// Archive detection: a declared `application/zip` type, or a `.zip`
/// name when no type was declared at all. A `.zip` name with a
/// conflicting declared type is handled as a rejection in
/// [`accept_loose`], not silently unpacked.
fn is_archive(file: &RawFile) -> bool {
    match file.content_type.as_deref() {
        Some(declared) if !declared.is_empty() => declared == ZIP_MIME,
        _ => classify::extension_of(&file.name) == "zip",
    }
}

async fn expand_archive(file: RawFile, out: &mut Normalized) {
    let archive_name = file.name;
    let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(file.bytes)));

    // A container that cannot be opened is one diagnostic for the whole
    // archive; no per-entry recovery is attempted.
    let entries = match extractor.entries().await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(archive = %archive_name, %err, "failed to open archive");
            out.diagnostics.push(Diagnostic::archive_open(&archive_name, &err));
            return;
        }
    };

    for entry in entries {
        if entry.is_directory {
            continue;
        }

        // Archive entries carry no trustworthy content type; the
        // extension decides.
        let format = match classify::classify_entry(&entry.file_name) {
            Ok(format) => format,
            Err(_) => {
                out.diagnostics
                    .push(Diagnostic::unsupported_extension(&entry.file_name));
                continue;
            }
        };

        match extractor.read_entry(&entry).await {
            Ok(bytes) => {
                debug!(entry = %entry.file_name, %format, "accepted archive entry");
                out.items.push(SourceItem {
                    bytes,
                    name: entry.file_name,
                    format,
                });
            }
            Err(err) => {
                warn!(entry = %entry.file_name, %err, "unreadable archive entry");
                out.diagnostics
                    .push(Diagnostic::unreadable_entry(&entry.file_name, &err));
            }
        }
    }
}

fn accept_loose(file: RawFile, out: &mut Normalized) {
    match classify::classify_loose(&file.name, file.content_type.as_deref()) {
        Ok(format) => {
            debug!(file = %file.name, %format, "accepted file");
            out.items.push(SourceItem {
                bytes: file.bytes,
                name: file.name,
                format,
            });
        }
        Err(Rejected::UnsupportedType(declared)) => {
            // A .zip name whose declared type did not confirm it as an
            // archive gets the distinct archive-mismatch diagnostic.
            if classify::extension_of(&file.name) == "zip" {
                out.diagnostics.push(Diagnostic::archive_mismatch(&file.name));
            } else {
                out.diagnostics
                    .push(Diagnostic::unsupported_type(&file.name, &declared));
            }
        }
        Err(Rejected::UnsupportedExtension) => {
            out.diagnostics
                .push(Diagnostic::unsupported_extension(&file.name));
        }
    }
}

/// Derive the source-format lock for a set of accepted items.
pub fn source_lock<'a, I>(items: I) -> SourceLock
where
    I: IntoIterator<Item = &'a SourceItem>,
{
    let mut formats = items.into_iter().map(|item| item.format);
    match formats.next() {
        None => SourceLock::Empty,
        Some(first) => {
            if formats.all(|format| format == first) {
                SourceLock::Uniform(first)
            } else {
                SourceLock::Mixed
            }
        }
    }
}
