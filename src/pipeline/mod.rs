//! Batch conversion pipeline.
//!
//! Ties the classifier, archive reader, conversion engine and archive
//! writer together into one run:
//!
//! 1. [`normalize`](normalize()) flattens loose files and ZIP containers
//!    into an ordered work list of [`SourceItem`]s plus rejection
//!    [`Diagnostic`]s.
//! 2. [`RunState::convert_all`] drives per-item conversion with
//!    independent failure isolation.
//! 3. [`RunState::pack_results`] packs the successes into a single
//!    downloadable archive with collision-safe entry names.
//!
//! Only one run is active at a time; loading a new input selection
//! supersedes any still-running conversion via a generation counter.

mod normalize;
mod run;
mod types;

pub use normalize::{Normalized, ZIP_MIME, normalize, source_lock};
pub use run::{ARCHIVE_NAME, RunState};
pub use types::{ConversionResult, Diagnostic, RawFile, SourceItem, SourceLock};
