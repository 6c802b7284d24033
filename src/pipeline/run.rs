//! Run state and conversion orchestration.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use tracing::{debug, warn};

use super::normalize::{self, Normalized};
use super::types::{ConversionResult, Diagnostic, RawFile, SourceItem, SourceLock};
use crate::classify::Format;
use crate::codec;
use crate::zip::ZipWriter;

/// Fixed filename offered for the bulk download archive.
pub const ARCHIVE_NAME: &str = "converted_images.zip";

/// State of the single active conversion run.
///
/// Loading a new input selection resets everything and bumps the run
/// generation; a conversion tags itself with the generation it started
/// under and discards its whole batch if a newer selection arrived
/// before it could commit, so stale results never land in current state.
/// Re-converting the same selection rebuilds `results` while the source
/// items persist.
pub struct RunState {
    generation: Arc<AtomicU64>,
    items: Vec<Arc<SourceItem>>,
    diagnostics: Vec<Diagnostic>,
    results: Vec<ConversionResult>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            items: Vec::new(),
            diagnostics: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Replace the current input selection, normalizing it into the work
    /// list. Previous items, diagnostics and results are discarded.
    pub async fn load_inputs(&mut self, inputs: Vec<RawFile>) {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let Normalized { items, diagnostics } = normalize::normalize(inputs).await;
        self.items = items.into_iter().map(Arc::new).collect();
        self.diagnostics = diagnostics;
        self.results.clear();
    }

    pub fn source_items(&self) -> impl Iterator<Item = &SourceItem> {
        self.items.iter().map(Arc::as_ref)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Converted items, in work-list order, for per-item retrieval.
    pub fn results(&self) -> &[ConversionResult] {
        &self.results
    }

    /// The inferred source-format lock for the current selection.
    pub fn source_lock(&self) -> SourceLock {
        normalize::source_lock(self.items.iter().map(Arc::as_ref))
    }

    /// Convert every source item to the target format.
    ///
    /// Items are decoded and re-encoded on blocking worker threads in
    /// parallel; completions are joined in work-list order so results
    /// stay index-stable regardless of finish order. A failed item
    /// becomes a diagnostic and never aborts the rest of the batch.
    pub async fn convert_all(&mut self, target: Format) {
        self.results.clear();
        let run_generation = self.generation.load(Ordering::SeqCst);

        let handles: Vec<_> = self
            .items
            .iter()
            .map(|item| {
                let item = Arc::clone(item);
                tokio::task::spawn_blocking(move || codec::convert(&item.bytes, target))
            })
            .collect();

        let mut results = Vec::with_capacity(self.items.len());
        let mut failures = Vec::new();

        for (item, handle) in self.items.iter().zip(handles) {
            match handle.await {
                Ok(Ok(bytes)) => {
                    let filename = rewrite_extension(&item.name, target);
                    debug!(item = %item.name, output = %filename, "converted");
                    results.push(ConversionResult { bytes, filename });
                }
                Ok(Err(err)) => {
                    warn!(item = %item.name, %err, "conversion failed");
                    failures.push(Diagnostic::conversion_failed(&item.name));
                }
                Err(err) => {
                    warn!(item = %item.name, %err, "conversion worker died");
                    failures.push(Diagnostic::conversion_failed(&item.name));
                }
            }
        }

        // A newer input selection supersedes this run; its batch must
        // not leak into the current state.
        if self.generation.load(Ordering::SeqCst) != run_generation {
            debug!("discarding batch from superseded run");
            return;
        }

        self.results = results;
        self.diagnostics.extend(failures);
    }

    /// Pack the current results into a single archive byte buffer.
    ///
    /// Colliding output names are resolved by the writer. Packing is
    /// all-or-nothing: an error here leaves the individually
    /// retrievable results untouched.
    pub fn pack_results(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new();
        for result in &self.results {
            writer.add_entry(&result.filename, &result.bytes)?;
        }
        writer.finish()
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite a filename's extension to the target format's canonical one.
fn rewrite_extension(name: &str, target: Format) -> String {
    match name.rsplit_once('.') {
        Some((base, _)) => format!("{}.{}", base, target.extension()),
        None => format!("{}.{}", name, target.extension()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_png() -> Vec<u8> {
        let img = image::ImageBuffer::from_fn(6, 4, |x, y| {
            image::Rgb([(x * 40) as u8, (y * 60) as u8, 90])
        });
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn loose(name: &str, bytes: Vec<u8>) -> RawFile {
        RawFile::new(name, None, bytes)
    }

    #[tokio::test]
    async fn failed_item_is_isolated_from_the_batch() {
        let mut run = RunState::new();
        run.load_inputs(vec![
            loose("one.png", sample_png()),
            loose("two.png", b"corrupt image data".to_vec()),
            loose("three.png", sample_png()),
        ])
        .await;
        assert_eq!(run.item_count(), 3);
        assert!(run.diagnostics().is_empty());

        run.convert_all(Format::Jpeg).await;

        let names: Vec<_> = run.results().iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["one.jpg", "three.jpg"]);
        assert_eq!(run.diagnostics().len(), 1);
        assert!(run.diagnostics()[0].message.contains("two.png"));
    }

    #[tokio::test]
    async fn output_extension_follows_target_format() {
        let mut run = RunState::new();
        run.load_inputs(vec![loose("photo.png", sample_png())]).await;

        run.convert_all(Format::Webp).await;
        assert_eq!(run.results()[0].filename, "photo.webp");

        run.convert_all(Format::Jpeg).await;
        assert_eq!(run.results()[0].filename, "photo.jpg");

        run.convert_all(Format::Png).await;
        assert_eq!(run.results()[0].filename, "photo.png");
    }

    #[tokio::test]
    async fn reconversion_rebuilds_results_and_keeps_items() {
        let mut run = RunState::new();
        run.load_inputs(vec![loose("a.png", sample_png())]).await;

        run.convert_all(Format::Png).await;
        run.convert_all(Format::Png).await;

        assert_eq!(run.item_count(), 1);
        assert_eq!(run.results().len(), 1);
    }

    #[tokio::test]
    async fn loading_new_inputs_clears_previous_run() {
        let mut run = RunState::new();
        run.load_inputs(vec![loose("a.png", sample_png())]).await;
        run.convert_all(Format::Png).await;
        assert_eq!(run.results().len(), 1);

        run.load_inputs(vec![loose("b.txt", b"nope".to_vec())]).await;
        assert_eq!(run.item_count(), 0);
        assert!(run.results().is_empty());
        assert_eq!(run.diagnostics().len(), 1);
    }

    #[tokio::test]
    async fn packed_results_get_collision_safe_names() {
        let mut run = RunState::new();
        // Same name arriving twice, e.g. from two archives
        run.load_inputs(vec![
            loose("dup.png", sample_png()),
            loose("dup.png", sample_png()),
        ])
        .await;
        run.convert_all(Format::Png).await;

        let archive = run.pack_results().unwrap();
        let extractor = crate::zip::ZipExtractor::new(std::sync::Arc::new(
            crate::io::MemoryReader::new(archive),
        ));
        let names: Vec<_> = extractor
            .entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.file_name)
            .collect();
        assert_eq!(names, ["dup.png", "dup(1).png"]);
    }

    #[test]
    fn extension_rewrite_handles_dotless_names() {
        assert_eq!(rewrite_extension("photo.png", Format::Jpeg), "photo.jpg");
        assert_eq!(rewrite_extension("photo", Format::Webp), "photo.webp");
        assert_eq!(rewrite_extension("a.b.c.jpeg", Format::Png), "a.b.c.png");
    }
}
