//! In-process rewrite that keeps the document structure intact.
//!
//! This backend needs nothing outside the process, so every fallback chain
//! can reach it. Forms and annotations survive because objects are only
//! recompressed and pruned, never re-rendered.

use async_trait::async_trait;
use lopdf::{Document, SaveOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domains::compression::types::{BackendError, BackendErrorKind, BackendResult, PdfMethod};
use super::{persist_output, run_blocking, staging_file, PdfBackend};

#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralBackend;

impl StructuralBackend {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn library_error(method: PdfMethod, error: impl std::fmt::Display) -> BackendError {
    BackendError::new(method, BackendErrorKind::Library, error.to_string())
}

/// Flate-compress every page's content streams. A stream that cannot be
/// compressed is logged and left as it is. Returns the number compressed.
pub(crate) fn compress_page_contents(doc: &mut Document) -> usize {
    let pages: Vec<_> = doc.get_pages().into_iter().collect();
    let mut compressed = 0;

    for (number, page_id) in pages {
        for content_id in doc.get_page_contents(page_id) {
            let result = doc
                .get_object_mut(content_id)
                .and_then(|object| object.as_stream_mut())
                .and_then(|stream| stream.compress());
            match result {
                Ok(()) => compressed += 1,
                Err(e) => log::warn!(
                    "Skipping content stream {} {} R of page {}: {}",
                    content_id.0, content_id.1, number, e
                ),
            }
        }
    }

    compressed
}

fn rewrite(method: PdfMethod, input: &Path, output: &Path) -> BackendResult {
    let mut doc = Document::load(input).map_err(|e| library_error(method, e))?;

    let compressed = compress_page_contents(&mut doc);
    let pruned = doc.prune_objects();
    let emptied = doc.delete_zero_length_streams();
    doc.compress();
    log::debug!(
        "{}: {} content streams compressed, {} unreferenced objects pruned, {} empty streams dropped",
        input.display(),
        compressed,
        pruned.len(),
        emptied.len()
    );

    let mut staged = staging_file(method, output)?;
    {
        let options = SaveOptions::builder()
            .use_object_streams(true)
            .use_xref_streams(true)
            .compression_level(9)
            .build();
        let mut writer = BufWriter::new(staged.as_file_mut());
        doc.save_with_options(&mut writer, options)
            .map_err(|e| library_error(method, e))?;
        writer
            .flush()
            .map_err(|e| BackendError::new(method, BackendErrorKind::Io, e.to_string()))?;
    }

    persist_output(method, staged, output)
}

#[async_trait]
impl PdfBackend for StructuralBackend {
    fn method(&self) -> PdfMethod {
        PdfMethod::Structural
    }

    async fn apply(&self, input: &Path, output: &Path) -> BackendResult {
        let method = self.method();
        let input = input.to_path_buf();
        let output = output.to_path_buf();
        run_blocking(method, move || rewrite(method, &input, &output)).await
    }
}
