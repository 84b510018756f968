//! Document editor
//!
//! Owns one open PDF and mutates it in place. Every operation takes 1-based
//! page numbers and silently drops numbers outside the document.

use crate::error::PdfCleanError;
use crate::images::parse_sizes;
use crate::page;
use crate::report::{ContentReport, ImageInfo, PageContents};
use crate::selector::PageSelector;
use crate::text;
use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};

/// Rotation angles a page may be set to
pub const VALID_ANGLES: [i64; 4] = [0, 90, 180, 270];

/// Editing session over a single PDF document
pub struct DocumentEditor {
    doc: Document,
    source_path: Option<PathBuf>,
}

impl DocumentEditor {
    /// Open a PDF file for editing
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfCleanError> {
        let path = path.as_ref();
        let doc = Document::load(path).map_err(|e| PdfCleanError::DocumentOpen {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(
            "Opened {} ({} pages)",
            path.display(),
            doc.get_pages().len()
        );
        Ok(Self {
            doc,
            source_path: Some(path.to_path_buf()),
        })
    }

    /// Open a PDF held in memory
    pub fn load_mem(bytes: &[u8]) -> Result<Self, PdfCleanError> {
        let doc = Document::load_mem(bytes).map_err(|e| PdfCleanError::DocumentOpen {
            path: "<memory>".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_document(doc))
    }

    /// Wrap an already loaded document; `save` has no source to protect
    pub fn from_document(doc: Document) -> Self {
        Self {
            doc,
            source_path: None,
        }
    }

    /// Release the document
    pub fn close(self) {
        tracing::debug!("Closing document {:?}", self.source_path);
    }

    /// File the document was opened from, if any
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Read-only view of the underlying lopdf document
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Rotation of a page in degrees, `None` when the page does not exist
    pub fn rotation(&self, page_number: u32) -> Option<i64> {
        let page_id = *self.doc.get_pages().get(&page_number)?;
        Some(page::rotation(&self.doc, page_id))
    }

    fn page_ids(&self) -> Vec<ObjectId> {
        self.doc.get_pages().into_values().collect()
    }

    /// Remove text from every content stream of every page
    ///
    /// With targets, every literal occurrence of each target's UTF-8 bytes is
    /// deleted, applying targets in order against the evolving stream until
    /// none remains. Matching is by raw bytes, so a target can also hit
    /// unrelated operands. Without targets, every `BT ... ET` text run is
    /// deleted along with its delimiters.
    pub fn remove_texts<S: AsRef<str>>(&mut self, targets: &[S]) -> Result<(), PdfCleanError> {
        let mut rewritten = 0usize;
        for page_id in self.page_ids() {
            for stream_id in self.doc.get_page_contents(page_id) {
                let Some(content) = page::read_stream(&self.doc, stream_id) else {
                    tracing::warn!("Skipping undecodable content stream {:?}", stream_id);
                    continue;
                };
                let cleaned = if targets.is_empty() {
                    text::strip_text_runs(&content)
                } else {
                    text::strip_all(&content, targets)
                };
                if cleaned != content {
                    page::write_stream(&mut self.doc, stream_id, cleaned)?;
                    rewritten += 1;
                }
            }
        }

        if targets.is_empty() {
            tracing::info!("Removed all text runs ({} streams rewritten)", rewritten);
        } else {
            tracing::info!(
                "Removed {} text target(s) ({} streams rewritten)",
                targets.len(),
                rewritten
            );
        }
        Ok(())
    }

    /// Remove images whose pixel size is within `tolerance` of any target
    ///
    /// Targets are `"WIDTHxHEIGHT"` strings and at least one is required.
    /// Images wrapped in form XObjects are reached too. Each page is handled
    /// on its own: shared images, forms and content streams are only changed
    /// for the pages where the image matched.
    pub fn remove_images<S: AsRef<str>>(
        &mut self,
        targets: &[S],
        tolerance: u32,
    ) -> Result<(), PdfCleanError> {
        if targets.is_empty() {
            return Err(PdfCleanError::InvalidArgument(
                "No image sizes specified".into(),
            ));
        }
        let sizes = parse_sizes(targets)?;

        let mut removed = 0usize;
        for (page_number, page_id) in self.doc.get_pages() {
            for image in page::page_images(&self.doc, page_id) {
                if !sizes
                    .iter()
                    .any(|size| size.matches(image.width, image.height, tolerance))
                {
                    continue;
                }
                if page::remove_image(&mut self.doc, page_id, image.id)? {
                    tracing::debug!(
                        "Removed {}x{} image {:?} from page {}",
                        image.width,
                        image.height,
                        image.id,
                        page_number
                    );
                    removed += 1;
                }
            }
        }

        tracing::info!("Removed {} image reference(s)", removed);
        Ok(())
    }

    /// Set the rotation of the selected pages to `angle` (absolute, not additive)
    pub fn rotate_pages(
        &mut self,
        pages: &PageSelector,
        angle: i64,
    ) -> Result<(), PdfCleanError> {
        if pages.is_empty() {
            return Err(PdfCleanError::InvalidArgument(
                "No pages specified for rotation".into(),
            ));
        }
        if !VALID_ANGLES.contains(&angle) {
            return Err(PdfCleanError::InvalidArgument(format!(
                "Rotation angle must be one of 0, 90, 180, 270 (got {})",
                angle
            )));
        }

        let all_pages = self.doc.get_pages();
        let targets = pages.resolve(all_pages.len() as u32);
        for page_number in &targets {
            if let Some(&page_id) = all_pages.get(page_number) {
                page::set_rotation(&mut self.doc, page_id, angle)?;
            }
        }

        tracing::info!("Rotated {} page(s) to {} degrees", targets.len(), angle);
        Ok(())
    }

    /// Delete the selected pages in one batch
    ///
    /// Page numbers refer to the document before this call; deleting one page
    /// does not shift the others still pending.
    pub fn remove_pages(&mut self, pages: &PageSelector) -> Result<(), PdfCleanError> {
        let targets: Vec<u32> = pages.resolve(self.page_count()).into_iter().collect();
        if targets.is_empty() {
            tracing::debug!("No valid pages to remove");
            return Ok(());
        }

        self.doc.delete_pages(&targets);
        tracing::info!(
            "Removed page(s) {:?}, {} remaining",
            targets,
            self.page_count()
        );
        Ok(())
    }

    /// Delete the page with the highest number
    ///
    /// Fails with [`PdfCleanError::InvalidArgument`] on a document with no pages.
    pub fn remove_last_page(&mut self) -> Result<(), PdfCleanError> {
        let last = self.page_count();
        if last == 0 {
            return Err(PdfCleanError::InvalidArgument(
                "Document has no pages to remove".into(),
            ));
        }
        self.doc.delete_pages(&[last]);
        tracing::info!("Removed last page ({})", last);
        Ok(())
    }

    /// Report the words and images of the selected pages
    ///
    /// An empty selector reports every page. Read-only.
    pub fn page_contents(
        &self,
        pages: &PageSelector,
        show_texts: bool,
        show_images: bool,
    ) -> ContentReport {
        let all_pages = self.doc.get_pages();
        let targets = pages.resolve_or_all(all_pages.len() as u32);

        let data = targets
            .into_iter()
            .filter_map(|page_number| {
                let page_id = *all_pages.get(&page_number)?;
                let texts = show_texts
                    .then(|| text::extract_words(&page::page_content(&self.doc, page_id)));
                let images = show_images.then(|| {
                    page::page_images(&self.doc, page_id)
                        .into_iter()
                        .map(|image| ImageInfo {
                            xref: image.id.0,
                            width: image.width,
                            height: image.height,
                        })
                        .collect()
                });
                Some(PageContents {
                    page_number,
                    texts,
                    images,
                })
            })
            .collect();

        ContentReport { data }
    }

    /// Serialize the edited document to a new file
    ///
    /// The source file is never written; asking to save over it fails. The
    /// in-memory document is left as is, so a failed save can be retried.
    pub fn save(&self, output_path: impl AsRef<Path>) -> Result<(), PdfCleanError> {
        let output_path = output_path.as_ref();
        let save_error = |reason: String| PdfCleanError::DocumentSave {
            path: output_path.display().to_string(),
            reason,
        };

        if let Some(source) = &self.source_path {
            if same_file(source, output_path) {
                return Err(save_error("refusing to overwrite the source document".into()));
            }
        }

        let mut out = self.prepared_copy();
        out.save(output_path).map_err(|e| save_error(e.to_string()))?;
        tracing::info!("Saved {} ({} pages)", output_path.display(), self.page_count());
        Ok(())
    }

    /// Serialize the edited document to bytes
    pub fn save_to_bytes(&self) -> Result<Vec<u8>, PdfCleanError> {
        let mut out = self.prepared_copy();
        let mut buffer = Vec::new();
        out.save_to(&mut buffer)
            .map_err(|e| PdfCleanError::DocumentSave {
                path: "<memory>".to_string(),
                reason: e.to_string(),
            })?;
        Ok(buffer)
    }

    /// Copy of the document with orphaned objects pruned and streams compressed
    fn prepared_copy(&self) -> Document {
        let mut out = self.doc.clone();
        out.prune_objects();
        out.compress();
        out
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
