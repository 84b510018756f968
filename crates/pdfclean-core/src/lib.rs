//! PDF cleaning engine
//!
//! Opens a PDF with lopdf and edits it in place: strip text from content
//! streams, strip images by pixel size, rotate pages, delete pages, and
//! report page contents before saving a new file.
//!
//! ```no_run
//! use pdfclean_core::{DocumentEditor, PageSelector};
//!
//! let mut editor = DocumentEditor::open("input.pdf")?;
//! editor.remove_texts(&["CONFIDENTIAL"])?;
//! editor.remove_images(&["100x100"], 2)?;
//! editor.remove_pages(&PageSelector::from(vec![3i64]))?;
//! editor.save("output.pdf")?;
//! # Ok::<(), pdfclean_core::PdfCleanError>(())
//! ```

pub mod editor;
pub mod error;
pub mod images;
pub mod page;
pub mod plan;
pub mod report;
pub mod selector;
pub mod text;

#[cfg(test)]
mod fixtures;

pub use editor::DocumentEditor;
pub use error::PdfCleanError;
pub use images::ImageSize;
pub use plan::{CleanPlan, ImageRemoval, Rotation};
pub use report::{ContentReport, ImageInfo, PageContents};
pub use selector::{parse_ranges, PageSelector};
