//! Clean plans
//!
//! A plan selects which edits to run on a document and with which
//! parameters. Steps always run in the same order: text, images, rotation,
//! page removal, last-page removal.

use crate::editor::DocumentEditor;
use crate::error::PdfCleanError;
use crate::selector::PageSelector;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanPlan {
    /// Text to strip; an empty list strips every text run
    #[serde(default)]
    pub remove_texts: Option<Vec<String>>,

    #[serde(default)]
    pub remove_images: Option<ImageRemoval>,

    #[serde(default)]
    pub rotate: Option<Rotation>,

    #[serde(default)]
    pub remove_pages: Option<PageSelector>,

    #[serde(default)]
    pub remove_last_page: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRemoval {
    /// Sizes as `"WIDTHxHEIGHT"`
    pub sizes: Vec<String>,
    #[serde(default)]
    pub tolerance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
    pub pages: PageSelector,
    pub angle: i64,
}

impl CleanPlan {
    pub fn from_json(json: &str) -> Result<Self, PdfCleanError> {
        serde_json::from_str(json).map_err(|e| PdfCleanError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PdfCleanError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| PdfCleanError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// True when no step is enabled
    pub fn is_empty(&self) -> bool {
        self.remove_texts.is_none()
            && self.remove_images.is_none()
            && self.rotate.is_none()
            && self.remove_pages.is_none()
            && !self.remove_last_page
    }

    /// Run the enabled steps in order, stopping at the first failure
    ///
    /// Steps that already ran stay applied when a later one fails.
    pub fn apply(&self, editor: &mut DocumentEditor) -> Result<(), PdfCleanError> {
        tracing::info!("Start cleaning process");

        if let Some(texts) = &self.remove_texts {
            tracing::info!("Removing text");
            editor.remove_texts(texts)?;
        }
        if let Some(images) = &self.remove_images {
            tracing::info!("Removing images");
            editor.remove_images(&images.sizes, images.tolerance)?;
        }
        if let Some(rotation) = &self.rotate {
            tracing::info!("Rotating pages");
            editor.rotate_pages(&rotation.pages, rotation.angle)?;
        }
        if let Some(pages) = &self.remove_pages {
            tracing::info!("Removing pages");
            editor.remove_pages(pages)?;
        }
        if self.remove_last_page {
            tracing::info!("Removing last page");
            editor.remove_last_page()?;
        }

        tracing::info!("Cleaning process finished");
        Ok(())
    }
}
