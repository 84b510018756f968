//! Page selectors
//!
//! Callers address pages with 1-based numbers. A selector is filtered against
//! the current page count: numbers outside `[1, page_count]` are dropped
//! silently so a caller can pass a superset without validating it first.

use crate::error::PdfCleanError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A caller-supplied set of 1-based page numbers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSelector(Vec<i64>);

impl PageSelector {
    /// Selector matching no explicit pages (means "all pages" for inspection)
    pub fn all() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Valid page numbers in ascending order, deduplicated
    pub fn resolve(&self, page_count: u32) -> BTreeSet<u32> {
        self.0
            .iter()
            .filter(|&&p| p >= 1 && p <= i64::from(page_count))
            .map(|&p| p as u32)
            .collect()
    }

    /// Like [`resolve`](Self::resolve), but an empty selector means every page
    pub fn resolve_or_all(&self, page_count: u32) -> BTreeSet<u32> {
        if self.is_empty() {
            (1..=page_count).collect()
        } else {
            self.resolve(page_count)
        }
    }
}

impl From<Vec<i64>> for PageSelector {
    fn from(pages: Vec<i64>) -> Self {
        Self(pages)
    }
}

impl From<&[i64]> for PageSelector {
    fn from(pages: &[i64]) -> Self {
        Self(pages.to_vec())
    }
}

impl From<Vec<u32>> for PageSelector {
    fn from(pages: Vec<u32>) -> Self {
        Self(pages.into_iter().map(i64::from).collect())
    }
}

impl FromIterator<i64> for PageSelector {
    fn from_iter<T: IntoIterator<Item = i64>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse page range string like "1-3, 5, 8-10" into sorted unique page numbers
pub fn parse_ranges(input: &str) -> Result<Vec<u32>, PdfCleanError> {
    let mut pages = BTreeSet::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start, end)) = part.split_once('-') {
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| PdfCleanError::InvalidRange(format!("Invalid start: {}", start)))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| PdfCleanError::InvalidRange(format!("Invalid end: {}", end)))?;

            if start > end {
                return Err(PdfCleanError::InvalidRange(format!(
                    "Start {} > end {}",
                    start, end
                )));
            }

            pages.extend(start..=end);
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| PdfCleanError::InvalidRange(format!("Invalid page: {}", part)))?;
            pages.insert(page);
        }
    }

    Ok(pages.into_iter().collect())
}
