//! Page inspection report
//!
//! Serializes as `{"data": [{"page_number": 1, "texts": [...], "images": [...]}]}`,
//! omitting `texts`/`images` when they were not requested.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentReport {
    pub data: Vec<PageContents>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContents {
    /// Page number (1-indexed)
    pub page_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageInfo>>,
}

/// One image referenced by a page, with its intrinsic pixel size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Object number of the image XObject
    pub xref: u32,
    pub width: u32,
    pub height: u32,
}

impl ContentReport {
    pub fn page_numbers(&self) -> Vec<u32> {
        self.data.iter().map(|page| page.page_number).collect()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_report_omits_unrequested_sections() {
        let report = ContentReport {
            data: vec![PageContents {
                page_number: 2,
                texts: Some(vec!["Draft".to_string()]),
                images: None,
            }],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({ "data": [{ "page_number": 2, "texts": ["Draft"] }] })
        );
    }

    #[test]
    fn test_report_keeps_empty_requested_sections() {
        let report = ContentReport {
            data: vec![PageContents {
                page_number: 1,
                texts: Some(Vec::new()),
                images: Some(vec![ImageInfo {
                    xref: 7,
                    width: 100,
                    height: 100,
                }]),
            }],
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "data": [{
                    "page_number": 1,
                    "texts": [],
                    "images": [{ "xref": 7, "width": 100, "height": 100 }]
                }]
            })
        );
    }
}
