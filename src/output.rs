//! Output types produced by the recognition backends.
//!
//! A single invocation produces exactly one [`RecognitionOutput`] variant;
//! plain text and structured orders are never mixed.

use serde::{Deserialize, Serialize};

/// A customer order recovered from an image by the vision model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub customer_name: String,
    pub order_date: String,
    /// Line items in the order the model listed them. Duplicates are kept.
    pub items: Vec<LineItem>,
    /// Numeric status code. See [`crate::pipeline::schema::status_code`] for
    /// the word-to-code mapping applied to textual statuses.
    pub status: i64,
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub matched_name: String,
    /// The text as written on the source document.
    pub original_input: String,
    pub quantity: u32,
    /// Confidence of the name match, in `[0, 1]`.
    pub match_score: f64,
}

/// Axis-aligned pixel rectangle of a detected text region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = (self.left + self.width).max(other.left + other.width);
        let bottom = (self.top + self.height).max(other.top + other.height);
        BoundingBox {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// A line of text found by the accurate OCR backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub region: BoundingBox,
    pub text: String,
    /// Mean word confidence, in `[0, 1]`.
    pub confidence: f32,
}

/// What a single recognition call returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RecognitionOutput {
    /// Plain text from the fast OCR backend or the PDF extractor.
    Text(String),
    /// Line regions from the accurate OCR backend.
    Detections(Vec<Detection>),
    /// Structured order from the remote vision model.
    Order(OrderRecord),
}

impl RecognitionOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecognitionOutput::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_order(&self) -> Option<&OrderRecord> {
        match self {
            RecognitionOutput::Order(o) => Some(o),
            _ => None,
        }
    }
}
