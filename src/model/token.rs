//! Input boundary types: positioned text tokens and drawn page geometry.
//!
//! These are produced by an external PDF text-extraction step (page
//! geometry, glyph decoding and font handling happen there); demex only
//! consumes the materialized token stream.

use serde::{Deserialize, Serialize};

/// An RGB color descriptor attached to a token or drawn shape.
///
/// Components are in the 0.0-1.0 range as PDF content streams emit them.
/// Comparison is tolerance-based because extractors round differently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub f32, pub f32, pub f32);

impl Color {
    /// Component tolerance when matching colors from different extractors.
    const EPSILON: f32 = 0.005;

    /// Check whether two colors are the same within tolerance.
    pub fn matches(&self, other: &Color) -> bool {
        (self.0 - other.0).abs() < Self::EPSILON
            && (self.1 - other.1).abs() < Self::EPSILON
            && (self.2 - other.2).abs() < Self::EPSILON
    }
}

/// A unit of page text with its bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Text content of the token
    pub text: String,
    /// Left edge
    pub x0: f32,
    /// Right edge
    pub x1: f32,
    /// Top edge (Y grows downward, as in pdfplumber-style extractors)
    pub top: f32,
    /// Bottom edge
    pub bottom: f32,
    /// Fill color of the glyphs, when the extractor reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Token {
    /// Create a token with just text and horizontal extent, on a given Y.
    pub fn new(text: impl Into<String>, x0: f32, x1: f32, top: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            top,
            bottom: top + 8.0,
            color: None,
        }
    }
}

/// Kind of drawn geometry object on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// A stroked line (horizontal rules are the interesting case)
    Line,
    /// A filled or stroked rectangle
    Rect,
}

/// A drawn line or rectangle with its color descriptors.
///
/// Section markers are recognized by a shape of a designated color sitting
/// at the same Y as a title line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawnShape {
    /// Line or rectangle
    pub kind: ShapeKind,
    /// Top edge of the shape
    pub top: f32,
    /// Stroking color, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    /// Non-stroking (fill) color, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

impl DrawnShape {
    /// Check whether either color channel matches the given color.
    pub fn has_color(&self, color: &Color) -> bool {
        self.stroke.as_ref().is_some_and(|c| c.matches(color))
            || self.fill.as_ref().is_some_and(|c| c.matches(color))
    }
}

/// One page of extractor output: tokens plus drawn geometry.
///
/// Pages are positional; the page index is the position of this entry in
/// the document's page sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContent {
    /// Positioned text tokens
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Drawn lines and rectangles
    #[serde(default)]
    pub shapes: Vec<DrawnShape>,
}

impl PageContent {
    /// Create a page from tokens only.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            shapes: Vec::new(),
        }
    }
}
