//! Mark: one positioned visible character.
//!
//! Use `Mark::builder()` to construct marks with optional fields.

use crate::model::state::Color;
use crate::utils::{HasBBox, Matrix, Rect, MATRIX_IDENTITY};

/// One visible character placed on the page: its decoded text, bounding box,
/// font, and the rendering matrix it was drawn with.
///
/// A single mark may carry several runes when a ligature charcode expanded
/// (e.g. "ﬁ" decoding to "fi"). Marks are immutable once emitted by the
/// interpreter, except for diacritic absorption during word fragmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    text: String,
    original: String,
    bbox: Rect,
    font_name: String,
    fontsize: f64,
    char_spacing: f64,
    /// Writing direction, rounded to the orientation granularity (degrees).
    orientation: i32,
    /// Text rendering matrix at emission time.
    trm: Matrix,
    fill_color: Color,
    stroke_color: Color,
}

/// Builder for [`Mark`] with optional fields.
#[derive(Debug, Clone)]
pub struct MarkBuilder {
    mark: Mark,
}

impl MarkBuilder {
    fn new(bbox: Rect, text: &str, font_name: &str, fontsize: f64) -> Self {
        Self {
            mark: Mark {
                text: text.to_string(),
                original: text.to_string(),
                bbox,
                font_name: font_name.to_string(),
                fontsize,
                char_spacing: 0.0,
                orientation: 0,
                trm: MATRIX_IDENTITY,
                fill_color: Color::default(),
                stroke_color: Color::default(),
            },
        }
    }

    /// Sets the pre-substitution text when it differs from `text`.
    pub fn original(mut self, original: &str) -> Self {
        self.mark.original = original.to_string();
        self
    }

    pub fn char_spacing(mut self, char_spacing: f64) -> Self {
        self.mark.char_spacing = char_spacing;
        self
    }

    pub fn orientation(mut self, orientation: i32) -> Self {
        self.mark.orientation = orientation;
        self
    }

    pub fn trm(mut self, trm: Matrix) -> Self {
        self.mark.trm = trm;
        self
    }

    pub fn fill_color(mut self, color: Color) -> Self {
        self.mark.fill_color = color;
        self
    }

    pub fn stroke_color(mut self, color: Color) -> Self {
        self.mark.stroke_color = color;
        self
    }

    pub fn build(self) -> Mark {
        self.mark
    }
}

impl Mark {
    pub fn builder(bbox: Rect, text: &str, font_name: &str, fontsize: f64) -> MarkBuilder {
        MarkBuilder::new(bbox, text, font_name, fontsize)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn font_name(&self) -> &str {
        &self.font_name
    }

    pub const fn fontsize(&self) -> f64 {
        self.fontsize
    }

    pub const fn char_spacing(&self) -> f64 {
        self.char_spacing
    }

    pub const fn orientation(&self) -> i32 {
        self.orientation
    }

    pub const fn trm(&self) -> Matrix {
        self.trm
    }

    pub const fn fill_color(&self) -> &Color {
        &self.fill_color
    }

    pub const fn stroke_color(&self) -> &Color {
        &self.stroke_color
    }

    /// Whether the mark renders nothing but whitespace.
    pub fn is_whitespace(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_whitespace)
    }

    /// Distance of the mark's baseline from the top of the page.
    pub fn depth(&self, page_top: f64) -> f64 {
        page_top - self.y0()
    }

    /// Replaces the mark's text after diacritic absorption, growing the
    /// bounding box to cover the absorbed mark.
    pub(crate) fn absorb_diacritic(&mut self, text: String, other_bbox: Rect) {
        self.text = text;
        self.bbox = crate::utils::rect_union(self.bbox, other_bbox);
    }
}

impl HasBBox for Mark {
    fn x0(&self) -> f64 {
        self.bbox.0
    }
    fn y0(&self) -> f64 {
        self.bbox.1
    }
    fn x1(&self) -> f64 {
        self.bbox.2
    }
    fn y1(&self) -> f64 {
        self.bbox.3
    }
}
