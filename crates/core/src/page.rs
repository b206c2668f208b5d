//! Page text view: the reading-ordered string and its position index.
//!
//! Serializes sorted paragraphs into one Unicode string plus a parallel
//! array of [`TextMark`] records mapping byte ranges of the string back to
//! rectangles on the page. Inserted whitespace (word joiners, line joiners,
//! paragraph separators) appears as meta records so the string and the
//! record array always concatenate to the same bytes.

use std::ops::Range;
use std::sync::Arc;

use itertools::Itertools;

use crate::error::{ExtractError, Result};
use crate::font::FontCache;
use crate::interp::{Interpreter, Resources};
use crate::layout::line::Line;
use crate::layout::mark::Mark;
use crate::layout::order::sort_reading_order;
use crate::layout::para::Para;
use crate::layout::region;
use crate::layout::word::{make_words, Word};
use crate::model::objects::ContentOp;
use crate::model::state::Color;
use crate::params::ExtractParams;
use crate::utils::{rect_union, HasBBox, Rect};

/// One position record: a substring of the page text and where it sits on
/// the page.
#[derive(Debug, Clone)]
pub struct TextMark {
    pub text: String,
    pub original: String,
    pub bbox: Rect,
    pub font_name: String,
    pub fontsize: f64,
    /// Byte offset of `text` within the page text.
    pub offset: usize,
    /// True for whitespace the view inserted rather than the page rendered.
    pub meta: bool,
    pub fill_color: Color,
    pub stroke_color: Color,
}

impl TextMark {
    fn from_mark(mark: &Mark, offset: usize) -> Self {
        Self {
            text: mark.text().to_string(),
            original: mark.original().to_string(),
            bbox: mark.bbox(),
            font_name: mark.font_name().to_string(),
            fontsize: mark.fontsize(),
            offset,
            meta: false,
            fill_color: mark.fill_color().clone(),
            stroke_color: mark.stroke_color().clone(),
        }
    }

    fn joiner(text: &str, offset: usize) -> Self {
        Self {
            text: text.to_string(),
            original: text.to_string(),
            bbox: (0.0, 0.0, 0.0, 0.0),
            font_name: String::new(),
            fontsize: 0.0,
            offset,
            meta: true,
            fill_color: Color::default(),
            stroke_color: Color::default(),
        }
    }

    fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// Offset-ordered position records with range lookups.
#[derive(Debug, Default)]
pub struct TextMarkArray {
    marks: Vec<TextMark>,
    text_len: usize,
}

impl TextMarkArray {
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TextMark> {
        self.marks.iter()
    }

    pub fn as_slice(&self) -> &[TextMark] {
        &self.marks
    }

    /// The contiguous records whose extents overlap the half-open byte
    /// range `[start, end)` of the page text.
    pub fn range_offset(&self, start: usize, end: usize) -> Result<&[TextMark]> {
        if end < start || end > self.text_len {
            return Err(ExtractError::OutOfRange {
                start,
                end,
                len: self.text_len,
            });
        }
        let lo = self
            .marks
            .partition_point(|m| m.offset + m.text.len() <= start);
        let hi = self.marks.partition_point(|m| m.offset < end);
        Ok(&self.marks[lo..hi.max(lo)])
    }

    /// Union box over non-meta, non-whitespace records.
    pub fn bbox(&self) -> Option<Rect> {
        Self::bbox_of(&self.marks)
    }

    /// Union box over non-meta, non-whitespace members of any record set.
    pub fn bbox_of(marks: &[TextMark]) -> Option<Rect> {
        marks
            .iter()
            .filter(|m| !m.meta && !m.is_whitespace())
            .map(|m| m.bbox)
            .reduce(rect_union)
    }
}

/// One table cell in the view: its text and the records that render it.
#[derive(Debug, Clone)]
pub struct TableCell {
    pub text: String,
    pub bbox: Rect,
    /// Index range into the page's position records.
    pub marks: Range<usize>,
}

/// A detected table as it appears in the view, cells row-major.
#[derive(Debug, Clone)]
pub struct TableView {
    pub w: usize,
    pub h: usize,
    pub bbox: Rect,
    pub cells: Vec<TableCell>,
}

impl TableView {
    pub fn cell(&self, x: usize, y: usize) -> Option<&TableCell> {
        if x < self.w && y < self.h {
            self.cells.get(y * self.w + x)
        } else {
            None
        }
    }
}

/// The extracted text of one page.
pub struct PageText {
    media_box: Rect,
    marks: Vec<Mark>,
    text: String,
    view_marks: TextMarkArray,
    tables: Vec<TableView>,
    num_chars: usize,
    num_misses: usize,
    errors: Vec<ExtractError>,
}

impl PageText {
    /// The reading-order Unicode text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Offset-sorted position records.
    pub fn marks(&self) -> &TextMarkArray {
        &self.view_marks
    }

    /// The raw marks the interpreter emitted, in stream order.
    pub fn raw_marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Detected tables, with per-cell text and record subranges.
    pub fn tables(&self) -> &[TableView] {
        &self.tables
    }

    pub const fn media_box(&self) -> Rect {
        self.media_box
    }

    /// Glyphs rendered.
    pub const fn num_chars(&self) -> usize {
        self.num_chars
    }

    /// Charcodes that failed to decode.
    pub const fn num_misses(&self) -> usize {
        self.num_misses
    }

    /// Errors recorded during extraction; the page content is whatever
    /// could be extracted past them.
    pub fn errors(&self) -> &[ExtractError] {
        &self.errors
    }
}

/// Result of a page extraction: best-effort output plus the first error.
pub struct PageOutcome {
    pub page: PageText,
    pub num_chars: usize,
    pub num_misses: usize,
    pub error: Option<ExtractError>,
}

/// Extracts one page: runs the state machine over the operator stream and
/// reconstructs words, paragraphs, optional tables, and reading order.
///
/// `font_cache` is the optional per-document LRU; callers sharing one
/// across workers must serialize access.
pub fn extract_page(
    ops: &[ContentOp],
    resources: Arc<dyn Resources>,
    media_box: Rect,
    params: &ExtractParams,
    font_cache: Option<&mut FontCache>,
) -> PageOutcome {
    let mut interp = Interpreter::new(resources, media_box, params, font_cache);
    interp.process(ops);
    let output = interp.finish();

    let page = build_page_text(
        output.marks,
        media_box,
        params,
        output.num_chars,
        output.num_misses,
        output.errors,
    );
    let error = page.errors.first().cloned();
    PageOutcome {
        num_chars: page.num_chars,
        num_misses: page.num_misses,
        error,
        page,
    }
}

/// Builds the paragraph list and serialized view from raw marks.
pub(crate) fn build_page_text(
    marks: Vec<Mark>,
    media_box: Rect,
    params: &ExtractParams,
    num_chars: usize,
    num_misses: usize,
    errors: Vec<ExtractError>,
) -> PageText {
    let page_top = media_box.3;

    // Partition once into orientation buckets, preserving stream order
    // within each; process buckets in ascending orientation.
    let mut buckets = marks
        .iter()
        .cloned()
        .into_group_map_by(Mark::orientation);

    let mut paras: Vec<Para> = Vec::new();
    for orientation in buckets.keys().copied().sorted() {
        let bucket = buckets.remove(&orientation).expect("key just listed");
        let words = make_words(bucket, page_top, params);
        for region in region::divide(words, page_top, params) {
            if let Some(para) = Para::compose(region, params) {
                paras.push(para);
            }
        }
    }

    let paras = crate::layout::table::find_tables(paras, params);
    let paras = sort_reading_order(paras, media_box);

    let mut builder = ViewBuilder::new(params, page_top);
    builder.build(&paras);
    let (text, view_marks, tables) = builder.into_parts();

    PageText {
        media_box,
        marks,
        text,
        view_marks,
        tables,
        num_chars,
        num_misses,
        errors,
    }
}

struct ViewBuilder<'a> {
    params: &'a ExtractParams,
    page_top: f64,
    text: String,
    marks: Vec<TextMark>,
    tables: Vec<TableView>,
}

impl<'a> ViewBuilder<'a> {
    fn new(params: &'a ExtractParams, page_top: f64) -> Self {
        Self {
            params,
            page_top,
            text: String::new(),
            marks: Vec::new(),
            tables: Vec::new(),
        }
    }

    fn into_parts(self) -> (String, TextMarkArray, Vec<TableView>) {
        let text_len = self.text.len();
        (
            self.text,
            TextMarkArray {
                marks: self.marks,
                text_len,
            },
            self.tables,
        )
    }

    fn push_joiner(&mut self, s: &str) {
        self.marks.push(TextMark::joiner(s, self.text.len()));
        self.text.push_str(s);
    }

    fn push_word(&mut self, word: &Word) {
        for mark in word.marks() {
            self.push_mark(mark);
        }
    }

    fn push_mark(&mut self, mark: &Mark) {
        self.marks.push(TextMark::from_mark(mark, self.text.len()));
        self.text.push_str(mark.text());
    }

    fn push_line(&mut self, line: &Line, strip_final_hyphen: bool) {
        let words = line.words();
        for (i, word) in words.iter().enumerate() {
            if i > 0 && word.new_word() {
                self.push_joiner(" ");
            }
            if strip_final_hyphen && i + 1 == words.len() {
                let marks = word.marks();
                for mark in &marks[..marks.len().saturating_sub(1)] {
                    self.push_mark(mark);
                }
            } else {
                self.push_word(word);
            }
        }
    }

    fn push_para_lines(&mut self, para: &Para) {
        let lines = para.lines();
        let mut joined = false;
        for (i, line) in lines.iter().enumerate() {
            if i > 0 && !joined {
                self.push_joiner("\n");
            }
            let strip = self.params.dehyphenate
                && line.hyphenated()
                && i + 1 < lines.len()
                && line.ends_with_hyphen_mark();
            self.push_line(line, strip);
            joined = strip;
        }
    }

    fn push_table(&mut self, para: &Para) {
        let table = para.table().expect("caller checked");
        let cell_sep = self.params.table_cell_sep.clone();
        let row_sep = self.params.table_row_sep.clone();
        let mut cells = Vec::with_capacity(table.cells().len());
        for y in 0..table.height() {
            if y > 0 {
                self.push_joiner(&row_sep);
            }
            for x in 0..table.width() {
                if x > 0 {
                    self.push_joiner(&cell_sep);
                }
                let cell = table.cell(x, y).expect("grid is rectangular");
                let start = self.marks.len();
                self.push_para_lines(cell);
                cells.push(TableCell {
                    text: cell.text(),
                    bbox: cell.bbox(),
                    marks: start..self.marks.len(),
                });
            }
        }
        self.tables.push(TableView {
            w: table.width(),
            h: table.height(),
            bbox: table.bbox(),
            cells,
        });
    }

    /// Whether two consecutive paragraphs sit at roughly the same depth, in
    /// which case a space joins them instead of a paragraph break.
    fn same_band(&self, a: &Para, b: &Para) -> bool {
        let tol = self.params.line_depth_r * a.fontsize().min(b.fontsize());
        (a.depth(self.page_top) - b.depth(self.page_top)).abs() <= tol
    }

    fn build(&mut self, paras: &[Para]) {
        if paras.is_empty() {
            return;
        }
        for (i, para) in paras.iter().enumerate() {
            if i > 0 {
                if self.same_band(&paras[i - 1], para) {
                    self.push_joiner(" ");
                } else {
                    self.push_joiner("\n\n");
                }
            }
            if para.table().is_some() {
                self.push_table(para);
            } else {
                self.push_para_lines(para);
            }
        }
        self.push_joiner("\n\n");
    }
}
