//! Paragraphs: assembled lines, optionally carrying a detected table.

use crate::params::ExtractParams;
use crate::utils::{rect_union, HasBBox, Rect};

use super::bag::WordBag;
use super::line::{compose_lines, Line};

/// A rectangular block of lines in reading order.
///
/// After table detection a paragraph may instead wrap a [`Table`]; the
/// table's cells are paragraphs that were absorbed out of the page list.
#[derive(Debug, Clone)]
pub struct Para {
    bbox: Rect,
    /// Horizontal extent widened into empty space; used only for reading
    /// order. Mirrors `bbox` until the sorter computes it.
    pub(crate) extended: Rect,
    lines: Vec<Line>,
    table: Option<Table>,
    /// Set once the paragraph has been absorbed as a table cell.
    pub(crate) is_cell: bool,
}

impl Para {
    /// Arranges a paragraph region's fragments into lines.
    pub fn compose(mut region: WordBag, params: &ExtractParams) -> Option<Self> {
        let lines = compose_lines(&mut region, params);
        let bbox = lines
            .iter()
            .map(HasBBox::bbox)
            .reduce(rect_union)?;
        Some(Self {
            bbox,
            extended: bbox,
            lines,
            table: None,
            is_cell: false,
        })
    }

    /// Wraps a detected table in a synthetic paragraph.
    pub fn from_table(table: Table) -> Self {
        let bbox = table.bbox;
        Self {
            bbox,
            extended: bbox,
            lines: Vec::new(),
            table: Some(table),
            is_cell: false,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub const fn is_cell(&self) -> bool {
        self.is_cell
    }

    /// Depth of the paragraph's first line.
    pub fn depth(&self, page_top: f64) -> f64 {
        self.lines
            .first()
            .map_or_else(|| page_top - self.bbox.1, Line::depth)
    }

    /// Largest font size over the paragraph's lines.
    pub fn fontsize(&self) -> f64 {
        self.lines
            .iter()
            .map(Line::fontsize)
            .fold(0.0_f64, f64::max)
    }

    /// The paragraph's text, lines joined by newlines.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&line.text());
        }
        out
    }
}

impl HasBBox for Para {
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

/// A grid of paragraph cells, row-major: `cells[y * w + x]`, rows top to
/// bottom, cells left to right.
#[derive(Debug, Clone)]
pub struct Table {
    pub(crate) bbox: Rect,
    pub(crate) w: usize,
    pub(crate) h: usize,
    pub(crate) cells: Vec<Para>,
}

impl Table {
    pub const fn width(&self) -> usize {
        self.w
    }

    pub const fn height(&self) -> usize {
        self.h
    }

    /// The cell at grid position (x, y).
    pub fn cell(&self, x: usize, y: usize) -> Option<&Para> {
        if x < self.w && y < self.h {
            self.cells.get(y * self.w + x)
        } else {
            None
        }
    }

    pub fn cells(&self) -> &[Para] {
        &self.cells
    }
}

impl HasBBox for Table {
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
