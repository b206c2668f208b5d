//! Word fragments and the mark-to-fragment grouper.
//!
//! A word fragment is a run of marks rendered contiguously, without a
//! space-sized gap, a kerning jump, or a leading shift between them. Spacing
//! marks never survive into fragments; the view layer re-inserts spaces from
//! word-boundary flags instead. Diacritics are folded into their base
//! character here, at fragmentation time, so bounding boxes stay consistent
//! through the rest of the pipeline.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::params::ExtractParams;
use crate::utils::{gap_reading, rect_union, HasBBox, Rect};

use super::mark::Mark;

/// Spacing diacritics and the combining form each one folds into.
///
/// Modifier symbols (Unicode Sk) and spacing clones of combining marks do
/// not carry the Mn general category, so the class check alone misses them.
static COMBINING_FORMS: Lazy<FxHashMap<char, char>> = Lazy::new(|| {
    [
        ('\u{0060}', '\u{0300}'), // grave accent
        ('\u{00B4}', '\u{0301}'), // acute accent
        ('\u{005E}', '\u{0302}'), // circumflex
        ('\u{02C6}', '\u{0302}'), // modifier circumflex
        ('\u{007E}', '\u{0303}'), // tilde
        ('\u{02DC}', '\u{0303}'), // small tilde
        ('\u{00AF}', '\u{0304}'), // macron
        ('\u{02D8}', '\u{0306}'), // breve
        ('\u{02D9}', '\u{0307}'), // dot above
        ('\u{00A8}', '\u{0308}'), // diaeresis
        ('\u{02DA}', '\u{030A}'), // ring above
        ('\u{02DD}', '\u{030B}'), // double acute
        ('\u{02C7}', '\u{030C}'), // caron
        ('\u{00B8}', '\u{0327}'), // cedilla
        ('\u{02DB}', '\u{0328}'), // ogonek
    ]
    .into_iter()
    .collect()
});

/// The combining form of a mark's text when it is a lone diacritic:
/// either a spacing diacritic from the fixed table or a rune already in a
/// combining class.
pub fn combining_form(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    if let Some(&combining) = COMBINING_FORMS.get(&c) {
        return Some(combining);
    }
    if is_combining_mark(c) {
        return Some(c);
    }
    None
}

/// A sub-word chunk of marks rendered contiguously.
#[derive(Debug, Clone)]
pub struct Word {
    bbox: Rect,
    /// Distance of the fragment's bottom edge from the top of the page.
    depth: f64,
    text: String,
    marks: Vec<Mark>,
    /// Largest font size over the contained marks.
    fontsize: f64,
    /// Set during line assembly when this fragment begins a whole word.
    pub(crate) new_word: bool,
}

impl Word {
    /// Creates a fragment from its first mark.
    pub fn new(mark: Mark, page_top: f64) -> Self {
        let bbox = mark.bbox();
        Self {
            bbox,
            depth: page_top - bbox.1,
            text: mark.text().to_string(),
            fontsize: mark.fontsize(),
            marks: vec![mark],
            new_word: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub const fn depth(&self) -> f64 {
        self.depth
    }

    pub const fn fontsize(&self) -> f64 {
        self.fontsize
    }

    pub const fn new_word(&self) -> bool {
        self.new_word
    }

    pub fn font_name(&self) -> &str {
        self.marks.first().map_or("", Mark::font_name)
    }

    fn push_mark(&mut self, mark: Mark, page_top: f64) {
        self.bbox = rect_union(self.bbox, mark.bbox());
        self.depth = page_top - self.bbox.1;
        self.fontsize = self.fontsize.max(mark.fontsize());
        self.text.push_str(mark.text());
        self.marks.push(mark);
    }

    /// Absorbs a later fragment of the same line-word into this one.
    pub(crate) fn absorb(&mut self, other: Word) {
        self.bbox = rect_union(self.bbox, other.bbox);
        self.depth = self.depth.max(other.depth);
        self.fontsize = self.fontsize.max(other.fontsize);
        self.text.push_str(&other.text);
        self.marks.extend(other.marks);
    }

    fn rebuild_text(&mut self) {
        self.text = self.marks.iter().map(Mark::text).collect();
        self.bbox = self
            .marks
            .iter()
            .map(HasBBox::bbox)
            .reduce(rect_union)
            .unwrap_or(self.bbox);
    }

    fn is_blank(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

impl HasBBox for Word {
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

/// Whether `mark`'s box sits within the diacritic attachment radius of
/// `base`: center distance at most `diacritic_radius_r` times the larger of
/// the base's width and height.
fn within_diacritic_radius(base: &Mark, mark: &Mark, params: &ExtractParams) -> bool {
    let radius = params.diacritic_radius_r * base.width().max(base.height());
    let (bx, by) = (
        (base.x0() + base.x1()) / 2.0,
        (base.y0() + base.y1()) / 2.0,
    );
    let (mx, my) = (
        (mark.x0() + mark.x1()) / 2.0,
        (mark.y0() + mark.y1()) / 2.0,
    );
    (bx - mx).hypot(by - my) <= radius
}

enum Placement {
    /// Continue the open fragment.
    Append,
    /// Fold this diacritic mark into the previous base mark.
    TrailingDiacritic(char),
    /// This mark is the base for the diacritic that preceded it.
    LeadingDiacritic(char),
    /// Close the open fragment (if any) and start a new one.
    NewFragment,
}

fn place_mark(current: Option<&Word>, mark: &Mark, page_top: f64, params: &ExtractParams) -> Placement {
    let Some(word) = current else {
        return Placement::NewFragment;
    };
    let prev = word.marks.last().expect("open fragment has marks");
    let prev_combining = combining_form(prev.text());
    let mark_combining = combining_form(mark.text());

    if prev_combining.is_none() {
        if let Some(combining) = mark_combining {
            if within_diacritic_radius(prev, mark, params) {
                return Placement::TrailingDiacritic(combining);
            }
        }
    } else if mark_combining.is_none() {
        if let Some(combining) = prev_combining {
            if within_diacritic_radius(mark, prev, params) {
                return Placement::LeadingDiacritic(combining);
            }
        }
    }

    let fontsize = word.fontsize.max(f64::MIN_POSITIVE);
    let depth_gap = (page_top - mark.y0() - word.depth).abs() / fontsize;
    let reading_gap = gap_reading(mark, word) / fontsize;

    if reading_gap >= params.max_word_advance_r
        || reading_gap < -params.max_kerning_r
        || depth_gap > params.max_leading_r
    {
        Placement::NewFragment
    } else {
        Placement::Append
    }
}

fn close_fragment(current: &mut Option<Word>, words: &mut Vec<Word>) {
    if let Some(word) = current.take() {
        if !word.is_blank() {
            words.push(word);
        }
    }
}

/// Groups one orientation bucket of marks into word fragments, in stream
/// order.
pub fn make_words(marks: Vec<Mark>, page_top: f64, params: &ExtractParams) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    let mut current: Option<Word> = None;

    for mark in marks {
        if mark.is_whitespace() {
            close_fragment(&mut current, &mut words);
            continue;
        }

        match place_mark(current.as_ref(), &mark, page_top, params) {
            Placement::Append => {
                current
                    .as_mut()
                    .expect("append implies open fragment")
                    .push_mark(mark, page_top);
            }
            Placement::TrailingDiacritic(combining) => {
                let word = current.as_mut().expect("open fragment");
                let last = word.marks.last_mut().expect("open fragment has marks");
                let combined: String = format!("{}{}", last.text(), combining).nfkc().collect();
                last.absorb_diacritic(combined, mark.bbox());
                word.rebuild_text();
            }
            Placement::LeadingDiacritic(combining) => {
                let word = current.as_mut().expect("open fragment");
                let last = word.marks.last_mut().expect("open fragment has marks");
                let combined: String = format!("{}{}", mark.text(), combining).nfkc().collect();
                let diacritic_bbox = last.bbox();
                *last = mark;
                last.absorb_diacritic(combined, diacritic_bbox);
                word.rebuild_text();
            }
            Placement::NewFragment => {
                close_fragment(&mut current, &mut words);
                current = Some(Word::new(mark, page_top));
            }
        }
    }

    close_fragment(&mut current, &mut words);
    words
}
