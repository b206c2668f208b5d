//! Line assembly within a paragraph region.
//!
//! Repeatedly pulls the top-left-most fragment out of a region's word bag,
//! extends rightward through the depth band of that seed, then merges
//! contiguous fragments into whole words, suppresses fake-bold duplicates,
//! and flags hyphenated line ends.

use crate::params::ExtractParams;
use crate::utils::{diff_depth_then_reading, rect_union, HasBBox, Rect};

use super::bag::WordBag;
use super::word::Word;

/// One assembled line of a paragraph: fragments merged into words, in
/// reading order.
#[derive(Debug, Clone)]
pub struct Line {
    bbox: Rect,
    /// Depth of the seed word's baseline.
    depth: f64,
    words: Vec<Word>,
    fontsize: f64,
    /// True when the line visually ends in a hyphen mid-word.
    hyphenated: bool,
}

impl Line {
    fn new(seed: Word) -> Self {
        Self {
            bbox: seed.bbox(),
            depth: seed.depth(),
            fontsize: seed.fontsize(),
            words: vec![seed],
            hyphenated: false,
        }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub const fn depth(&self) -> f64 {
        self.depth
    }

    pub const fn fontsize(&self) -> f64 {
        self.fontsize
    }

    pub const fn hyphenated(&self) -> bool {
        self.hyphenated
    }

    /// The line's text with spaces at word boundaries.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 && word.new_word() {
                out.push(' ');
            }
            out.push_str(word.text());
        }
        out
    }

    fn push(&mut self, word: Word) {
        self.bbox = rect_union(self.bbox, word.bbox());
        self.fontsize = self.fontsize.max(word.fontsize());
        self.words.push(word);
    }

    /// Average advance per rune over the line's words.
    fn mean_char_width(&self) -> f64 {
        let total_width: f64 = self.words.iter().map(HasBBox::width).sum();
        let total_runes: usize = self.words.iter().map(|w| w.text().chars().count()).sum();
        if total_runes == 0 {
            0.0
        } else {
            total_width / total_runes as f64
        }
    }

    /// Merges fragments into whole words and sets word-boundary flags.
    fn merge_fragments(&mut self, params: &ExtractParams) {
        let gap_threshold = params.max_intra_line_gap_r * self.fontsize;
        let mut merged: Vec<Word> = Vec::with_capacity(self.words.len());
        for mut word in std::mem::take(&mut self.words) {
            let Some(prev) = merged.last_mut() else {
                merged.push(word);
                continue;
            };
            let gap = word.x0() - prev.x1();
            if gap >= gap_threshold {
                word.new_word = true;
                merged.push(word);
            } else if (word.fontsize() - prev.fontsize()).abs()
                <= params.max_intra_word_font_tol_r * prev.fontsize().max(word.fontsize())
                && word.font_name() == prev.font_name()
            {
                prev.absorb(word);
            } else {
                // Font change inside a word (e.g. a bold initial); keep the
                // fragment separate without a space before it.
                merged.push(word);
            }
        }
        self.words = merged;
    }

    /// Whether the line's final mark is a lone hyphen that dehyphenation
    /// can drop.
    pub fn ends_with_hyphen_mark(&self) -> bool {
        self.words
            .last()
            .and_then(|w| w.marks().last())
            .map_or(false, |m| {
                let mut chars = m.text().chars();
                matches!((chars.next(), chars.next()), (Some(c), None) if is_hyphen(c))
            })
    }

    fn flag_hyphenation(&mut self, params: &ExtractParams) {
        let text = self.text();
        let runes: Vec<char> = text.chars().collect();
        if runes.len() < params.min_hyphenation {
            return;
        }
        let last = runes[runes.len() - 1];
        let penultimate = runes[runes.len() - 2];
        self.hyphenated = is_hyphen(last) && !penultimate.is_whitespace();
    }
}

impl HasBBox for Line {
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

fn is_hyphen(c: char) -> bool {
    matches!(
        c,
        '-' | '\u{00AD}' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}'
    )
}

/// Drains a paragraph region's bag into lines, top to bottom.
pub fn compose_lines(region: &mut WordBag, params: &ExtractParams) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();

    while let Some(bin0) = region.first_bin_index() {
        let seed_bin = region.first_reading_index(bin0, params);
        let seed = region
            .take_first_word(seed_bin)
            .expect("first_reading_index returned a non-empty bin");
        let depth = seed.depth();
        let fontsize = seed.fontsize();
        let mut line = Line::new(seed);

        let min_depth = depth - params.line_depth_r * fontsize;
        let max_depth = depth + params.line_depth_r * fontsize;
        loop {
            // Fake-bold duplicates of the rightmost word sit almost exactly
            // on top of it, inside the overlap bound; drop them first.
            let threshold = params.max_duplicate_word_r * line.mean_char_width();
            loop {
                let last = line.words.last().expect("line has a seed");
                let (text, x0) = (last.text().to_string(), last.x0());
                if region
                    .take_duplicate(min_depth, max_depth, &text, x0, threshold)
                    .is_none()
                {
                    break;
                }
            }

            let right_edge = line.words.last().expect("line has a seed").x1();
            let candidate = region.take_line_word(
                min_depth,
                max_depth,
                right_edge,
                -params.max_intra_line_overlap_r * fontsize,
                params.max_intra_word_gap_r * fontsize,
            );
            match candidate {
                Some(word) => line.push(word),
                None => break,
            }
        }

        line.merge_fragments(params);
        line.flag_hyphenation(params);
        lines.push(line);
    }

    lines.sort_by(|a, b| diff_depth_then_reading(a, b));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::mark::Mark;

    const PAGE_TOP: f64 = 792.0;

    fn word(text: &str, x0: f64, y0: f64, w: f64, h: f64) -> Word {
        let mark = Mark::builder((x0, y0, x0 + w, y0 + h), text, "Courier", h).build();
        Word::new(mark, PAGE_TOP)
    }

    fn region_of(words: Vec<Word>) -> WordBag {
        WordBag::from_words(words, PAGE_TOP, &ExtractParams::default())
    }

    #[test]
    fn words_on_one_baseline_form_one_line() {
        let params = ExtractParams::default();
        let mut region = region_of(vec![
            word("Line", 10.0, 200.0, 28.8, 12.0),
            word("one", 46.0, 200.0, 21.6, 12.0),
        ]);
        let lines = compose_lines(&mut region, &params);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "Line one");
        assert!(region.is_empty());
    }

    #[test]
    fn separate_baselines_form_separate_lines_in_depth_order() {
        let params = ExtractParams::default();
        let mut region = region_of(vec![
            word("second", 10.0, 186.0, 43.2, 12.0),
            word("first", 10.0, 200.0, 36.0, 12.0),
        ]);
        let lines = compose_lines(&mut region, &params);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "first");
        assert_eq!(lines[1].text(), "second");
    }

    #[test]
    fn contiguous_fragments_merge_into_one_word() {
        let params = ExtractParams::default();
        // "Hel" and "lo" abut exactly: gap 0 < 0.02 * fontsize.
        let mut region = region_of(vec![
            word("Hel", 10.0, 200.0, 21.6, 12.0),
            word("lo", 31.6, 200.0, 14.4, 12.0),
        ]);
        let lines = compose_lines(&mut region, &params);
        assert_eq!(lines[0].words().len(), 1);
        assert_eq!(lines[0].text(), "Hello");
    }

    #[test]
    fn gap_marks_word_boundary() {
        let params = ExtractParams::default();
        let mut region = region_of(vec![
            word("two", 10.0, 200.0, 21.6, 12.0),
            word("words", 38.8, 200.0, 36.0, 12.0),
        ]);
        let lines = compose_lines(&mut region, &params);
        assert_eq!(lines[0].words().len(), 2);
        assert!(lines[0].words()[1].new_word());
        assert_eq!(lines[0].text(), "two words");
    }

    #[test]
    fn reading_positions_non_decreasing_within_line() {
        let params = ExtractParams::default();
        let mut region = region_of(vec![
            word("c", 40.0, 200.0, 7.2, 12.0),
            word("a", 10.0, 200.0, 7.2, 12.0),
            word("b", 25.0, 200.0, 7.2, 12.0),
        ]);
        let lines = compose_lines(&mut region, &params);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].words().len(), 3);
        let xs: Vec<f64> = lines[0].words().iter().map(HasBBox::x0).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn fake_bold_duplicate_is_dropped() {
        let params = ExtractParams::default();
        let mut region = region_of(vec![
            word("Bold", 10.0, 200.0, 28.8, 12.0),
            word("Bold", 10.4, 200.0, 28.8, 12.0),
        ]);
        let lines = compose_lines(&mut region, &params);
        assert_eq!(lines[0].text(), "Bold");
    }

    #[test]
    fn hyphenated_line_end_is_flagged() {
        let params = ExtractParams::default();
        let mut region = region_of(vec![word("exam-", 10.0, 200.0, 36.0, 12.0)]);
        let lines = compose_lines(&mut region, &params);
        assert!(lines[0].hyphenated());

        // Too short to count as a hyphenated word wrap.
        let mut region = region_of(vec![word("a-", 10.0, 200.0, 14.4, 12.0)]);
        let lines = compose_lines(&mut region, &params);
        assert!(!lines[0].hyphenated());
    }
}
