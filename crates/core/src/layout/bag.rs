//! Depth-binned container of word fragments.
//!
//! A word bag buckets fragments by integer depth bin
//! (`floor(depth / depth_bin_points)`) and keeps each bin sorted by
//! reading-axis position. The paragraph region finder drains a page-scope
//! bag into per-region bags via band scans; line assembly then drains each
//! region bag top-to-bottom.

use std::collections::BTreeMap;

use crate::params::ExtractParams;
use crate::utils::{HasBBox, Rect, INF_F64, TOL};

use super::word::Word;

/// Depth-binned set of word fragments.
#[derive(Debug, Clone)]
pub struct WordBag {
    bbox: Option<Rect>,
    fontsize: f64,
    bins: BTreeMap<i32, Vec<Word>>,
    page_top: f64,
    depth_bin_points: f64,
}

impl WordBag {
    /// An empty bag for a page whose top edge is at `page_top`.
    pub fn new(page_top: f64, params: &ExtractParams) -> Self {
        Self {
            bbox: None,
            fontsize: 0.0,
            bins: BTreeMap::new(),
            page_top,
            depth_bin_points: params.depth_bin_points,
        }
    }

    /// A bag holding every fragment of one orientation bucket.
    pub fn from_words(
        words: impl IntoIterator<Item = Word>,
        page_top: f64,
        params: &ExtractParams,
    ) -> Self {
        let mut bag = Self::new(page_top, params);
        for word in words {
            bag.add_word(word);
        }
        bag
    }

    /// A single-fragment bag seeding a new paragraph region.
    pub fn seeded(word: Word, page_top: f64, params: &ExtractParams) -> Self {
        let mut bag = Self::new(page_top, params);
        bag.add_word(word);
        bag
    }

    fn depth_idx(&self, depth: f64) -> i32 {
        (depth / self.depth_bin_points).floor() as i32
    }

    /// Inserts a fragment into its depth bin, keeping the bin sorted by
    /// reading-axis position.
    pub fn add_word(&mut self, word: Word) {
        self.bbox = Some(match self.bbox {
            Some(b) => crate::utils::rect_union(b, word.bbox()),
            None => word.bbox(),
        });
        self.fontsize = self.fontsize.max(word.fontsize());
        let idx = self.depth_idx(word.depth());
        let bin = self.bins.entry(idx).or_default();
        let pos = bin.partition_point(|w| w.x0() <= word.x0());
        bin.insert(pos, word);
    }

    /// Largest font size over the contained fragments.
    pub const fn fontsize(&self) -> f64 {
        self.fontsize
    }

    pub const fn page_top(&self) -> f64 {
        self.page_top
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.bins.values().map(Vec::len).sum()
    }

    /// Smallest depth over the contained fragments (top edge of the bag).
    pub fn min_depth(&self) -> f64 {
        self.bbox.map_or(0.0, |b| self.page_top - b.3)
    }

    /// Largest depth over the contained fragments (bottom edge of the bag).
    pub fn max_depth(&self) -> f64 {
        self.bbox.map_or(0.0, |b| self.page_top - b.1)
    }

    /// Index of the shallowest non-empty bin.
    pub fn first_bin_index(&self) -> Option<i32> {
        self.bins.keys().next().copied()
    }

    /// The bin, at or below `bin0`, whose leftmost word starts first in
    /// reading order within `top_word_range_r` font sizes of `bin0`'s top.
    ///
    /// Near-ties on reading position go to the larger font, so a superscript
    /// sharing the left margin with its body line does not win the seed.
    pub fn first_reading_index(&self, bin0: i32, params: &ExtractParams) -> i32 {
        let Some(first) = self.bins.get(&bin0).and_then(|b| b.first()) else {
            return bin0;
        };
        let max_depth =
            f64::from(bin0 + 1) * self.depth_bin_points + params.top_word_range_r * first.fontsize();

        let mut best_idx = bin0;
        let mut best_x0 = first.x0();
        let mut best_fontsize = first.fontsize();
        for (&idx, bin) in self.bins.range(bin0 + 1..) {
            let word = match bin.first() {
                Some(w) => w,
                None => continue,
            };
            if word.depth() > max_depth {
                break;
            }
            if word.x0() < best_x0 - TOL
                || ((word.x0() - best_x0).abs() <= TOL && word.fontsize() > best_fontsize)
            {
                best_idx = idx;
                best_x0 = word.x0();
                best_fontsize = word.fontsize();
            }
        }
        best_idx
    }

    /// Removes and returns the leftmost word of the given bin, dropping the
    /// bin when it empties.
    pub fn take_first_word(&mut self, bin_idx: i32) -> Option<Word> {
        let bin = self.bins.get_mut(&bin_idx)?;
        if bin.is_empty() {
            return None;
        }
        let word = bin.remove(0);
        if bin.is_empty() {
            self.bins.remove(&bin_idx);
        }
        Some(word)
    }

    /// Removes and returns the best word in the given depth window whose
    /// reading-axis gap from `right_edge` lies in `(min_gap, max_gap]`,
    /// preferring the leftmost candidate.
    ///
    /// Used by line assembly to extend a line rightward.
    pub fn take_line_word(
        &mut self,
        min_depth: f64,
        max_depth: f64,
        right_edge: f64,
        min_gap: f64,
        max_gap: f64,
    ) -> Option<Word> {
        let mut best: Option<(i32, usize, f64)> = None;
        for (&idx, bin) in &self.bins {
            for (pos, word) in bin.iter().enumerate() {
                if word.depth() < min_depth || word.depth() > max_depth {
                    continue;
                }
                let gap = word.x0() - right_edge;
                if gap <= min_gap || gap > max_gap {
                    continue;
                }
                if best.map_or(true, |(_, _, x0)| word.x0() < x0) {
                    best = Some((idx, pos, word.x0()));
                }
                // Bins are sorted by x0; the first candidate in a bin is
                // the leftmost one it can offer.
                break;
            }
        }
        let (idx, pos, _) = best?;
        let bin = self.bins.get_mut(&idx).expect("candidate bin exists");
        let word = bin.remove(pos);
        if bin.is_empty() {
            self.bins.remove(&idx);
        }
        Some(word)
    }

    /// Removes and returns a fragment in the depth window whose text equals
    /// `text` and whose reading position is within `threshold` of `x0`.
    ///
    /// Such fragments are rendered twice at a sub-character offset to fake
    /// bold type; line assembly drops them.
    pub fn take_duplicate(
        &mut self,
        min_depth: f64,
        max_depth: f64,
        text: &str,
        x0: f64,
        threshold: f64,
    ) -> Option<Word> {
        if threshold <= 0.0 {
            return None;
        }
        let mut found: Option<(i32, usize)> = None;
        'bins: for (&idx, bin) in &self.bins {
            for (pos, word) in bin.iter().enumerate() {
                if word.depth() < min_depth || word.depth() > max_depth {
                    continue;
                }
                if word.text() == text && (word.x0() - x0).abs() < threshold {
                    found = Some((idx, pos));
                    break 'bins;
                }
            }
        }
        let (idx, pos) = found?;
        let bin = self.bins.get_mut(&idx).expect("duplicate bin exists");
        let word = bin.remove(pos);
        if bin.is_empty() {
            self.bins.remove(&idx);
        }
        Some(word)
    }

    /// Scans fragments whose depth interval meets `[min_depth, max_depth]`
    /// and which satisfy `pred` against `region`, with an optional font-size
    /// tolerance relative to the region's font size.
    ///
    /// With `move_words` the matches are transferred into `region`, and
    /// unless `freeze_depth` is set the window grows to cover each absorbed
    /// word, so the scan repeats until it finds nothing new. Without
    /// `move_words` the scan only counts a single pass.
    ///
    /// Returns the number of matched words.
    pub fn scan_band<F>(
        &mut self,
        region: &mut WordBag,
        pred: F,
        mut min_depth: f64,
        mut max_depth: f64,
        font_tol: f64,
        move_words: bool,
        freeze_depth: bool,
    ) -> usize
    where
        F: Fn(&WordBag, &Word) -> bool,
    {
        let mut total = 0;
        loop {
            let fontsize = region.fontsize;
            let mut matched: Vec<(i32, usize)> = Vec::new();
            for (&idx, bin) in &self.bins {
                for (pos, word) in bin.iter().enumerate() {
                    let word_top = word.depth() - word.height();
                    if word.depth() < min_depth || word_top > max_depth {
                        continue;
                    }
                    if font_tol > 0.0
                        && fontsize > 0.0
                        && (word.fontsize() - fontsize).abs() > font_tol * fontsize
                    {
                        continue;
                    }
                    if !pred(region, word) {
                        continue;
                    }
                    matched.push((idx, pos));
                }
            }

            if !move_words {
                return matched.len();
            }
            if matched.is_empty() {
                return total;
            }
            total += matched.len();

            // Remove back-to-front so positions stay valid within a bin.
            for &(idx, pos) in matched.iter().rev() {
                let bin = self.bins.get_mut(&idx).expect("matched bin exists");
                let word = bin.remove(pos);
                if bin.is_empty() {
                    self.bins.remove(&idx);
                }
                if !freeze_depth {
                    min_depth = min_depth.min(word.depth() - word.height());
                    max_depth = max_depth.max(word.depth());
                }
                region.add_word(word);
            }
        }
    }

    /// Drains the bag into a vector, shallowest bin first, reading order
    /// within each bin.
    pub fn into_words(self) -> Vec<Word> {
        self.bins.into_values().flatten().collect()
    }

    /// Union bounding box, or None for an empty bag.
    pub fn bbox_opt(&self) -> Option<Rect> {
        self.bbox
    }
}

impl HasBBox for WordBag {
    fn x0(&self) -> f64 {
        self.bbox.map_or(INF_F64, |b| b.0)
    }
    fn y0(&self) -> f64 {
        self.bbox.map_or(INF_F64, |b| b.1)
    }
    fn x1(&self) -> f64 {
        self.bbox.map_or(-INF_F64, |b| b.2)
    }
    fn y1(&self) -> f64 {
        self.bbox.map_or(-INF_F64, |b| b.3)
    }
}
