//! Paragraph region finding: dividing a page's words into rectangular
//! regions of connected text.
//!
//! Works on one orientation bucket at a time. Each region starts from the
//! earliest word in reading order, then alternates vertical and horizontal
//! band scans until no nearby word qualifies. A final pass decides whether
//! stray words just left of the region (list markers, hanging numbers) are
//! part of it or belong to a region of their own.

use crate::params::ExtractParams;
use crate::utils::HasBBox;

use super::bag::WordBag;
use super::word::Word;

/// Whether `word`'s reading-axis interval meets the region's, allowing a
/// margin of `gap` on both sides.
fn reading_overlap(region: &WordBag, word: &Word, gap: f64) -> bool {
    word.x1() >= region.x0() - gap && word.x0() <= region.x1() + gap
}

/// Whether `word` sits to the left of the region within `gap`, overlapping
/// it in depth.
fn reading_overlap_left(region: &WordBag, word: &Word, gap: f64) -> bool {
    let lead = region.x0() - word.x1();
    if !(0.0..=gap).contains(&lead) {
        return false;
    }
    let word_top = word.depth() - word.height();
    word.depth() >= region.min_depth() && word_top <= region.max_depth()
}

/// Splits one orientation bucket of word fragments into paragraph regions.
pub fn divide(words: Vec<Word>, page_top: f64, params: &ExtractParams) -> Vec<WordBag> {
    let mut bag = WordBag::from_words(words, page_top, params);
    let mut regions: Vec<WordBag> = Vec::new();

    while let Some(bin0) = bag.first_bin_index() {
        let seed_bin = bag.first_reading_index(bin0, params);
        let seed = bag
            .take_first_word(seed_bin)
            .expect("first_reading_index returned a non-empty bin");
        let mut region = WordBag::seeded(seed, page_top, params);

        loop {
            let fontsize = region.fontsize();
            let depth_gap = params.max_intra_depth_gap_r * fontsize;
            // A full em of reading margin: continuation lines of a paragraph
            // align only loosely, and monospaced spaces run 0.6 em wide.
            let reading_margin = params.min_inter_reading_gap_r * fontsize;

            // Vertical growth: words above or below the region that overlap
            // it along the reading axis. The window follows the region as it
            // grows.
            let min_depth = region.min_depth() - depth_gap;
            let max_depth = region.max_depth() + depth_gap;
            let n_vertical = bag.scan_band(
                &mut region,
                |r, w| reading_overlap(r, w, reading_margin),
                min_depth,
                max_depth,
                params.max_intra_depth_font_tol_r,
                true,
                false,
            );

            // Horizontal growth: words at similar depth just beyond the
            // region's left or right edge.
            let fontsize = region.fontsize();
            let reading_gap = params.max_intra_reading_gap_r * fontsize;
            let min_depth = region.min_depth();
            let max_depth = region.max_depth();
            let n_horizontal = bag.scan_band(
                &mut region,
                |r, w| reading_overlap(r, w, reading_gap),
                min_depth,
                max_depth,
                params.max_intra_reading_font_tol,
                true,
                true,
            );

            if n_vertical + n_horizontal == 0 {
                break;
            }
        }

        // Words hanging just left of the region: list markers, citation
        // numbers. A sparse column is absorbed; a dense one (a real column
        // of text) is left for its own region.
        let fontsize = region.fontsize();
        let left_gap = params.min_inter_reading_gap_r * fontsize;
        let min_depth = region.min_depth();
        let max_depth = region.max_depth();
        let n_left = bag.scan_band(
            &mut region,
            |r, w| reading_overlap_left(r, w, left_gap),
            min_depth,
            max_depth,
            params.min_inter_reading_font_tol,
            false,
            true,
        );
        if n_left > 0 {
            let rows = (max_depth - min_depth) / fontsize.max(f64::MIN_POSITIVE);
            if (n_left as f64) < 5.0 || (n_left as f64) < 0.3 * rows {
                bag.scan_band(
                    &mut region,
                    |r, w| reading_overlap_left(r, w, left_gap),
                    min_depth,
                    max_depth,
                    params.min_inter_reading_font_tol,
                    true,
                    true,
                );
            }
        }

        regions.push(region);
    }

    regions
}
