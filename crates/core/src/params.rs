//! Extraction tuning parameters.
//!
//! Contains the ExtractParams struct controlling word fragmentation, region
//! growing, line assembly, table detection, and view serialization.

/// Tuning parameters for page extraction.
///
/// Thresholds suffixed `_r` are expressed as multiples of the current font
/// size; the rest are absolute PDF points or counts. The defaults are the
/// documented values; callers may adjust them at build time, never during an
/// extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractParams {
    /// Height of one depth bin in the word bag, in PDF points.
    pub depth_bin_points: f64,

    /// Half-height of the depth band scanned for words on the same line,
    /// relative to the line's font size.
    pub line_depth_r: f64,

    /// Reading-axis gap at or above which two marks belong to different word
    /// fragments. Relative to font size.
    pub max_word_advance_r: f64,

    /// Largest backward (kerning) shift tolerated inside one word fragment.
    /// Relative to font size.
    pub max_kerning_r: f64,

    /// Largest depth difference tolerated between marks of one word
    /// fragment. Relative to font size.
    pub max_leading_r: f64,

    /// Font size agreement required to absorb a fragment into the previous
    /// word of a line. Relative to font size.
    pub max_intra_word_font_tol_r: f64,

    /// Depth margin around a paragraph region when pulling words in
    /// vertically. Relative to the region's font size.
    pub max_intra_depth_gap_r: f64,

    /// Font size tolerance for vertical region growth. Relative to the
    /// region's font size.
    pub max_intra_depth_font_tol_r: f64,

    /// Reading-axis margin around a paragraph region when pulling words in
    /// horizontally. Relative to the region's font size.
    pub max_intra_reading_gap_r: f64,

    /// Font size tolerance for horizontal region growth. Relative to the
    /// region's font size.
    pub max_intra_reading_font_tol: f64,

    /// Reading-axis window to the left of a region scanned for list-marker
    /// words. Relative to the region's font size.
    pub min_inter_reading_gap_r: f64,

    /// Font size tolerance for the list-marker scan. Relative to the
    /// region's font size.
    pub min_inter_reading_font_tol: f64,

    /// Largest reading-axis gap between a line's rightmost word and the next
    /// word appended to it. Relative to font size.
    pub max_intra_word_gap_r: f64,

    /// Largest reading-axis overlap tolerated between consecutive words of a
    /// line. Relative to font size.
    pub max_intra_line_overlap_r: f64,

    /// Reading-axis gap at or above which two fragments of a line are
    /// separate words. Relative to font size.
    pub max_intra_line_gap_r: f64,

    /// Duplicate fragments closer than this fraction of the line's average
    /// character width are dropped (fake-bold suppression).
    pub max_duplicate_word_r: f64,

    /// Radius within which a diacritic mark combines with its base
    /// character, relative to the larger of the base's width and height.
    pub diacritic_radius_r: f64,

    /// Minimum rune count before a line ending in a hyphen is flagged
    /// hyphenated.
    pub min_hyphenation: usize,

    /// Join hyphen-wrapped words across lines in the text view, dropping
    /// the wrap hyphen. Off by default: the flag on each line is
    /// informational unless a caller opts in.
    pub dehyphenate: bool,

    /// Depth range scanned below a seed bin for the first-reading word,
    /// relative to the seed's font size.
    pub top_word_range_r: f64,

    /// Whether to run the table detector.
    pub detect_tables: bool,

    /// Minimum number of cells a detected table must have.
    pub min_table_paras: usize,

    /// Rounding granularity of mark orientations, in degrees.
    pub orientation_granularity: i32,

    /// Separator between cells of a table row in the text view.
    pub table_cell_sep: String,

    /// Separator between rows of a table in the text view.
    pub table_row_sep: String,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            depth_bin_points: 6.0,
            line_depth_r: 0.5,
            max_word_advance_r: 0.11,
            max_kerning_r: 0.19,
            max_leading_r: 0.04,
            max_intra_word_font_tol_r: 0.04,
            max_intra_depth_gap_r: 1.0,
            max_intra_depth_font_tol_r: 0.04,
            max_intra_reading_gap_r: 0.4,
            max_intra_reading_font_tol: 0.7,
            min_inter_reading_gap_r: 1.0,
            min_inter_reading_font_tol: 0.1,
            max_intra_word_gap_r: 1.4,
            max_intra_line_overlap_r: 0.46,
            max_intra_line_gap_r: 0.02,
            max_duplicate_word_r: 0.2,
            diacritic_radius_r: 0.5,
            min_hyphenation: 4,
            dehyphenate: false,
            top_word_range_r: 4.0,
            detect_tables: true,
            min_table_paras: 6,
            orientation_granularity: 10,
            table_cell_sep: " ".to_string(),
            table_row_sep: "\n".to_string(),
        }
    }
}

impl ExtractParams {
    /// Rounds a rotation angle in degrees to the orientation granularity.
    pub fn round_orientation(&self, angle_deg: f64) -> i32 {
        let gran = f64::from(self.orientation_granularity);
        let rounded = (angle_deg / gran).round() * gran;
        (rounded as i32).rem_euclid(360)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_rounding() {
        let params = ExtractParams::default();
        assert_eq!(params.round_orientation(0.0), 0);
        assert_eq!(params.round_orientation(4.9), 0);
        assert_eq!(params.round_orientation(5.1), 10);
        assert_eq!(params.round_orientation(89.7), 90);
        assert_eq!(params.round_orientation(358.0), 0);
        assert_eq!(params.round_orientation(271.2), 270);
    }
}
