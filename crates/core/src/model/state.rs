//! Text and graphics state carried by the content-stream interpreter.

use std::sync::Arc;

use crate::font::Font;
use crate::utils::{Matrix, MATRIX_IDENTITY};

/// Color value tracked for marks.
///
/// Only the device color models matter to text extraction; pattern and ICC
/// spaces degrade to whatever components their setters supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Greyscale (0.0 = black, 1.0 = white).
    Gray(f64),
    Rgb(f64, f64, f64),
    Cmyk(f64, f64, f64, f64),
}

impl Default for Color {
    fn default() -> Self {
        Color::Gray(0.0)
    }
}

impl Color {
    /// Numeric components in model order.
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Color::Gray(g) => vec![*g],
            Color::Rgb(r, g, b) => vec![*r, *g, *b],
            Color::Cmyk(c, m, y, k) => vec![*c, *m, *y, *k],
        }
    }

    /// Builds a color from loose components (SC/SCN-style operators):
    /// 1 component is gray, 3 is RGB, 4 is CMYK.
    pub fn from_components(values: &[f64]) -> Option<Self> {
        match values {
            [g] => Some(Color::Gray(*g)),
            [r, g, b] => Some(Color::Rgb(*r, *g, *b)),
            [c, m, y, k] => Some(Color::Cmyk(*c, *m, *y, *k)),
            _ => None,
        }
    }
}

/// Text state: positioning matrices and rendering parameters.
///
/// Saved and restored wholesale by `q`/`Q`, reset in part by `BT`.
#[derive(Clone)]
pub struct TextState {
    /// Current font, if a `Tf` has been seen.
    pub font: Option<Arc<dyn Font>>,
    /// Resource name the current font was selected under.
    pub font_name: Option<String>,
    /// Font size in text-space units.
    pub fontsize: f64,
    /// Character spacing (Tc).
    pub char_spacing: f64,
    /// Word spacing (Tw); applied to single-byte charcode 32 only.
    pub word_spacing: f64,
    /// Horizontal scaling percentage (Tz); 100 is unscaled.
    pub scaling: f64,
    /// Text leading (TL / TD), stored as set.
    pub leading: f64,
    /// Text rendering mode (Tr).
    pub render: i32,
    /// Text rise (Ts).
    pub rise: f64,
    /// Text matrix Tm.
    pub tm: Matrix,
    /// Text line matrix Tlm: the line-start cursor.
    pub tlm: Matrix,
    /// Set when a `Tf` named a font missing from the resources. Suppresses
    /// string rendering until the next `BT`.
    pub invalid_font: bool,
}

impl TextState {
    pub fn new() -> Self {
        Self {
            font: None,
            font_name: None,
            fontsize: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            scaling: 100.0,
            leading: 0.0,
            render: 0,
            rise: 0.0,
            tm: MATRIX_IDENTITY,
            tlm: MATRIX_IDENTITY,
            invalid_font: false,
        }
    }

    /// Resets the positioning matrices at the start of a text object.
    pub fn begin_text(&mut self) {
        self.tm = MATRIX_IDENTITY;
        self.tlm = MATRIX_IDENTITY;
        self.invalid_font = false;
    }

    /// Resets the positioning matrices at the end of a text object.
    pub fn end_text(&mut self) {
        self.tm = MATRIX_IDENTITY;
        self.tlm = MATRIX_IDENTITY;
    }

    /// Effective horizontal scale factor.
    pub fn hscale(&self) -> f64 {
        self.scaling * 0.01
    }
}

impl Default for TextState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextState")
            .field("font_name", &self.font_name)
            .field("fontsize", &self.fontsize)
            .field("char_spacing", &self.char_spacing)
            .field("word_spacing", &self.word_spacing)
            .field("scaling", &self.scaling)
            .field("leading", &self.leading)
            .field("render", &self.render)
            .field("rise", &self.rise)
            .field("tm", &self.tm)
            .field("tlm", &self.tlm)
            .field("invalid_font", &self.invalid_font)
            .finish()
    }
}

/// Graphics state: the colors tracked for subsequent marks.
#[derive(Debug, Clone, Default)]
pub struct GraphicState {
    /// Non-stroking (fill) color.
    pub fill_color: Color,
    /// Stroking color.
    pub stroke_color: Color,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_text_resets_matrices_and_font_flag() {
        let mut state = TextState::new();
        state.tm = (1.0, 0.0, 0.0, 1.0, 50.0, 60.0);
        state.tlm = state.tm;
        state.invalid_font = true;
        state.begin_text();
        assert_eq!(state.tm, MATRIX_IDENTITY);
        assert_eq!(state.tlm, MATRIX_IDENTITY);
        assert!(!state.invalid_font);
    }

    #[test]
    fn color_components() {
        assert_eq!(Color::from_components(&[0.5]), Some(Color::Gray(0.5)));
        assert_eq!(
            Color::from_components(&[1.0, 0.0, 0.0]),
            Some(Color::Rgb(1.0, 0.0, 0.0))
        );
        assert_eq!(Color::from_components(&[0.1, 0.2]), None);
        assert_eq!(Color::Cmyk(0.0, 0.1, 0.2, 0.3).to_vec().len(), 4);
    }
}
