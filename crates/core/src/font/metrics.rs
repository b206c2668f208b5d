//! Advance widths for the built-in fallback fonts.
//!
//! Glyph widths for the classic base fonts, in glyph space (per 1000
//! units), covering the printable ASCII range. These feed
//! [`BuiltinFont`](super::BuiltinFont) so a page whose resources are
//! missing a font still gets plausible advance geometry instead of
//! uniform boxes.

/// Widths for one standard font: printable ASCII 0x20..=0x7E, plus a
/// default for everything else.
#[derive(Debug)]
pub struct StandardMetrics {
    pub name: &'static str,
    /// Width used for charcodes outside the table.
    pub default_width: f64,
    /// Per-glyph widths indexed by `code - 0x20`, or None for a
    /// fixed-pitch font.
    widths: Option<&'static [u16; 95]>,
}

impl StandardMetrics {
    /// The advance width for a charcode, in glyph space.
    pub fn width(&self, code: u32) -> f64 {
        match self.widths {
            Some(table) if (0x20..=0x7E).contains(&code) => {
                f64::from(table[(code - 0x20) as usize])
            }
            _ => self.default_width,
        }
    }
}

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    // 0x20 space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0x30 digits and : ; < = > ?
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    // 0x40 @ A-O
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    // 0x50 P-Z [ \ ] ^ _
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    // 0x60 ` a-o
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    // 0x70 p-z { | } ~
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

static HELVETICA: StandardMetrics = StandardMetrics {
    name: "Helvetica",
    default_width: 556.0,
    widths: Some(&HELVETICA_WIDTHS),
};

static TIMES_ROMAN: StandardMetrics = StandardMetrics {
    name: "Times-Roman",
    default_width: 500.0,
    widths: Some(&TIMES_ROMAN_WIDTHS),
};

static COURIER: StandardMetrics = StandardMetrics {
    name: "Courier",
    default_width: 600.0,
    widths: None,
};

/// Metrics for a standard base font name. Bold/oblique variants share
/// their family's widths closely enough for extraction geometry.
pub fn standard_metrics(name: &str) -> Option<&'static StandardMetrics> {
    let family = name.rsplit('+').next().unwrap_or(name);
    let family = family.split(['-', ',']).next().unwrap_or(family);
    match family {
        "Helvetica" | "Arial" => Some(&HELVETICA),
        "Times" | "TimesNewRoman" => Some(&TIMES_ROMAN),
        "Courier" | "CourierNew" => Some(&COURIER),
        _ => None,
    }
}
