//! Shared fixtures for integration tests: an in-memory resource dictionary,
//! a configurable fixed-metrics font, and content-op builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use lectern_core::{CharMetrics, ContentOp, Font, Form, Operand, Resources, XObjectKind};

/// A fixed-width test font with per-charcode overrides, for ligatures and
/// unusual metrics.
pub struct TestFont {
    name: String,
    width: f64,
    overrides: HashMap<u32, (String, f64)>,
}

impl TestFont {
    pub fn new(name: &str, width: f64) -> Self {
        Self {
            name: name.to_string(),
            width,
            overrides: HashMap::new(),
        }
    }

    /// Maps a charcode to a decoded string and advance width.
    pub fn with_mapping(mut self, code: u32, text: &str, width: f64) -> Self {
        self.overrides.insert(code, (text.to_string(), width));
        self
    }
}

impl Font for TestFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn bytes_to_charcodes(&self, bytes: &[u8]) -> Vec<u32> {
        bytes.iter().map(|&b| u32::from(b)).collect()
    }

    fn charcodes_to_strings(&self, codes: &[u32]) -> (Vec<String>, usize, usize) {
        let mut out = Vec::with_capacity(codes.len());
        let mut misses = 0;
        for &code in codes {
            if let Some((text, _)) = self.overrides.get(&code) {
                out.push(text.clone());
            } else if let Some(r) = char::from_u32(code).filter(|c| !c.is_control()) {
                out.push(r.to_string());
            } else {
                misses += 1;
                out.push('\u{FFFD}'.to_string());
            }
        }
        (out, codes.len(), misses)
    }

    fn char_metrics(&self, code: u32) -> Option<CharMetrics> {
        let wx = self
            .overrides
            .get(&code)
            .map_or(self.width, |(_, w)| *w);
        Some(CharMetrics { wx, wy: 0.0 })
    }

    fn rune_metrics(&self, _r: char) -> Option<CharMetrics> {
        Some(CharMetrics {
            wx: self.width,
            wy: 0.0,
        })
    }

    fn charcode_to_rune(&self, code: u32) -> Option<char> {
        match self.overrides.get(&code) {
            Some((text, _)) => text.chars().next(),
            None => char::from_u32(code),
        }
    }
}

/// An in-memory resource dictionary.
#[derive(Default)]
pub struct TestResources {
    fonts: HashMap<String, Arc<dyn Font>>,
    forms: HashMap<String, Form>,
}

impl TestResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, name: &str, font: impl Font + 'static) -> Self {
        self.fonts.insert(name.to_string(), Arc::new(font));
        self
    }

    pub fn with_form(mut self, name: &str, form: Form) -> Self {
        self.forms.insert(name.to_string(), form);
        self
    }
}

impl Resources for TestResources {
    fn get_font(&self, name: &str) -> Option<Arc<dyn Font>> {
        self.fonts.get(name).cloned()
    }

    fn get_xobject(&self, name: &str) -> Option<XObjectKind> {
        if self.forms.contains_key(name) {
            Some(XObjectKind::Form)
        } else {
            None
        }
    }

    fn get_form(&self, name: &str) -> Option<Form> {
        self.forms.get(name).cloned()
    }
}

/// US Letter media box.
pub const MEDIA: (f64, f64, f64, f64) = (0.0, 0.0, 612.0, 792.0);

pub fn op(name: &str, operands: Vec<Operand>) -> ContentOp {
    ContentOp::new(name, operands)
}

pub fn int(v: i64) -> Operand {
    Operand::Int(v)
}

pub fn real(v: f64) -> Operand {
    Operand::Real(v)
}

pub fn name(v: &str) -> Operand {
    Operand::Name(v.to_string())
}

pub fn string(v: &[u8]) -> Operand {
    Operand::String(v.to_vec())
}

/// A complete text object: `BT /font size Tf x y Td (text) Tj ET`.
pub fn text_object(font: &str, size: f64, x: f64, y: f64, text: &[u8]) -> Vec<ContentOp> {
    vec![
        op("BT", vec![]),
        op("Tf", vec![name(font), real(size)]),
        op("Td", vec![real(x), real(y)]),
        op("Tj", vec![string(text)]),
        op("ET", vec![]),
    ]
}
