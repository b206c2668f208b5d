//! Font interface consumed by the interpreter.
//!
//! Font decoding lives outside the engine; this module defines the contract
//! a font object must satisfy ([`Font`]), a built-in fallback with standard
//! base-font metrics used when a resource dictionary is missing a font, and
//! the small per-document LRU cache for decoded fonts.

pub mod metrics;

pub use metrics::{standard_metrics, StandardMetrics};

use std::sync::Arc;

/// Glyph advance widths in glyph space (per 1000 units).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharMetrics {
    pub wx: f64,
    pub wy: f64,
}

/// Contract the interpreter consumes from an external font object.
///
/// Implementations are shared as `Arc<dyn Font>`; all methods take `&self`
/// and must be safe to call from multiple page workers at once.
pub trait Font: Send + Sync {
    /// Font name, for diagnostics and position records.
    fn name(&self) -> &str;

    /// Splits raw string-operand bytes into charcodes.
    fn bytes_to_charcodes(&self, bytes: &[u8]) -> Vec<u32>;

    /// Decodes charcodes to text, one string per charcode (a ligature
    /// charcode may decode to several runes). Returns the decoded strings,
    /// the number of charcodes seen, and the number that had no mapping.
    /// Unmapped charcodes decode to U+FFFD.
    fn charcodes_to_strings(&self, codes: &[u32]) -> (Vec<String>, usize, usize);

    /// Advance metrics for a charcode, or None when the font carries no
    /// width entry for it.
    fn char_metrics(&self, code: u32) -> Option<CharMetrics>;

    /// Advance metrics for a rune, where the encoding supports the reverse
    /// lookup.
    fn rune_metrics(&self, r: char) -> Option<CharMetrics>;

    /// The rune a charcode maps to, when the mapping is 1:1.
    fn charcode_to_rune(&self, code: u32) -> Option<char>;
}

/// A simple Latin font: one byte per charcode, one rune per byte, widths
/// from a standard base-font table or a single fixed advance.
///
/// Serves as the fallback when a `Tf` names a font the resources do not
/// contain, and as a test double for metric-sensitive layout tests
/// (`BuiltinFont::courier()` matches the classic 600/1000 advance).
#[derive(Debug, Clone)]
pub struct BuiltinFont {
    name: String,
    width: f64,
    metrics: Option<&'static StandardMetrics>,
}

impl BuiltinFont {
    /// A fixed-pitch font with the given advance for every glyph.
    pub fn new(name: impl Into<String>, width: f64) -> Self {
        Self {
            name: name.into(),
            width,
            metrics: None,
        }
    }

    /// A font backed by a standard base-font width table, when the name
    /// resolves to one.
    pub fn standard(name: &str) -> Option<Self> {
        standard_metrics(name).map(|m| Self {
            name: name.to_string(),
            width: m.default_width,
            metrics: Some(m),
        })
    }

    /// The fallback used for missing fonts.
    pub fn fallback() -> Self {
        Self::standard("Helvetica").expect("Helvetica is a standard font")
    }

    /// Monospaced 600/1000 metrics.
    pub fn courier() -> Self {
        Self::standard("Courier").expect("Courier is a standard font")
    }

    fn width_of(&self, code: u32) -> f64 {
        self.metrics.map_or(self.width, |m| m.width(code))
    }
}

impl Font for BuiltinFont {
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
            match self.charcode_to_rune(code) {
                Some(r) => out.push(r.to_string()),
                None => {
                    misses += 1;
                    out.push('\u{FFFD}'.to_string());
                }
            }
        }
        (out, codes.len(), misses)
    }

    fn char_metrics(&self, code: u32) -> Option<CharMetrics> {
        Some(CharMetrics {
            wx: self.width_of(code),
            wy: 0.0,
        })
    }

    fn rune_metrics(&self, r: char) -> Option<CharMetrics> {
        Some(CharMetrics {
            wx: self.width_of(u32::from(r)),
            wy: 0.0,
        })
    }

    fn charcode_to_rune(&self, code: u32) -> Option<char> {
        // Latin-1: charcodes and code points coincide.
        if (0x20..=0xFF).contains(&code) && !(0x7F..=0x9F).contains(&code) {
            char::from_u32(code)
        } else {
            None
        }
    }
}

/// Number of fonts kept in a [`FontCache`].
pub const FONT_CACHE_CAPACITY: usize = 10;

struct CacheEntry {
    name: String,
    font: Arc<dyn Font>,
    last_used: u64,
}

/// Bounded LRU cache of decoded fonts, keyed by the resource name the font
/// was selected under.
///
/// One cache per document is plenty; workers sharing one must serialize
/// access behind a mutex, or replicate it per worker.
pub struct FontCache {
    entries: Vec<CacheEntry>,
    capacity: usize,
    clock: u64,
}

impl FontCache {
    pub fn new() -> Self {
        Self::with_capacity(FONT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    /// Looks up a font, refreshing its access time on a hit.
    pub fn get(&mut self, name: &str) -> Option<Arc<dyn Font>> {
        self.clock += 1;
        let clock = self.clock;
        self.entries.iter_mut().find(|e| e.name == name).map(|e| {
            e.last_used = clock;
            Arc::clone(&e.font)
        })
    }

    /// Inserts a font, evicting the least-recently-used entry when full.
    pub fn put(&mut self, name: &str, font: Arc<dyn Font>) {
        self.clock += 1;
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.font = font;
            entry.last_used = self.clock;
            return;
        }
        if self.entries.len() >= self.capacity {
            if let Some(idx) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(i, _)| i)
            {
                self.entries.swap_remove(idx);
            }
        }
        self.entries.push(CacheEntry {
            name: name.to_string(),
            font,
            last_used: self.clock,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_decodes_printable_latin() {
        let font = BuiltinFont::courier();
        let codes = font.bytes_to_charcodes(b"Hi!");
        let (strings, n, misses) = font.charcodes_to_strings(&codes);
        assert_eq!(strings, vec!["H", "i", "!"]);
        assert_eq!(n, 3);
        assert_eq!(misses, 0);
    }

    #[test]
    fn builtin_counts_unmapped_codes() {
        let font = BuiltinFont::fallback();
        let (strings, n, misses) = font.charcodes_to_strings(&[0x41, 0x01]);
        assert_eq!(strings[0], "A");
        assert_eq!(strings[1], "\u{FFFD}");
        assert_eq!((n, misses), (2, 1));
    }

    #[test]
    fn standard_builtin_uses_table_widths() {
        let font = BuiltinFont::fallback();
        assert_eq!(font.char_metrics(u32::from(b'i')).unwrap().wx, 222.0);
        assert_eq!(font.char_metrics(u32::from(b'W')).unwrap().wx, 944.0);
        assert_eq!(font.rune_metrics('i').unwrap().wx, 222.0);

        let fixed = BuiltinFont::new("Mystery", 450.0);
        assert_eq!(fixed.char_metrics(u32::from(b'i')).unwrap().wx, 450.0);
    }

    #[test]
    fn cache_evicts_least_recently_used() {
        let mut cache = FontCache::with_capacity(2);
        let f: Arc<dyn Font> = Arc::new(BuiltinFont::fallback());
        cache.put("F1", Arc::clone(&f));
        cache.put("F2", Arc::clone(&f));
        // Touch F1 so F2 becomes the eviction candidate.
        assert!(cache.get("F1").is_some());
        cache.put("F3", Arc::clone(&f));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("F2").is_none());
        assert!(cache.get("F1").is_some());
        assert!(cache.get("F3").is_some());
    }

    #[test]
    fn cache_put_refreshes_existing_entry() {
        let mut cache = FontCache::with_capacity(2);
        let f: Arc<dyn Font> = Arc::new(BuiltinFont::fallback());
        cache.put("F1", Arc::clone(&f));
        cache.put("F1", Arc::clone(&f));
        assert_eq!(cache.len(), 1);
    }
}
