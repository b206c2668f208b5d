//! lectern - PDF page text extraction.
//!
//! Turns the parsed drawing operators of a single PDF page into a
//! reading-ordered Unicode string and a parallel array of position records
//! mapping substrings back to rectangles on the page.
//!
//! The pipeline: content stream → positioned marks (by orientation bucket) →
//! word fragments → depth-binned word bags → paragraph regions → lines →
//! optional tables → reading-order sort → text view.
//!
//! PDF file parsing, font decoding, and color-space resolution live outside
//! this crate; they plug in through the [`interp::Resources`] and
//! [`font::Font`] traits.

pub mod error;
pub mod font;
pub mod interp;
pub mod layout;
pub mod model;
pub mod page;
pub mod params;
pub mod utils;

pub use error::{ExtractError, Result, MAX_FORM_DEPTH};
pub use font::{BuiltinFont, CharMetrics, Font, FontCache, FONT_CACHE_CAPACITY};
pub use interp::{Form, Interpreter, InterpreterOutput, Resources, XObjectKind};
pub use layout::{Line, Mark, Para, Table, Word, WordBag};
pub use model::{Color, ContentOp, Operand};
pub use page::{
    extract_page, PageOutcome, PageText, TableCell, TableView, TextMark, TextMarkArray,
};
pub use params::ExtractParams;
