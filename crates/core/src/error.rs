//! Error types for the extraction engine.

use thiserror::Error;

/// Hard limit on Form XObject nesting. Self-referential or adversarially
/// nested forms fail with [`ExtractError::FormOverflow`] instead of blowing
/// the stack.
pub const MAX_FORM_DEPTH: usize = 20;

/// Primary error type for page extraction.
///
/// Most errors are best-effort: the interpreter logs them, records them on
/// the page result, and keeps going. See the policy notes on each variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// Malformed operator or operand shape in the content stream.
    /// Logged; the operator is skipped; extraction continues.
    #[error("malformed operand for `{op}`: {msg}")]
    Parse { op: String, msg: String },

    /// Operand of an unexpected kind. Same policy as [`ExtractError::Parse`].
    #[error("type error: expected {expected}, got {got}")]
    Type {
        expected: &'static str,
        got: &'static str,
    },

    /// Font resource name not present in the resource dictionary. The
    /// interpreter falls back to a built-in font for the current text
    /// object and suppresses further string rendering in it.
    #[error("font not found in resources: {0}")]
    MissingFont(String),

    /// No width entry for a charcode. Rendering of the containing string is
    /// abandoned; remaining operators still run.
    #[error("no glyph metrics for charcode {code:#x} in font {font}")]
    MissingGlyphMetric { font: String, code: u32 },

    /// Form XObject nesting exceeded [`MAX_FORM_DEPTH`]. The page is
    /// returned with whatever was extracted before the overflow.
    #[error("form xobject nesting exceeds {MAX_FORM_DEPTH} levels")]
    FormOverflow,

    /// A caller-supplied byte range cannot be resolved to position records.
    /// Returned to the caller; internal state is untouched.
    #[error("byte range {start}..{end} out of range for text of length {len}")]
    OutOfRange {
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Convenience Result type alias for ExtractError.
pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_input() {
        let err = ExtractError::MissingFont("F9".to_string());
        assert_eq!(err.to_string(), "font not found in resources: F9");

        let err = ExtractError::MissingGlyphMetric {
            font: "Courier".to_string(),
            code: 0x41,
        };
        assert_eq!(
            err.to_string(),
            "no glyph metrics for charcode 0x41 in font Courier"
        );

        let err = ExtractError::OutOfRange {
            start: 4,
            end: 2,
            len: 10,
        };
        assert_eq!(
            err.to_string(),
            "byte range 4..2 out of range for text of length 10"
        );
    }

    #[test]
    fn overflow_message_carries_the_depth_limit() {
        assert_eq!(
            ExtractError::FormOverflow.to_string(),
            format!("form xobject nesting exceeds {} levels", MAX_FORM_DEPTH)
        );
    }
}
