//! Parsed content-stream operators and operands.
//!
//! The engine does not parse PDF syntax itself: an external content-stream
//! parser supplies each operator as a [`ContentOp`], an operator name plus
//! its operand list. Operands cover the primitive kinds a text extractor
//! consumes; anything richer (dictionaries, inline images) stays on the
//! parser's side of the boundary.

use crate::error::{ExtractError, Result};

/// One operand of a content-stream operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Real(f64),
    /// A name literal, without the leading slash.
    Name(String),
    /// A string operand as raw bytes; decoding is the current font's job.
    String(Vec<u8>),
    Array(Vec<Operand>),
    /// An indirect object reference the parser chose not to resolve.
    Ref(u64),
}

impl Operand {
    const fn kind(&self) -> &'static str {
        match self {
            Operand::Int(_) => "integer",
            Operand::Real(_) => "real",
            Operand::Name(_) => "name",
            Operand::String(_) => "string",
            Operand::Array(_) => "array",
            Operand::Ref(_) => "reference",
        }
    }

    /// Numeric value of an integer or real operand.
    pub fn as_num(&self) -> Result<f64> {
        match self {
            Operand::Int(n) => Ok(*n as f64),
            Operand::Real(n) => Ok(*n),
            other => Err(ExtractError::Type {
                expected: "number",
                got: other.kind(),
            }),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Operand::Int(n) => Ok(*n),
            Operand::Real(n) => Ok(*n as i64),
            other => Err(ExtractError::Type {
                expected: "integer",
                got: other.kind(),
            }),
        }
    }

    pub fn as_name(&self) -> Result<&str> {
        match self {
            Operand::Name(s) => Ok(s),
            other => Err(ExtractError::Type {
                expected: "name",
                got: other.kind(),
            }),
        }
    }

    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Operand::String(s) => Ok(s),
            other => Err(ExtractError::Type {
                expected: "string",
                got: other.kind(),
            }),
        }
    }

    pub fn as_array(&self) -> Result<&[Operand]> {
        match self {
            Operand::Array(a) => Ok(a),
            other => Err(ExtractError::Type {
                expected: "array",
                got: other.kind(),
            }),
        }
    }
}

/// One operator of a content stream: name plus operands, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub name: String,
    pub operands: Vec<Operand>,
}

impl ContentOp {
    pub fn new(name: impl Into<String>, operands: Vec<Operand>) -> Self {
        Self {
            name: name.into(),
            operands,
        }
    }

    /// The operand at `idx`, or a Parse error naming this operator.
    pub fn operand(&self, idx: usize) -> Result<&Operand> {
        self.operands.get(idx).ok_or_else(|| ExtractError::Parse {
            op: self.name.clone(),
            msg: format!("missing operand {} (have {})", idx, self.operands.len()),
        })
    }

    pub fn num(&self, idx: usize) -> Result<f64> {
        self.operand(idx)?.as_num()
    }

    pub fn int(&self, idx: usize) -> Result<i64> {
        self.operand(idx)?.as_int()
    }

    pub fn name_arg(&self, idx: usize) -> Result<&str> {
        self.operand(idx)?.as_name()
    }

    pub fn string(&self, idx: usize) -> Result<&[u8]> {
        self.operand(idx)?.as_string()
    }

    pub fn array(&self, idx: usize) -> Result<&[Operand]> {
        self.operand(idx)?.as_array()
    }

    /// All numeric operands, failing if any operand is non-numeric or fewer
    /// than `n` are present.
    pub fn nums(&self, n: usize) -> Result<Vec<f64>> {
        if self.operands.len() < n {
            return Err(ExtractError::Parse {
                op: self.name.clone(),
                msg: format!("expected {} operands, have {}", n, self.operands.len()),
            });
        }
        self.operands[..n].iter().map(Operand::as_num).collect()
    }
}
