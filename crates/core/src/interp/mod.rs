//! Content-stream interpretation.
//!
//! - `interpreter` - the text state machine turning operator streams into
//!   positioned marks

pub mod interpreter;

pub use interpreter::{Form, Interpreter, InterpreterOutput, Resources, XObjectKind};
