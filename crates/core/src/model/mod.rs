//! Content-stream data model.
//!
//! - `objects` - parsed operator/operand representation supplied by the
//!   external content-stream parser
//! - `state` - text and graphics state carried by the interpreter

pub mod objects;
pub mod state;

pub use objects::{ContentOp, Operand};
pub use state::{Color, GraphicState, TextState};
