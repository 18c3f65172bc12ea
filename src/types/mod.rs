//! Workbook model: the read-only data the parser produces and every other
//! component consumes.

mod cell;
mod style;
mod workbook;

pub use cell::*;
pub use style::*;
pub use workbook::*;
