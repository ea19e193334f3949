//! A TrueType hinting virtual machine.
//!
//! Executes the bytecode programs embedded in TrueType fonts to fit glyph
//! outlines to the pixel grid. The [`Driver`] owns the glyph zone shared
//! by all sizes and creates a [`SizeProgramCache`] per font and size,
//! which runs the font and control value programs once and then hints
//! any number of glyphs.
//!
//! ```no_run
//! # fn hint(font: &read_fonts::FontRef, outline: &[read_fonts::types::Point<i32>],
//! #     flags: &[read_fonts::tables::glyf::PointFlags], contours: &[u16],
//! #     bytecode: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! use tthint::{Driver, FontPrograms, HintingOptions, SizeRequest};
//!
//! let mut driver = Driver::new(HintingOptions::default());
//! let programs = FontPrograms::new(font)?;
//! let mut size = driver.new_size(programs)?;
//! size.ensure_ready(SizeRequest::new(16))?;
//! let (_outcome, zone) =
//!     driver.hint_outline(&mut size, outline, flags, contours, bytecode, false)?;
//! println!("{:?}", zone.points());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod call_stack;
mod code;
mod context;
mod cow_slice;
mod cvt;
mod definition;
mod driver;
mod engine;
mod error;
mod font;
mod graphics;
pub mod math;
mod options;
mod program;
mod size;
mod value_stack;
mod zone;

pub use code::{Opcode, Program};
pub use context::{ExecutionContext, ReadyState};
pub use cvt::{SizeMetrics, SizeRequest};
pub use driver::Driver;
pub use error::{HintError, HintErrorKind, HintingError};
pub use font::FontPrograms;
pub use graphics::{CoordAxis, RetainedGraphicsState, RoundMode, RoundState};
pub use options::{HintingOptions, InterpreterVersion, DEFAULT_MAX_INSTRUCTIONS};
pub use size::{HintOutcome, SizeProgramCache};
pub use zone::{GlyphZone, Zone, ZonePointer};
