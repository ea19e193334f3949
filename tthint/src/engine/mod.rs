//! TrueType bytecode interpreter.

mod arith;
mod control_flow;
mod cvt;
mod data;
mod definition;
mod delta;
mod dispatch;
mod graphics;
mod logical;
mod misc;
mod outline;
mod round;
mod stack;
mod storage;

use read_fonts::types::Point;

use super::{
    code::Program,
    cvt::{Cvt, SizeMetrics},
    definition::DefinitionState,
    error::HintErrorKind,
    graphics::GraphicsState,
    options::InterpreterVersion,
    program::ProgramState,
    value_stack::ValueStack,
};

pub use storage::Storage;

pub type OpResult = Result<(), HintErrorKind>;

/// TrueType bytecode interpreter.
pub struct Engine<'a> {
    program: ProgramState<'a>,
    graphics: GraphicsState<'a>,
    definitions: DefinitionState<'a>,
    cvt: Cvt<'a>,
    storage: Storage<'a>,
    value_stack: ValueStack<'a>,
    metrics: SizeMetrics,
    version: InterpreterVersion,
    loop_budget: LoopBudget,
    max_instructions: usize,
}

impl<'a> Engine<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        program: ProgramState<'a>,
        graphics: GraphicsState<'a>,
        definitions: DefinitionState<'a>,
        cvt: Cvt<'a>,
        storage: Storage<'a>,
        value_stack: ValueStack<'a>,
        metrics: SizeMetrics,
        version: InterpreterVersion,
        loop_budget: LoopBudget,
        max_instructions: usize,
    ) -> Self {
        Self {
            program,
            graphics,
            definitions,
            cvt,
            storage,
            value_stack,
            metrics,
            version,
            loop_budget,
            max_instructions,
        }
    }

    /// Returns the graphics state, including the retained portion that
    /// the control value program hands to glyph programs.
    pub fn graphics(&self) -> &GraphicsState<'a> {
        &self.graphics
    }

    /// Ratio for reading and writing control values along the current
    /// projection vector.
    fn cvt_ratio(&self) -> i32 {
        self.metrics.ratio(self.graphics.proj_vector)
    }

    /// Ppem along the current projection vector.
    fn projected_ppem(&self) -> i32 {
        self.metrics.projected_ppem(self.graphics.proj_vector)
    }

    fn pop_point(&mut self) -> Result<usize, HintErrorKind> {
        self.value_stack.pop_usize()
    }

    /// Pops two values as a vector `(x, y)`, where `y` is on top.
    fn pop_vector(&mut self) -> Result<Point<i32>, HintErrorKind> {
        let y = self.value_stack.pop()? as i16 as i32;
        let x = self.value_stack.pop()? as i16 as i32;
        Ok(Point::new(x, y))
    }

    /// Takes the loop counter, resetting it to 1.
    fn take_loop_counter(&mut self) -> u32 {
        core::mem::replace(&mut self.graphics.loop_counter, 1)
    }
}

/// Limits the number of loop iterations and backward jumps in a single
/// program run.
///
/// The limit grows with the number of points in the glyph and the size of
/// the control value table, so that large glyphs with heavy hinting still
/// finish while malicious loops are cut short early.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct LoopBudget {
    limit: usize,
    loop_calls: usize,
    backward_jumps: usize,
}

impl LoopBudget {
    /// Computes the budget for a run over `point_count` points with a
    /// control value table of `cvt_len` entries.
    ///
    /// A non-zero `glyph_count` caps the limit for fonts with very few
    /// glyphs.
    pub fn new(point_count: usize, cvt_len: usize, glyph_count: usize) -> Self {
        let limit = if point_count > 0 {
            (point_count * 10).max(50) + (cvt_len / 10).max(50)
        } else {
            300 + 22 * cvt_len
        };
        let limit = if glyph_count > 0 {
            limit.min(100 * glyph_count)
        } else {
            limit
        };
        Self {
            limit,
            loop_calls: 0,
            backward_jumps: 0,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn reset(&mut self) {
        self.loop_calls = 0;
        self.backward_jumps = 0;
    }

    /// Charges `count` iterations of a `LOOPCALL`.
    pub fn doing_loop_call(&mut self, count: usize) -> OpResult {
        self.loop_calls = self.loop_calls.saturating_add(count);
        if self.loop_calls > self.limit {
            Err(HintErrorKind::ExceededExecutionBudget)
        } else {
            Ok(())
        }
    }

    /// Charges a jump with a negative offset.
    pub fn doing_backward_jump(&mut self) -> OpResult {
        self.backward_jumps += 1;
        if self.backward_jumps > self.limit {
            Err(HintErrorKind::ExceededExecutionBudget)
        } else {
            Ok(())
        }
    }
}

impl Default for LoopBudget {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use read_fonts::{tables::glyf::PointFlags, types::Point};

    use super::{
        super::{
            code::{InlineOperands, Instruction, Opcode, Program},
            cow_slice::CowSlice,
            cvt::{SizeMetrics, SizeRequest},
            definition::{Definition, DefinitionMap, DefinitionState},
            graphics::{GraphicsState, RetainedGraphicsState},
            options::InterpreterVersion,
            program::ProgramState,
            value_stack::ValueStack,
            zone::GlyphZone,
        },
        Engine, LoopBudget, OpResult, Storage,
    };

    /// Owns everything an [`Engine`] borrows so that instructions can be
    /// tested in isolation.
    pub struct MockEngine {
        cvt: Vec<i32>,
        storage: Vec<i32>,
        value_stack: Vec<i32>,
        functions: Vec<Definition>,
        instructions: Vec<Definition>,
        twilight: GlyphZone,
        glyph: GlyphZone,
        pub font_code: Vec<u8>,
        pub cv_code: Vec<u8>,
        pub glyph_code: Vec<u8>,
        pub metrics: SizeMetrics,
        pub version: InterpreterVersion,
    }

    impl MockEngine {
        /// Creates buffers for a 64 point glyph in a single contour and an
        /// 8 point twilight zone.
        pub fn new() -> Self {
            let mut glyph = GlyphZone::new(64, 1).unwrap();
            glyph.reset(64, 1).unwrap();
            glyph.contours_mut()[0] = 63;
            let mut twilight = GlyphZone::new(8, 0).unwrap();
            twilight.reset(8, 0).unwrap();
            Self {
                cvt: vec![0; 32],
                storage: vec![0; 32],
                value_stack: vec![0; 32],
                functions: vec![Definition::default(); 16],
                instructions: vec![Definition::default(); 16],
                twilight,
                glyph,
                font_code: vec![],
                cv_code: vec![],
                glyph_code: vec![],
                metrics: SizeMetrics::new(SizeRequest::new(16), 1024),
                version: InterpreterVersion::V40,
            }
        }

        pub fn glyph_zone(&mut self) -> &mut GlyphZone {
            &mut self.glyph
        }

        /// Creates an engine positioned at the start of the glyph program
        /// with backward compatibility off.
        pub fn engine(&mut self) -> Engine<'_> {
            let zones = [self.twilight.zone(), self.glyph.zone()];
            let mut graphics =
                GraphicsState::new(RetainedGraphicsState::default(), zones, self.metrics.scale());
            graphics.backward_compatibility = false;
            Engine::new(
                ProgramState::new(
                    &self.font_code,
                    &self.cv_code,
                    &self.glyph_code,
                    Program::Glyph,
                ),
                graphics,
                DefinitionState::new(
                    DefinitionMap::Mut(&mut self.functions),
                    DefinitionMap::Mut(&mut self.instructions),
                ),
                CowSlice::new_mut(&mut self.cvt).into(),
                Storage::from(CowSlice::new_mut(&mut self.storage)),
                ValueStack::new(&mut self.value_stack),
                self.metrics,
                self.version,
                LoopBudget::new(64, 32, 0),
                1000,
            )
        }
    }

    impl Engine<'_> {
        /// Executes a single instruction that has no inline operands.
        pub fn exec(&mut self, opcode: u8) -> OpResult {
            self.dispatch_inner(&Instruction {
                opcode: Opcode::from_u8(opcode),
                inline_operands: InlineOperands::default(),
                pc: 0,
            })
        }

        pub fn push_all(&mut self, values: &[i32]) {
            for value in values {
                self.value_stack.push(*value).unwrap();
            }
        }

        pub fn stack(&self) -> &[i32] {
            self.value_stack.values()
        }

        pub fn set_point(&mut self, zone: usize, ix: usize, x: i32, y: i32) {
            let zone = &mut self.graphics.zones[zone];
            zone.points[ix] = Point::new(x, y);
            zone.original[ix] = Point::new(x, y);
        }

        pub fn point(&self, zone: usize, ix: usize) -> Point<i32> {
            self.graphics.zones[zone].points[ix]
        }

        pub fn flags(&self, zone: usize, ix: usize) -> PointFlags {
            self.graphics.zones[zone].flags[ix]
        }
    }

    #[test]
    fn loop_budget_limits() {
        let budget = LoopBudget::new(0, 100, 0);
        assert_eq!(budget.limit(), 300 + 2200);
        let budget = LoopBudget::new(2, 20, 0);
        assert_eq!(budget.limit(), 100);
        let budget = LoopBudget::new(1000, 2000, 0);
        assert_eq!(budget.limit(), 10000 + 200);
        let budget = LoopBudget::new(1000, 2000, 3);
        assert_eq!(budget.limit(), 300);
    }

    #[test]
    fn loop_budget_exhaustion() {
        let mut budget = LoopBudget::new(1, 0, 0);
        assert_eq!(budget.limit(), 100);
        assert!(budget.doing_loop_call(60).is_ok());
        assert!(budget.doing_loop_call(40).is_ok());
        assert!(budget.doing_loop_call(1).is_err());
        for _ in 0..100 {
            budget.doing_backward_jump().unwrap();
        }
        assert!(budget.doing_backward_jump().is_err());
        budget.reset();
        assert!(budget.doing_loop_call(100).is_ok());
    }
}
