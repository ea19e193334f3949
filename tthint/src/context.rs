//! Execution context for the font, control value and glyph programs.

use super::{
    code::Program,
    cow_slice::CowSlice,
    cvt::{scale_cvt, SizeMetrics},
    definition::{Definition, DefinitionMap, DefinitionState},
    engine::{Engine, LoopBudget, Storage},
    error::HintingError,
    font::FontPrograms,
    graphics::{GraphicsState, RetainedGraphicsState},
    options::HintingOptions,
    program::ProgramState,
    value_stack::ValueStack,
    zone::{grow, GlyphZone, Zone},
};

/// Twilight points reserved in addition to the `maxp` count.
const EXTRA_TWILIGHT_POINTS: usize = 4;

/// Stack slots reserved in addition to the `maxp` count. Many fonts
/// underreport their stack usage.
const EXTRA_STACK_ELEMENTS: usize = 32;

/// Outcome of running one of the startup programs for the current
/// configuration.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum ReadyState {
    #[default]
    NotRun,
    Failed(HintingError),
    Succeeded,
}

impl ReadyState {
    /// Returns the cached result, or `None` if the program has not run.
    pub fn result(&self) -> Option<Result<(), HintingError>> {
        match self {
            Self::NotRun => None,
            Self::Failed(e) => Some(Err(*e)),
            Self::Succeeded => Some(Ok(())),
        }
    }

    pub fn is_ready(&self) -> bool {
        *self == Self::Succeeded
    }
}

impl From<&Result<(), HintingError>> for ReadyState {
    fn from(value: &Result<(), HintingError>) -> Self {
        match value {
            Ok(()) => Self::Succeeded,
            Err(e) => Self::Failed(*e),
        }
    }
}

/// Owns the interpreter state that persists across program runs for a
/// single font at a single size.
///
/// The font program populates the function and instruction definitions.
/// The control value program scales the CVT and establishes the storage
/// area, the twilight zone and the graphics state that every glyph
/// program starts from. Glyph programs see all of that through copy on
/// write views so that their changes are discarded after each glyph.
pub struct ExecutionContext<'a> {
    font: FontPrograms<'a>,
    options: HintingOptions,
    metrics: SizeMetrics,
    functions: Vec<Definition>,
    instructions: Vec<Definition>,
    cvt: Vec<i32>,
    storage: Vec<i32>,
    value_stack: Vec<i32>,
    graphics: RetainedGraphicsState,
    twilight: GlyphZone,
    // Scratch buffers for glyph programs
    glyph_cvt: Vec<i32>,
    glyph_storage: Vec<i32>,
    glyph_twilight: GlyphZone,
    font_program: ReadyState,
    control_value_program: ReadyState,
    font_program_runs: usize,
}

impl<'a> ExecutionContext<'a> {
    /// Allocates all buffers at the sizes declared by the font.
    pub fn new(
        font: FontPrograms<'a>,
        options: HintingOptions,
        metrics: SizeMetrics,
    ) -> Result<Self, HintingError> {
        let twilight_count = font.max_twilight_points as usize + EXTRA_TWILIGHT_POINTS;
        let mut context = Self {
            font,
            options,
            metrics,
            functions: vec![],
            instructions: vec![],
            cvt: vec![],
            storage: vec![],
            value_stack: vec![],
            graphics: RetainedGraphicsState::default(),
            twilight: GlyphZone::default(),
            glyph_cvt: vec![],
            glyph_storage: vec![],
            glyph_twilight: GlyphZone::default(),
            font_program: ReadyState::NotRun,
            control_value_program: ReadyState::NotRun,
            font_program_runs: 0,
        };
        grow(&mut context.functions, font.max_function_defs as usize)?;
        grow(&mut context.instructions, font.max_instruction_defs as usize)?;
        grow(&mut context.cvt, font.cvt.len())?;
        grow(&mut context.glyph_cvt, font.cvt.len())?;
        grow(&mut context.storage, font.max_storage as usize)?;
        grow(&mut context.glyph_storage, font.max_storage as usize)?;
        grow(
            &mut context.value_stack,
            font.max_stack_elements as usize + EXTRA_STACK_ELEMENTS,
        )?;
        context.twilight.reset(twilight_count, 0)?;
        context.glyph_twilight.reset(twilight_count, 0)?;
        Ok(context)
    }

    pub fn font(&self) -> &FontPrograms<'a> {
        &self.font
    }

    pub fn options(&self) -> &HintingOptions {
        &self.options
    }

    pub fn metrics(&self) -> &SizeMetrics {
        &self.metrics
    }

    /// Switches to new metrics and options, forgetting the results of both
    /// startup programs.
    pub fn reconfigure(&mut self, metrics: SizeMetrics, options: HintingOptions) {
        self.metrics = metrics;
        self.options = options;
        self.font_program = ReadyState::NotRun;
        self.control_value_program = ReadyState::NotRun;
    }

    pub fn font_program_state(&self) -> ReadyState {
        self.font_program
    }

    pub fn control_value_program_state(&self) -> ReadyState {
        self.control_value_program
    }

    /// Number of times the font program has actually executed.
    pub fn font_program_runs(&self) -> usize {
        self.font_program_runs
    }

    /// Graphics state captured at the end of the control value program.
    pub fn retained_graphics(&self) -> &RetainedGraphicsState {
        &self.graphics
    }

    /// Scaled control values (26.6) as left by the control value program.
    pub fn cvt(&self) -> &[i32] {
        &self.cvt
    }

    pub fn twilight(&self) -> &GlyphZone {
        &self.twilight
    }

    /// Returns false if the control value program disabled glyph programs
    /// by setting bit 0 of instruct control.
    pub fn is_enabled(&self) -> bool {
        self.graphics.instruct_control & 1 == 0
    }

    /// Runs the font program unless it already ran for the current
    /// configuration, returning its result.
    pub fn run_font_program(&mut self) -> Result<(), HintingError> {
        if let Some(result) = self.font_program.result() {
            return result;
        }
        log::debug!("running font program ({} bytes)", self.font.fpgm.len());
        self.font_program_runs += 1;
        let result = self.run_startup_program(Program::Font);
        self.font_program = ReadyState::from(&result);
        result
    }

    /// Runs the control value program unless it already ran for the current
    /// configuration, returning its result.
    ///
    /// Runs the font program first if needed and fails with its error if
    /// it failed.
    pub fn run_control_value_program(&mut self) -> Result<(), HintingError> {
        if let Some(result) = self.control_value_program.result() {
            return result;
        }
        self.run_font_program()?;
        log::debug!(
            "running control value program ({} bytes) at {} ppem",
            self.font.prep.len(),
            self.metrics.ppem()
        );
        scale_cvt(self.font.cvt, self.metrics.scale(), &mut self.cvt);
        self.storage.fill(0);
        self.twilight.clear();
        self.graphics = RetainedGraphicsState::default();
        let result = self.run_startup_program(Program::ControlValue);
        self.control_value_program = ReadyState::from(&result);
        result
    }

    /// Runs a glyph program over `zone`, modifying its current points.
    ///
    /// Both startup programs are run first if needed and their failure is
    /// returned as is. On failure the points may be partially hinted;
    /// callers restore them with [`GlyphZone::restore_unhinted`].
    pub fn run_glyph_program(
        &mut self,
        zone: &mut GlyphZone,
        bytecode: &[u8],
        is_composite: bool,
    ) -> Result<(), HintingError> {
        self.run_control_value_program()?;
        let Self {
            font,
            options,
            metrics,
            functions,
            instructions,
            cvt,
            storage,
            value_stack,
            graphics,
            twilight,
            glyph_cvt,
            glyph_storage,
            glyph_twilight,
            ..
        } = self;
        glyph_twilight.copy_from(twilight)?;
        let loop_budget = LoopBudget::new(
            zone.point_count(),
            font.cvt.len(),
            font.num_glyphs as usize,
        );
        let mut state = GraphicsState::new(
            *graphics,
            [glyph_twilight.zone(), zone.zone()],
            metrics.scale(),
        );
        state.is_composite = is_composite;
        // Both pairs of buffers are allocated with the same length
        let (Some(cvt), Some(storage)) = (
            CowSlice::new(cvt, glyph_cvt),
            CowSlice::new(storage, glyph_storage),
        ) else {
            return Err(HintingError::AllocationFailure);
        };
        let mut engine = Engine::new(
            ProgramState::new(font.fpgm, font.prep, bytecode, Program::Glyph),
            state,
            DefinitionState::new(
                DefinitionMap::Ref(functions),
                DefinitionMap::Ref(instructions),
            ),
            cvt.into(),
            storage.into(),
            ValueStack::new(value_stack),
            *metrics,
            options.interpreter_version,
            loop_budget,
            options.max_instructions,
        );
        engine.run_program(Program::Glyph, options.pedantic)?;
        Ok(())
    }

    fn run_startup_program(&mut self, program: Program) -> Result<(), HintingError> {
        let Self {
            font,
            options,
            metrics,
            functions,
            instructions,
            cvt,
            storage,
            value_stack,
            graphics,
            twilight,
            ..
        } = self;
        let state = GraphicsState::new(
            RetainedGraphicsState::default(),
            [twilight.zone(), Zone::default()],
            metrics.scale(),
        );
        let mut engine = Engine::new(
            ProgramState::new(font.fpgm, font.prep, &[], program),
            state,
            DefinitionState::new(
                DefinitionMap::Mut(functions),
                DefinitionMap::Mut(instructions),
            ),
            CowSlice::new_mut(cvt).into(),
            Storage::from(CowSlice::new_mut(storage)),
            ValueStack::new(value_stack),
            *metrics,
            options.interpreter_version,
            LoopBudget::new(0, font.cvt.len(), font.num_glyphs as usize),
            options.max_instructions,
        );
        engine.run_program(program, options.pedantic)?;
        if program == Program::ControlValue {
            *graphics = engine.graphics().retained;
        }
        Ok(())
    }
}
