//! Per size caching of the startup programs.

use super::{
    context::{ExecutionContext, ReadyState},
    cvt::{SizeMetrics, SizeRequest},
    error::HintingError,
    font::FontPrograms,
    options::HintingOptions,
    zone::GlyphZone,
};

/// Result of hinting a single glyph.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum HintOutcome {
    /// The glyph program ran to completion.
    Hinted,
    /// The points were left unhinted, either because hinting is disabled
    /// or because a program failed with the contained error.
    Unhinted(Option<HintingError>),
}

/// Runs the font and control value programs for a size and reuses their
/// results until the size or the interpreter configuration changes.
///
/// Failures are contained: unless pedantic mode is enabled, a size whose
/// startup programs fail renders all glyphs unhinted and a failing glyph
/// program only affects its own glyph.
pub struct SizeProgramCache<'a> {
    context: ExecutionContext<'a>,
    is_configured: bool,
}

impl<'a> SizeProgramCache<'a> {
    pub fn new(font: FontPrograms<'a>, options: HintingOptions) -> Result<Self, HintingError> {
        let metrics = SizeMetrics::new(SizeRequest::default(), font.units_per_em);
        Ok(Self {
            context: ExecutionContext::new(font, options, metrics)?,
            is_configured: false,
        })
    }

    pub fn options(&self) -> &HintingOptions {
        self.context.options()
    }

    /// Changes the options.
    ///
    /// Different options discard the startup results, so glyphs stay
    /// unhinted until the next call to [`ensure_ready`](Self::ensure_ready).
    pub fn set_options(&mut self, options: HintingOptions) {
        if options != *self.context.options() {
            let metrics = *self.context.metrics();
            self.context.reconfigure(metrics, options);
        }
    }

    /// Prepares for hinting glyphs at the requested size.
    ///
    /// Reruns the startup programs when the derived metrics differ from
    /// those of the previous call or the options have changed, and does
    /// nothing otherwise.
    /// A startup failure is only returned in pedantic mode; otherwise the
    /// size is marked as failed and glyphs are left unhinted.
    pub fn ensure_ready(&mut self, request: SizeRequest) -> Result<&SizeMetrics, HintingError> {
        let metrics = SizeMetrics::new(request, self.context.font().units_per_em);
        if !self.is_configured || metrics != *self.context.metrics() {
            let options = *self.context.options();
            log::debug!(
                "hinting configuration changed: {}x{} ppem, {:?}",
                metrics.x_ppem(),
                metrics.y_ppem(),
                options.interpreter_version
            );
            self.context.reconfigure(metrics, options);
            self.is_configured = true;
        }
        let needs_run = self.readiness() == ReadyState::NotRun;
        if let Err(e) = self.context.run_control_value_program() {
            if self.context.options().pedantic || e.is_fatal() {
                return Err(e);
            }
            if needs_run {
                log::warn!(
                    "hinting disabled at {} ppem, startup program failed: {e}",
                    metrics.ppem()
                );
            }
        }
        Ok(self.context.metrics())
    }

    /// Hints a glyph at the size established by the last call to
    /// [`ensure_ready`](Self::ensure_ready).
    ///
    /// `zone` must hold the glyph's scaled outline. On failure the points
    /// are restored from the original outline, and the error is returned
    /// only in pedantic mode or when it is fatal.
    pub fn hint_glyph(
        &mut self,
        zone: &mut GlyphZone,
        bytecode: &[u8],
        is_composite: bool,
    ) -> Result<HintOutcome, HintingError> {
        match self.readiness() {
            ReadyState::Succeeded => {}
            ReadyState::Failed(e) => return Ok(HintOutcome::Unhinted(Some(e))),
            ReadyState::NotRun => return Ok(HintOutcome::Unhinted(None)),
        }
        if !self.context.is_enabled() {
            return Ok(HintOutcome::Unhinted(None));
        }
        match self.context.run_glyph_program(zone, bytecode, is_composite) {
            Ok(()) => Ok(HintOutcome::Hinted),
            Err(e) => {
                zone.restore_unhinted();
                if self.context.options().pedantic || e.is_fatal() {
                    Err(e)
                } else {
                    log::debug!("glyph left unhinted: {e}");
                    Ok(HintOutcome::Unhinted(Some(e)))
                }
            }
        }
    }

    /// Metrics of the current size, if [`ensure_ready`](Self::ensure_ready)
    /// has been called.
    pub fn metrics(&self) -> Option<&SizeMetrics> {
        self.is_configured.then(|| self.context.metrics())
    }

    /// Combined state of the startup programs for the current size.
    pub fn readiness(&self) -> ReadyState {
        match self.context.font_program_state() {
            ReadyState::Succeeded => self.context.control_value_program_state(),
            state => state,
        }
    }

    /// Number of times the startup programs have executed.
    pub fn startup_runs(&self) -> usize {
        self.context.font_program_runs()
    }

    pub fn context(&self) -> &ExecutionContext<'a> {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use read_fonts::{
        tables::glyf::PointFlags,
        types::Point,
        FontRef,
    };

    use super::{
        super::{
            context::ReadyState,
            cvt::SizeRequest,
            error::{HintErrorKind, HintingError},
            font::{
                tests::{TestFont, TestMaxp},
                FontPrograms,
            },
            options::{HintingOptions, InterpreterVersion},
            zone::GlyphZone,
        },
        HintOutcome, SizeProgramCache,
    };

    // PUSHB[0] 0, FDEF, PUSHB[0] 1, ADD, ENDF
    const FPGM: &[u8] = &[0xB0, 0, 0x2C, 0xB0, 1, 0x60, 0x2D];
    // PUSHB[1] 0 100, WCVTP
    const PREP: &[u8] = &[0xB1, 0, 100, 0x44];
    // SVTCA[y], PUSHB[1] 0 0, RCVT, SCFS: moves point 0 to CVT[0] along y
    const MOVE_TO_CVT: &[u8] = &[0x00, 0xB1, 0, 0, 0x45, 0x48];
    // PUSHW[0] -3, JMPR
    const INFINITE_LOOP: &[u8] = &[0xB8, 0xFF, 0xFD, 0x1C];

    fn test_font(fpgm: &[u8], prep: &[u8]) -> Vec<u8> {
        let _ = env_logger::builder().is_test(true).try_init();
        TestFont {
            fpgm: fpgm.to_vec(),
            prep: prep.to_vec(),
            cvt: vec![0; 4],
            units_per_em: 640,
            maxp: Some(TestMaxp {
                num_glyphs: 10,
                max_twilight_points: 4,
                max_storage: 4,
                max_function_defs: 4,
                max_instruction_defs: 0,
                max_stack_elements: 16,
            }),
        }
        .build()
    }

    fn cache<'a>(font: &'a FontRef<'a>, options: HintingOptions) -> SizeProgramCache<'a> {
        SizeProgramCache::new(FontPrograms::new(font).unwrap(), options).unwrap()
    }

    /// Two points on one contour, scaled to `ppem` at 640 upem.
    fn glyph(ppem: i32) -> GlyphZone {
        let mut zone = GlyphZone::default();
        zone.load(
            &[Point::new(0, 0), Point::new(64, 64)],
            &[PointFlags::on_curve(); 2],
            &[1],
        )
        .unwrap();
        zone.scale(ppem * 0x10000 / 10);
        zone
    }

    #[test]
    fn startup_programs_cached_per_size() {
        let data = test_font(FPGM, PREP);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default());
        assert!(cache.metrics().is_none());
        assert_eq!(cache.readiness(), ReadyState::NotRun);
        let metrics = *cache.ensure_ready(SizeRequest::new(10)).unwrap();
        assert_eq!(metrics.ppem(), 10);
        assert!(cache.readiness().is_ready());
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        let mut zone = glyph(1);
        for _ in 0..2 {
            cache.hint_glyph(&mut zone, &[], false).unwrap();
        }
        assert_eq!(cache.startup_runs(), 1);
        // Any change to the metrics or options runs them again
        cache.ensure_ready(SizeRequest::new(12)).unwrap();
        assert_eq!(cache.startup_runs(), 2);
        cache
            .ensure_ready(SizeRequest::new(12).rotated(true))
            .unwrap();
        assert_eq!(cache.startup_runs(), 3);
        cache.ensure_ready(SizeRequest::with_ppem(12, 10)).unwrap();
        assert_eq!(cache.startup_runs(), 4);
        cache.set_options(HintingOptions::default().interpreter_version(InterpreterVersion::V35));
        cache.ensure_ready(SizeRequest::with_ppem(12, 10)).unwrap();
        assert_eq!(cache.startup_runs(), 5);
        cache.ensure_ready(SizeRequest::with_ppem(12, 10)).unwrap();
        assert_eq!(cache.startup_runs(), 5);
    }

    #[test]
    fn control_value_program_cvt_visible_to_glyphs() {
        let data = test_font(FPGM, PREP);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default());
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        assert_eq!(cache.context().cvt()[0], 100);
        let mut zone = glyph(10);
        assert_eq!(
            cache.hint_glyph(&mut zone, MOVE_TO_CVT, false),
            Ok(HintOutcome::Hinted)
        );
        assert_eq!(zone.points(), [Point::new(0, 100), Point::new(64, 64)]);
        // Other points were not touched by the program
        assert_eq!(zone.original()[1], Point::new(64, 64));
    }

    #[test]
    fn startup_failure_degrades_to_unhinted() {
        let data = test_font(&[], INFINITE_LOOP);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default());
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        let ReadyState::Failed(error) = cache.readiness() else {
            panic!("control value program should fail");
        };
        assert!(matches!(error, HintingError::ExecutionTimeout(_)));
        // Cached: no rerun at the same size
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        assert_eq!(cache.startup_runs(), 1);
        let mut zone = glyph(10);
        assert_eq!(
            cache.hint_glyph(&mut zone, MOVE_TO_CVT, false),
            Ok(HintOutcome::Unhinted(Some(error)))
        );
        assert_eq!(zone.points(), zone.original());
    }

    #[test]
    fn startup_failure_is_error_when_pedantic() {
        // POP on an empty stack
        let data = test_font(&[0x21], PREP);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default().pedantic(true));
        let error = cache.ensure_ready(SizeRequest::new(10)).unwrap_err();
        assert_eq!(
            error.hint_error().map(|e| e.kind),
            Some(HintErrorKind::ValueStackUnderflow)
        );
        assert_eq!(cache.readiness(), ReadyState::Failed(error));
        assert_eq!(cache.ensure_ready(SizeRequest::new(10)), Err(error));
    }

    #[test]
    fn glyph_failure_restores_points() {
        let data = test_font(FPGM, PREP);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default());
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        // Moves point 0, then POP on an empty stack
        let program = [MOVE_TO_CVT, &[0x21][..]].concat();
        let mut zone = glyph(10);
        let outcome = cache.hint_glyph(&mut zone, &program, false).unwrap();
        assert!(matches!(
            outcome,
            HintOutcome::Unhinted(Some(HintingError::InterpreterError(_)))
        ));
        assert_eq!(zone.points(), zone.original());
        // Out of range point: PUSHB[0] 40, MDAP[1]
        let outcome = cache.hint_glyph(&mut zone, &[0xB0, 40, 0x2F], false).unwrap();
        assert!(matches!(
            outcome,
            HintOutcome::Unhinted(Some(HintingError::IndexOutOfRange(_)))
        ));
        assert_eq!(zone.points(), zone.original());
        // The size is still usable
        assert_eq!(
            cache.hint_glyph(&mut zone, MOVE_TO_CVT, false),
            Ok(HintOutcome::Hinted)
        );
    }

    #[test]
    fn glyph_failure_is_error_when_pedantic() {
        let data = test_font(FPGM, PREP);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default().pedantic(true));
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        let mut zone = glyph(10);
        let program = [MOVE_TO_CVT, &[0x21][..]].concat();
        let error = cache.hint_glyph(&mut zone, &program, false).unwrap_err();
        assert!(matches!(error, HintingError::InterpreterError(_)));
        assert_eq!(zone.points(), zone.original());
    }

    #[test]
    fn glyph_programs_disabled_by_instruct_control() {
        // PUSHB[1] 1 1, INSTCTRL
        let data = test_font(&[], &[0xB1, 1, 1, 0x8E]);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default());
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        let mut zone = glyph(10);
        assert_eq!(
            cache.hint_glyph(&mut zone, MOVE_TO_CVT, false),
            Ok(HintOutcome::Unhinted(None))
        );
        assert_eq!(zone.points(), zone.original());
    }

    #[test]
    fn unprepared_size_is_unhinted() {
        let data = test_font(FPGM, PREP);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default());
        let mut zone = glyph(10);
        assert_eq!(
            cache.hint_glyph(&mut zone, MOVE_TO_CVT, false),
            Ok(HintOutcome::Unhinted(None))
        );
        assert_eq!(cache.startup_runs(), 0);
    }

    #[test]
    fn options_live_in_the_context() {
        let data = test_font(FPGM, PREP);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default());
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        // Same options keep the startup results
        cache.set_options(HintingOptions::default());
        assert!(cache.readiness().is_ready());
        let pedantic = HintingOptions::default().pedantic(true);
        cache.set_options(pedantic);
        assert_eq!(cache.options(), &pedantic);
        assert_eq!(cache.context().options(), &pedantic);
        assert_eq!(cache.readiness(), ReadyState::NotRun);
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        assert_eq!(cache.startup_runs(), 2);
        // POP on an empty stack is now reported
        let mut zone = glyph(10);
        assert!(matches!(
            cache.hint_glyph(&mut zone, &[0x21], false),
            Err(HintingError::InterpreterError(_))
        ));
    }

    // PUSHB[0] 0, PUSHW[1] 0x7FFF 0x7FFF, MUL, DUP, MUL, SHPIX: shifts
    // point 0 by a product that saturates to i32::MAX
    const SHIFT_BY_MAX: &[u8] = &[0xB0, 0, 0xB9, 0x7F, 0xFF, 0x7F, 0xFF, 0x63, 0x20, 0x63, 0x38];

    #[test]
    fn huge_shifts_saturate() {
        let data = test_font(&[], &[]);
        let font = FontRef::new(&data).unwrap();
        let options = HintingOptions::default().interpreter_version(InterpreterVersion::V35);
        let mut cache = cache(&font, options);
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        // SVTCA[x], shift twice, IUP[x]
        let program = [&[0x01][..], SHIFT_BY_MAX, SHIFT_BY_MAX, &[0x31]].concat();
        let mut zone = glyph(10);
        assert_eq!(
            cache.hint_glyph(&mut zone, &program, false),
            Ok(HintOutcome::Hinted)
        );
        assert_eq!(
            zone.points(),
            [Point::new(i32::MAX, 0), Point::new(i32::MAX, 64)]
        );
        // Same along y with the default interpreter
        cache.set_options(HintingOptions::default());
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        // SVTCA[y], MDAP[0] on point 0 so SHPIX may move it, shift twice
        let program = [&[0x00, 0xB0, 0, 0x2E][..], SHIFT_BY_MAX, SHIFT_BY_MAX].concat();
        let mut zone = glyph(10);
        assert_eq!(
            cache.hint_glyph(&mut zone, &program, false),
            Ok(HintOutcome::Hinted)
        );
        assert_eq!(zone.points(), [Point::new(0, i32::MAX), Point::new(64, 64)]);
    }

    #[test]
    fn extreme_control_values_saturate() {
        let data = test_font(&[], &[]);
        let font = FontRef::new(&data).unwrap();
        let mut cache = cache(&font, HintingOptions::default());
        cache.ensure_ready(SizeRequest::new(10)).unwrap();
        let program = [
            // PUSHB[0] 0, PUSHW[1] 0x7FFF 0x7FFF, MUL, DUP, MUL, NEG, WCVTP:
            // CVT[0] = i32::MIN + 1
            &[0xB0, 0, 0xB9, 0x7F, 0xFF, 0x7F, 0xFF, 0x63, 0x20, 0x63, 0x65, 0x44][..],
            // SVTCA[y], PUSHB[1] 1 0, MIAP[1]: beyond the cut-in, so point 1
            // keeps its rounded position
            &[0x00, 0xB1, 1, 0, 0x3F],
            // PUSHB[1] 1 0, MIAP[0]: moved as far as it can go
            &[0xB1, 1, 0, 0x3E],
        ]
        .concat();
        let mut zone = glyph(10);
        assert_eq!(
            cache.hint_glyph(&mut zone, &program, false),
            Ok(HintOutcome::Hinted)
        );
        assert_eq!(
            zone.points(),
            [Point::new(0, 0), Point::new(64, i32::MIN + 64)]
        );
    }
}
