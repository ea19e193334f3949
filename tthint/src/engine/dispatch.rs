//! Instruction decoding and dispatch.

use super::{
    super::{
        code::{Instruction, Opcode, Program},
        error::HintError,
        options::InterpreterVersion,
    },
    Engine, HintErrorKind,
};

impl<'a> Engine<'a> {
    /// Resets state for the specified program and executes all instructions.
    pub fn run_program(&mut self, program: Program, is_pedantic: bool) -> Result<(), HintError> {
        self.reset(program, is_pedantic);
        self.run()
    }

    /// Prepares the interpreter for running `program` from the start.
    pub fn reset(&mut self, program: Program, is_pedantic: bool) {
        self.program.reset(program);
        self.graphics.reset();
        self.graphics.is_pedantic = is_pedantic;
        self.graphics.did_iup_x = false;
        self.graphics.did_iup_y = false;
        self.loop_budget.reset();
        self.value_stack.clear();
        match program {
            Program::Font => {
                self.definitions.functions.reset();
                self.definitions.instructions.reset();
                self.graphics.backward_compatibility = false;
            }
            Program::ControlValue => {
                self.graphics.backward_compatibility = false;
            }
            Program::Glyph => {
                // Bit 1 requests the default graphics state for glyphs
                if self.graphics.instruct_control & 2 != 0 {
                    self.graphics.reset_retained();
                }
                self.graphics.backward_compatibility = self.version == InterpreterVersion::V40
                    && self.graphics.instruct_control & 4 == 0;
            }
        }
    }

    /// Decodes and dispatches all instructions until completion or error.
    pub fn run(&mut self) -> Result<(), HintError> {
        let mut count = 0usize;
        while let Some(ins) = self.decode() {
            let ins = ins?;
            count += 1;
            if count > self.max_instructions {
                return Err(self.error_at(&ins, HintErrorKind::ExceededExecutionBudget));
            }
            if log::log_enabled!(log::Level::Trace) {
                log::trace!(
                    "{:?}@{} {} depth={} top={:?}",
                    self.program.current,
                    ins.pc,
                    ins.name(),
                    self.value_stack.len(),
                    self.value_stack.peek(),
                );
            }
            self.dispatch(&ins)?;
        }
        // Falling off the end of the bytecode inside a definition
        if !self.program.call_stack.is_empty() {
            return Err(HintError {
                program: self.program.current,
                pc: self.program.decoder.pc,
                opcode: None,
                kind: HintErrorKind::UnexpectedEndOfBytecode,
            });
        }
        Ok(())
    }

    /// Decodes the next instruction from the current program.
    fn decode(&mut self) -> Option<Result<Instruction<'a>, HintError>> {
        let pc = self.program.decoder.pc;
        let ins = self.program.decoder.maybe_next()?;
        Some(ins.map_err(|kind| HintError {
            program: self.program.current,
            pc,
            opcode: None,
            kind,
        }))
    }

    fn error_at(&self, ins: &Instruction, kind: HintErrorKind) -> HintError {
        HintError {
            program: self.program.current,
            pc: ins.pc,
            opcode: Some(ins.opcode),
            kind,
        }
    }

    /// Executes the appropriate code for the given instruction.
    fn dispatch(&mut self, ins: &Instruction) -> Result<(), HintError> {
        // Capture the location before the instruction can transfer control
        let program = self.program.current;
        self.dispatch_inner(ins).map_err(|kind| HintError {
            program,
            pc: ins.pc,
            opcode: Some(ins.opcode),
            kind,
        })
    }

    pub(super) fn dispatch_inner(&mut self, ins: &Instruction) -> Result<(), HintErrorKind> {
        let opcode = ins.opcode;
        let raw = opcode.to_u8();
        match opcode {
            Opcode::SVTCA0
            | Opcode::SVTCA1
            | Opcode::SPVTCA0
            | Opcode::SPVTCA1
            | Opcode::SFVTCA0
            | Opcode::SFVTCA1 => self.op_svtca(raw),
            Opcode::SPVTL0 | Opcode::SPVTL1 | Opcode::SFVTL0 | Opcode::SFVTL1 => self.op_svtl(raw),
            Opcode::SPVFS => self.op_spvfs(),
            Opcode::SFVFS => self.op_sfvfs(),
            Opcode::GPV => self.op_gpv(),
            Opcode::GFV => self.op_gfv(),
            Opcode::SFVTPV => self.op_sfvtpv(),
            Opcode::ISECT => self.op_isect(),
            Opcode::SRP0 => self.op_srp0(),
            Opcode::SRP1 => self.op_srp1(),
            Opcode::SRP2 => self.op_srp2(),
            Opcode::SZP0 => self.op_szp0(),
            Opcode::SZP1 => self.op_szp1(),
            Opcode::SZP2 => self.op_szp2(),
            Opcode::SZPS => self.op_szps(),
            Opcode::SLOOP => self.op_sloop(),
            Opcode::RTG => self.op_rtg(),
            Opcode::RTHG => self.op_rthg(),
            Opcode::SMD => self.op_smd(),
            Opcode::ELSE => self.op_else(),
            Opcode::JMPR => self.op_jmpr(),
            Opcode::SCVTCI => self.op_scvtci(),
            Opcode::SSWCI => self.op_sswci(),
            Opcode::SSW => self.op_ssw(),
            Opcode::DUP => self.op_dup(),
            Opcode::POP => self.op_pop(),
            Opcode::CLEAR => self.op_clear(),
            Opcode::SWAP => self.op_swap(),
            Opcode::DEPTH => self.op_depth(),
            Opcode::CINDEX => self.op_cindex(),
            Opcode::MINDEX => self.op_mindex(),
            Opcode::ALIGNPTS => self.op_alignpts(),
            Opcode::UTP => self.op_utp(),
            Opcode::LOOPCALL => self.op_loopcall(),
            Opcode::CALL => self.op_call(),
            Opcode::FDEF => self.op_fdef(),
            Opcode::ENDF => self.op_endf(),
            Opcode::MDAP0 | Opcode::MDAP1 => self.op_mdap(raw),
            Opcode::IUP0 | Opcode::IUP1 => self.op_iup(raw),
            Opcode::SHP0 | Opcode::SHP1 => self.op_shp(raw),
            Opcode::SHC0 | Opcode::SHC1 => self.op_shc(raw),
            Opcode::SHZ0 | Opcode::SHZ1 => self.op_shz(raw),
            Opcode::SHPIX => self.op_shpix(),
            Opcode::IP => self.op_ip(),
            Opcode::MSIRP0 | Opcode::MSIRP1 => self.op_msirp(raw),
            Opcode::ALIGNRP => self.op_alignrp(),
            Opcode::RTDG => self.op_rtdg(),
            Opcode::MIAP0 | Opcode::MIAP1 => self.op_miap(raw),
            Opcode::NPUSHB | Opcode::NPUSHW => self.op_push(&ins.inline_operands),
            Opcode::WS => self.op_ws(),
            Opcode::RS => self.op_rs(),
            Opcode::WCVTP => self.op_wcvtp(),
            Opcode::RCVT => self.op_rcvt(),
            Opcode::GC0 | Opcode::GC1 => self.op_gc(raw),
            Opcode::SCFS => self.op_scfs(),
            Opcode::MD0 | Opcode::MD1 => self.op_md(raw),
            Opcode::MPPEM => self.op_mppem(),
            Opcode::MPS => self.op_mps(),
            Opcode::FLIPON => self.op_flipon(),
            Opcode::FLIPOFF => self.op_flipoff(),
            Opcode::DEBUG => self.op_debug(),
            Opcode::LT => self.op_lt(),
            Opcode::LTEQ => self.op_lteq(),
            Opcode::GT => self.op_gt(),
            Opcode::GTEQ => self.op_gteq(),
            Opcode::EQ => self.op_eq(),
            Opcode::NEQ => self.op_neq(),
            Opcode::ODD => self.op_odd(),
            Opcode::EVEN => self.op_even(),
            Opcode::IF => self.op_if(),
            Opcode::EIF => self.op_eif(),
            Opcode::AND => self.op_and(),
            Opcode::OR => self.op_or(),
            Opcode::NOT => self.op_not(),
            Opcode::DELTAP1 | Opcode::DELTAP2 | Opcode::DELTAP3 => self.op_deltap(opcode),
            Opcode::SDB => self.op_sdb(),
            Opcode::SDS => self.op_sds(),
            Opcode::ADD => self.op_add(),
            Opcode::SUB => self.op_sub(),
            Opcode::DIV => self.op_div(),
            Opcode::MUL => self.op_mul(),
            Opcode::ABS => self.op_abs(),
            Opcode::NEG => self.op_neg(),
            Opcode::FLOOR => self.op_floor(),
            Opcode::CEILING => self.op_ceiling(),
            Opcode::WCVTF => self.op_wcvtf(),
            Opcode::DELTAC1 | Opcode::DELTAC2 | Opcode::DELTAC3 => self.op_deltac(opcode),
            Opcode::SROUND => self.op_sround(),
            Opcode::S45ROUND => self.op_s45round(),
            Opcode::JROT => self.op_jrot(),
            Opcode::JROF => self.op_jrof(),
            Opcode::ROFF => self.op_roff(),
            Opcode::RUTG => self.op_rutg(),
            Opcode::RDTG => self.op_rdtg(),
            Opcode::SANGW => self.op_sangw(),
            Opcode::AA => self.op_aa(),
            Opcode::FLIPPT => self.op_flippt(),
            Opcode::FLIPRGON => self.op_fliprgon(),
            Opcode::FLIPRGOFF => self.op_fliprgoff(),
            Opcode::SCANCTRL => self.op_scanctrl(),
            Opcode::SDPVTL0 | Opcode::SDPVTL1 => self.op_sdpvtl(raw),
            Opcode::GETINFO => self.op_getinfo(),
            Opcode::IDEF => self.op_idef(),
            Opcode::ROLL => self.op_roll(),
            Opcode::MAX => self.op_max(),
            Opcode::MIN => self.op_min(),
            Opcode::SCANTYPE => self.op_scantype(),
            Opcode::INSTCTRL => self.op_instctrl(),
            _ if opcode.is_push() => self.op_push(&ins.inline_operands),
            _ if (Opcode::ROUND00..=Opcode::ROUND11).contains(&opcode) => self.op_round(raw),
            _ if (Opcode::NROUND00..=Opcode::NROUND11).contains(&opcode) => self.op_nround(raw),
            _ if opcode >= Opcode::MDRP00000 && opcode <= Opcode::MDRP11111 => self.op_mdrp(raw),
            _ if opcode >= Opcode::MIRP00000 => self.op_mirp(raw),
            // Unassigned opcodes, including the variation instructions,
            // may be provided by an instruction definition
            _ => self.op_unknown(opcode),
        }
    }
}
