//! Hinting error definitions.

use crate::code::{Opcode, Program};

/// Errors that may occur when interpreting TrueType bytecode.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum HintErrorKind {
    UnexpectedEndOfBytecode,
    UnhandledOpcode(Opcode),
    DefinitionInGlyphProgram,
    NestedDefinition,
    DefinitionTooLarge,
    TooManyDefinitions,
    InvalidDefinition(usize),
    ValueStackOverflow,
    ValueStackUnderflow,
    CallStackOverflow,
    CallStackUnderflow,
    InvalidStackValue(i32),
    InvalidPointIndex(usize),
    InvalidPointRange(usize, usize),
    InvalidContourIndex(usize),
    InvalidCvtIndex(usize),
    InvalidStorageIndex(usize),
    DivideByZero,
    InvalidZoneIndex(i32),
    NegativeLoopCounter,
    InvalidJump,
    ExceededExecutionBudget,
}

impl HintErrorKind {
    /// Returns true if the error was caused by an index that referred
    /// outside of a table, zone or definition map.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::InvalidDefinition(_)
                | Self::InvalidPointIndex(_)
                | Self::InvalidPointRange(..)
                | Self::InvalidContourIndex(_)
                | Self::InvalidCvtIndex(_)
                | Self::InvalidStorageIndex(_)
                | Self::InvalidZoneIndex(_)
        )
    }
}

impl core::fmt::Display for HintErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnexpectedEndOfBytecode => write!(f, "unexpected end of bytecode"),
            Self::UnhandledOpcode(opcode) => {
                write!(f, "unhandled instruction opcode {:#04x}", opcode.to_u8())
            }
            Self::DefinitionInGlyphProgram => {
                write!(f, "function or instruction definition in glyph program")
            }
            Self::NestedDefinition => write!(f, "nested function or instruction definition"),
            Self::DefinitionTooLarge => {
                write!(f, "function or instruction definition larger than 64k")
            }
            Self::TooManyDefinitions => write!(f, "too many function or instruction definitions"),
            Self::InvalidDefinition(key) => {
                write!(f, "function or instruction definition {key} not found")
            }
            Self::ValueStackOverflow => write!(f, "value stack overflow"),
            Self::ValueStackUnderflow => write!(f, "value stack underflow"),
            Self::CallStackOverflow => write!(f, "call stack overflow"),
            Self::CallStackUnderflow => write!(f, "call stack underflow"),
            Self::InvalidStackValue(value) => {
                write!(f, "stack value {value} is invalid for this instruction")
            }
            Self::InvalidPointIndex(index) => write!(f, "point index {index} was out of bounds"),
            Self::InvalidPointRange(start, end) => {
                write!(f, "point range {start}..{end} was out of bounds")
            }
            Self::InvalidContourIndex(index) => {
                write!(f, "contour index {index} was out of bounds")
            }
            Self::InvalidCvtIndex(index) => write!(f, "cvt index {index} was out of bounds"),
            Self::InvalidStorageIndex(index) => {
                write!(f, "storage index {index} was out of bounds")
            }
            Self::DivideByZero => write!(f, "attempt to divide by 0"),
            Self::InvalidZoneIndex(index) => {
                write!(f, "zone index {index} is invalid (expected 0 or 1)")
            }
            Self::NegativeLoopCounter => write!(f, "attempt to set a negative loop counter"),
            Self::InvalidJump => write!(f, "jump target was invalid"),
            Self::ExceededExecutionBudget => write!(f, "too many instructions executed"),
        }
    }
}

/// Interpreter error with the location where it occurred.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct HintError {
    pub program: Program,
    pub pc: usize,
    pub opcode: Option<Opcode>,
    pub kind: HintErrorKind,
}

impl core::fmt::Display for HintError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let program = match self.program {
            Program::Font => "fpgm",
            Program::ControlValue => "prep",
            Program::Glyph => "glyf",
        };
        let (name, colon) = match self.opcode {
            Some(opcode) => (opcode.name(), ":"),
            None => ("", ""),
        };
        write!(f, "{program}@{}:{name}{colon} {}", self.pc, self.kind)
    }
}

impl std::error::Error for HintError {}

/// Errors reported by the hinting layer.
///
/// Everything except [`HintingError::AllocationFailure`] is recoverable: the
/// affected glyph or size falls back to unhinted outlines unless pedantic
/// mode is enabled.
#[derive(Copy, Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum HintingError {
    /// A zone or table could not grow to the requested size.
    #[error("failed to allocate hinting buffers")]
    AllocationFailure,
    /// Malformed or invalid bytecode.
    #[error("invalid bytecode: {0}")]
    InterpreterError(HintError),
    /// Bytecode referred to a point, contour, table entry or definition that
    /// does not exist.
    #[error("index out of range: {0}")]
    IndexOutOfRange(HintError),
    /// The instruction budget was exhausted.
    #[error("execution budget exhausted: {0}")]
    ExecutionTimeout(HintError),
    /// An outline was submitted to a size that has no metrics yet.
    #[error("size has not been prepared for hinting")]
    SizeNotReady,
}

impl HintingError {
    /// Returns true if the error must abort the current render.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AllocationFailure)
    }

    /// Returns the underlying interpreter error, if any.
    pub fn hint_error(&self) -> Option<&HintError> {
        match self {
            Self::AllocationFailure | Self::SizeNotReady => None,
            Self::InterpreterError(e) | Self::IndexOutOfRange(e) | Self::ExecutionTimeout(e) => {
                Some(e)
            }
        }
    }
}

impl From<HintError> for HintingError {
    fn from(value: HintError) -> Self {
        if value.kind == HintErrorKind::ExceededExecutionBudget {
            Self::ExecutionTimeout(value)
        } else if value.kind.is_out_of_range() {
            Self::IndexOutOfRange(value)
        } else {
            Self::InterpreterError(value)
        }
    }
}
