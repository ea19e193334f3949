//! Hinting configuration.

/// Selects the behavior of the few instructions that differ between
/// interpreter versions.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum InterpreterVersion {
    /// Classic hinting as described by the TrueType specification.
    V35,
    /// Subpixel hinting with backward compatibility for fonts that assume
    /// ClearType rendering.
    #[default]
    V40,
}

impl InterpreterVersion {
    /// Value reported by the `GETINFO` version selector.
    pub fn number(self) -> i32 {
        match self {
            Self::V35 => 35,
            Self::V40 => 40,
        }
    }
}

/// Default ceiling on the number of instructions executed by a single
/// program run.
pub const DEFAULT_MAX_INSTRUCTIONS: usize = 1_000_000;

/// Options that control how hinting programs are executed.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct HintingOptions {
    /// Report every interpreter error instead of falling back to unhinted
    /// outlines, and apply the stricter checks that FreeType enables in
    /// pedantic mode.
    pub pedantic: bool,
    pub interpreter_version: InterpreterVersion,
    /// Instructions allowed per program run before execution is aborted
    /// with a timeout.
    pub max_instructions: usize,
}

impl Default for HintingOptions {
    fn default() -> Self {
        Self {
            pedantic: false,
            interpreter_version: InterpreterVersion::default(),
            max_instructions: DEFAULT_MAX_INSTRUCTIONS,
        }
    }
}

impl HintingOptions {
    pub fn pedantic(mut self, pedantic: bool) -> Self {
        self.pedantic = pedantic;
        self
    }

    pub fn interpreter_version(mut self, version: InterpreterVersion) -> Self {
        self.interpreter_version = version;
        self
    }

    pub fn max_instructions(mut self, max_instructions: usize) -> Self {
        self.max_instructions = max_instructions;
        self
    }
}
