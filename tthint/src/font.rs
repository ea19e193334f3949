//! Hinting programs and limits extracted from a font.

use read_fonts::{
    types::{BigEndian, Tag},
    FontRef, ReadError, TableProvider,
};

/// Tables and `maxp` limits needed to run the hinting programs of a font.
///
/// Limits are stored as declared by the font. The execution context adds
/// the padding that real world fonts rely on.
#[derive(Copy, Clone, Default, Debug)]
pub struct FontPrograms<'a> {
    pub fpgm: &'a [u8],
    pub prep: &'a [u8],
    /// Raw control values in font units.
    pub cvt: &'a [BigEndian<i16>],
    pub units_per_em: u16,
    pub num_glyphs: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_twilight_points: u16,
    pub max_stack_elements: u16,
    pub max_storage: u16,
}

impl<'a> FontPrograms<'a> {
    /// Reads the hinting tables from `font`.
    ///
    /// Only `head` is required. Missing programs are empty and missing
    /// `maxp` limits are zero.
    pub fn new(font: &FontRef<'a>) -> Result<Self, ReadError> {
        let units_per_em = font.head()?.units_per_em();
        let table_bytes = |tag: &[u8; 4]| {
            font.data_for_tag(Tag::new(tag))
                .unwrap_or_default()
                .as_bytes()
        };
        let cvt = font
            .data_for_tag(Tag::new(b"cvt "))
            .and_then(|data| data.read_array(0..data.len() / 2 * 2).ok())
            .unwrap_or_default();
        let mut programs = Self::from_parts(table_bytes(b"fpgm"), table_bytes(b"prep"), cvt, units_per_em);
        if let Ok(maxp) = font.maxp() {
            programs.num_glyphs = maxp.num_glyphs();
            programs.max_function_defs = maxp.max_function_defs().unwrap_or_default();
            programs.max_instruction_defs = maxp.max_instruction_defs().unwrap_or_default();
            programs.max_twilight_points = maxp.max_twilight_points().unwrap_or_default();
            programs.max_stack_elements = maxp.max_stack_elements().unwrap_or_default();
            programs.max_storage = maxp.max_storage().unwrap_or_default();
        }
        Ok(programs)
    }

    /// Creates programs from already decoded tables with all `maxp` limits
    /// set to zero.
    pub fn from_parts(
        fpgm: &'a [u8],
        prep: &'a [u8],
        cvt: &'a [BigEndian<i16>],
        units_per_em: u16,
    ) -> Self {
        Self {
            fpgm,
            prep,
            cvt,
            units_per_em,
            ..Default::default()
        }
    }

    pub fn max_function_defs(mut self, count: u16) -> Self {
        self.max_function_defs = count;
        self
    }

    pub fn max_instruction_defs(mut self, count: u16) -> Self {
        self.max_instruction_defs = count;
        self
    }

    pub fn max_twilight_points(mut self, count: u16) -> Self {
        self.max_twilight_points = count;
        self
    }

    pub fn max_stack_elements(mut self, count: u16) -> Self {
        self.max_stack_elements = count;
        self
    }

    pub fn max_storage(mut self, count: u16) -> Self {
        self.max_storage = count;
        self
    }

    pub fn num_glyphs(mut self, count: u16) -> Self {
        self.num_glyphs = count;
        self
    }
}
