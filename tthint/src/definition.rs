//! Function and instruction definitions.

use core::ops::Range;

use super::{code::Program, error::HintErrorKind};

/// Largest permitted definition body when running in pedantic mode.
pub const MAX_DEFINITION_SIZE: usize = u16::MAX as usize;

/// Location of the body of a function (`FDEF`) or instruction (`IDEF`)
/// definition.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Definition {
    program: Program,
    start: u32,
    end: u32,
    /// Function number or opcode.
    key: i32,
    is_active: bool,
}

impl Definition {
    pub fn new(program: Program, code_range: Range<usize>, key: i32) -> Self {
        Self {
            program,
            // Table lengths are u32 so ranges always fit.
            start: code_range.start as u32,
            end: code_range.end as u32,
            key,
            is_active: true,
        }
    }

    pub fn program(&self) -> Program {
        self.program
    }

    /// Byte range of the body, including the closing `ENDF`.
    pub fn code_range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    pub fn key(&self) -> i32 {
        self.key
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Table of definitions keyed by function number or opcode.
///
/// Only the font and control value programs may add definitions so glyph
/// programs see a shared, read only table.
pub enum DefinitionMap<'a> {
    Ref(&'a [Definition]),
    Mut(&'a mut [Definition]),
}

impl DefinitionMap<'_> {
    /// Finds the slot for a new definition with the given key.
    ///
    /// Redefining an existing key reuses its slot. Keys that fit are stored
    /// at their own index; others take the highest free slot.
    pub fn allocate(&mut self, key: i32) -> Result<&mut Definition, HintErrorKind> {
        let Self::Mut(defs) = self else {
            return Err(HintErrorKind::DefinitionInGlyphProgram);
        };
        let direct = usize::try_from(key)
            .ok()
            .filter(|&ix| {
                defs.get(ix)
                    .is_some_and(|def| !def.is_active() || def.key == key)
            });
        let ix = match direct {
            Some(ix) => ix,
            None => defs
                .iter()
                .rposition(|def| def.is_active() && def.key == key)
                .or_else(|| defs.iter().rposition(|def| !def.is_active()))
                .ok_or(HintErrorKind::TooManyDefinitions)?,
        };
        let def = &mut defs[ix];
        *def = Definition::new(Program::Font, 0..0, key);
        Ok(def)
    }

    /// Returns the active definition with the given key.
    pub fn get(&self, key: i32) -> Result<&Definition, HintErrorKind> {
        let defs = self.as_slice();
        let direct = usize::try_from(key)
            .ok()
            .and_then(|ix| defs.get(ix))
            .filter(|def| def.is_active() && def.key == key);
        direct
            .or_else(|| {
                defs.iter()
                    .rev()
                    .find(|def| def.is_active() && def.key == key)
            })
            .ok_or(HintErrorKind::InvalidDefinition(key as u32 as usize))
    }

    pub fn as_slice(&self) -> &[Definition] {
        match self {
            Self::Ref(defs) => defs,
            Self::Mut(defs) => defs,
        }
    }

    /// Deactivates all definitions if the map is mutable.
    pub fn reset(&mut self) {
        if let Self::Mut(defs) = self {
            defs.fill(Definition::default());
        }
    }
}

/// Function and instruction definition tables for a program run.
pub struct DefinitionState<'a> {
    pub functions: DefinitionMap<'a>,
    pub instructions: DefinitionMap<'a>,
}

impl<'a> DefinitionState<'a> {
    pub fn new(functions: DefinitionMap<'a>, instructions: DefinitionMap<'a>) -> Self {
        Self {
            functions,
            instructions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_and_missing() {
        let mut buf = vec![Definition::default(); 8];
        let mut map = DefinitionMap::Mut(&mut buf);
        for i in 0..8 {
            map.allocate(i).unwrap();
        }
        assert_eq!(
            map.allocate(9).map(|_| ()),
            Err(HintErrorKind::TooManyDefinitions)
        );
        assert_eq!(
            map.get(9).map(|_| ()),
            Err(HintErrorKind::InvalidDefinition(9))
        );
        // Redefinition reuses the slot
        assert!(map.allocate(3).is_ok());
    }

    #[test]
    fn sparse_keys() {
        let mut buf = vec![Definition::default(); 6];
        let mut map = DefinitionMap::Mut(&mut buf);
        // 0 and 1 land on their own index, large and negative keys are
        // placed from the end, 2 is still free at its index.
        for key in [0, 1, 0xB0, -42, 2] {
            map.allocate(key).unwrap();
        }
        let keys: Vec<_> = map
            .as_slice()
            .iter()
            .map(|def| def.is_active().then_some(def.key()))
            .collect();
        assert_eq!(
            keys,
            [Some(0), Some(1), Some(2), None, Some(-42), Some(0xB0)]
        );
        assert_eq!(map.get(-42).map(|def| def.key()), Ok(-42));
        assert_eq!(map.get(0xB0).map(|def| def.key()), Ok(0xB0));
    }

    #[test]
    fn read_only_map() {
        let mut buf = vec![Definition::default(); 2];
        {
            let mut map = DefinitionMap::Mut(&mut buf);
            *map.allocate(1).unwrap() = Definition::new(Program::Font, 4..10, 1);
        }
        let mut map = DefinitionMap::Ref(&buf);
        assert_eq!(map.get(1).map(|def| def.code_range()), Ok(4..10));
        assert_eq!(
            map.allocate(0).map(|_| ()),
            Err(HintErrorKind::DefinitionInGlyphProgram)
        );
        map.reset();
        assert!(map.get(1).is_ok());
    }
}
