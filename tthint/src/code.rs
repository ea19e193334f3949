//! TrueType bytecode decoding.

use super::error::HintErrorKind;

/// Describes the type of bytecode.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
#[repr(u8)]
pub enum Program {
    /// Program that initializes the function and instruction tables. Stored
    /// in the `fpgm` table.
    #[default]
    Font = 0,
    /// Program that initializes CVT and storage based on font size and other
    /// parameters. Stored in the `prep` table.
    ControlValue = 1,
    /// Glyph specified program. Stored in the `glyf` table.
    Glyph = 2,
}

/// A TrueType instruction opcode.
///
/// Every byte is a valid opcode value; the ones without an assigned
/// instruction are dispatched to instruction definitions.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Opcode(u8);

impl Opcode {
    pub const SVTCA0: Self = Self(0x00);
    pub const SVTCA1: Self = Self(0x01);
    pub const SPVTCA0: Self = Self(0x02);
    pub const SPVTCA1: Self = Self(0x03);
    pub const SFVTCA0: Self = Self(0x04);
    pub const SFVTCA1: Self = Self(0x05);
    pub const SPVTL0: Self = Self(0x06);
    pub const SPVTL1: Self = Self(0x07);
    pub const SFVTL0: Self = Self(0x08);
    pub const SFVTL1: Self = Self(0x09);
    pub const SPVFS: Self = Self(0x0A);
    pub const SFVFS: Self = Self(0x0B);
    pub const GPV: Self = Self(0x0C);
    pub const GFV: Self = Self(0x0D);
    pub const SFVTPV: Self = Self(0x0E);
    pub const ISECT: Self = Self(0x0F);
    pub const SRP0: Self = Self(0x10);
    pub const SRP1: Self = Self(0x11);
    pub const SRP2: Self = Self(0x12);
    pub const SZP0: Self = Self(0x13);
    pub const SZP1: Self = Self(0x14);
    pub const SZP2: Self = Self(0x15);
    pub const SZPS: Self = Self(0x16);
    pub const SLOOP: Self = Self(0x17);
    pub const RTG: Self = Self(0x18);
    pub const RTHG: Self = Self(0x19);
    pub const SMD: Self = Self(0x1A);
    pub const ELSE: Self = Self(0x1B);
    pub const JMPR: Self = Self(0x1C);
    pub const SCVTCI: Self = Self(0x1D);
    pub const SSWCI: Self = Self(0x1E);
    pub const SSW: Self = Self(0x1F);
    pub const DUP: Self = Self(0x20);
    pub const POP: Self = Self(0x21);
    pub const CLEAR: Self = Self(0x22);
    pub const SWAP: Self = Self(0x23);
    pub const DEPTH: Self = Self(0x24);
    pub const CINDEX: Self = Self(0x25);
    pub const MINDEX: Self = Self(0x26);
    pub const ALIGNPTS: Self = Self(0x27);
    pub const UTP: Self = Self(0x29);
    pub const LOOPCALL: Self = Self(0x2A);
    pub const CALL: Self = Self(0x2B);
    pub const FDEF: Self = Self(0x2C);
    pub const ENDF: Self = Self(0x2D);
    pub const MDAP0: Self = Self(0x2E);
    pub const MDAP1: Self = Self(0x2F);
    pub const IUP0: Self = Self(0x30);
    pub const IUP1: Self = Self(0x31);
    pub const SHP0: Self = Self(0x32);
    pub const SHP1: Self = Self(0x33);
    pub const SHC0: Self = Self(0x34);
    pub const SHC1: Self = Self(0x35);
    pub const SHZ0: Self = Self(0x36);
    pub const SHZ1: Self = Self(0x37);
    pub const SHPIX: Self = Self(0x38);
    pub const IP: Self = Self(0x39);
    pub const MSIRP0: Self = Self(0x3A);
    pub const MSIRP1: Self = Self(0x3B);
    pub const ALIGNRP: Self = Self(0x3C);
    pub const RTDG: Self = Self(0x3D);
    pub const MIAP0: Self = Self(0x3E);
    pub const MIAP1: Self = Self(0x3F);
    pub const NPUSHB: Self = Self(0x40);
    pub const NPUSHW: Self = Self(0x41);
    pub const WS: Self = Self(0x42);
    pub const RS: Self = Self(0x43);
    pub const WCVTP: Self = Self(0x44);
    pub const RCVT: Self = Self(0x45);
    pub const GC0: Self = Self(0x46);
    pub const GC1: Self = Self(0x47);
    pub const SCFS: Self = Self(0x48);
    pub const MD0: Self = Self(0x49);
    pub const MD1: Self = Self(0x4A);
    pub const MPPEM: Self = Self(0x4B);
    pub const MPS: Self = Self(0x4C);
    pub const FLIPON: Self = Self(0x4D);
    pub const FLIPOFF: Self = Self(0x4E);
    pub const DEBUG: Self = Self(0x4F);
    pub const LT: Self = Self(0x50);
    pub const LTEQ: Self = Self(0x51);
    pub const GT: Self = Self(0x52);
    pub const GTEQ: Self = Self(0x53);
    pub const EQ: Self = Self(0x54);
    pub const NEQ: Self = Self(0x55);
    pub const ODD: Self = Self(0x56);
    pub const EVEN: Self = Self(0x57);
    pub const IF: Self = Self(0x58);
    pub const EIF: Self = Self(0x59);
    pub const AND: Self = Self(0x5A);
    pub const OR: Self = Self(0x5B);
    pub const NOT: Self = Self(0x5C);
    pub const DELTAP1: Self = Self(0x5D);
    pub const SDB: Self = Self(0x5E);
    pub const SDS: Self = Self(0x5F);
    pub const ADD: Self = Self(0x60);
    pub const SUB: Self = Self(0x61);
    pub const DIV: Self = Self(0x62);
    pub const MUL: Self = Self(0x63);
    pub const ABS: Self = Self(0x64);
    pub const NEG: Self = Self(0x65);
    pub const FLOOR: Self = Self(0x66);
    pub const CEILING: Self = Self(0x67);
    pub const ROUND00: Self = Self(0x68);
    pub const ROUND11: Self = Self(0x6B);
    pub const NROUND00: Self = Self(0x6C);
    pub const NROUND11: Self = Self(0x6F);
    pub const WCVTF: Self = Self(0x70);
    pub const DELTAP2: Self = Self(0x71);
    pub const DELTAP3: Self = Self(0x72);
    pub const DELTAC1: Self = Self(0x73);
    pub const DELTAC2: Self = Self(0x74);
    pub const DELTAC3: Self = Self(0x75);
    pub const SROUND: Self = Self(0x76);
    pub const S45ROUND: Self = Self(0x77);
    pub const JROT: Self = Self(0x78);
    pub const JROF: Self = Self(0x79);
    pub const ROFF: Self = Self(0x7A);
    pub const RUTG: Self = Self(0x7C);
    pub const RDTG: Self = Self(0x7D);
    pub const SANGW: Self = Self(0x7E);
    pub const AA: Self = Self(0x7F);
    pub const FLIPPT: Self = Self(0x80);
    pub const FLIPRGON: Self = Self(0x81);
    pub const FLIPRGOFF: Self = Self(0x82);
    pub const SCANCTRL: Self = Self(0x85);
    pub const SDPVTL0: Self = Self(0x86);
    pub const SDPVTL1: Self = Self(0x87);
    pub const GETINFO: Self = Self(0x88);
    pub const IDEF: Self = Self(0x89);
    pub const ROLL: Self = Self(0x8A);
    pub const MAX: Self = Self(0x8B);
    pub const MIN: Self = Self(0x8C);
    pub const SCANTYPE: Self = Self(0x8D);
    pub const INSTCTRL: Self = Self(0x8E);
    pub const GETVARIATION: Self = Self(0x91);
    pub const GETDATA: Self = Self(0x92);
    pub const PUSHB000: Self = Self(0xB0);
    pub const PUSHB111: Self = Self(0xB7);
    pub const PUSHW000: Self = Self(0xB8);
    pub const PUSHW111: Self = Self(0xBF);
    pub const MDRP00000: Self = Self(0xC0);
    pub const MDRP11111: Self = Self(0xDF);
    pub const MIRP00000: Self = Self(0xE0);
    pub const MIRP11111: Self = Self(0xFF);

    /// Creates an opcode from a raw byte.
    pub const fn from_u8(byte: u8) -> Self {
        Self(byte)
    }

    /// Returns the raw byte value.
    pub const fn to_u8(self) -> u8 {
        self.0
    }

    /// Returns true for the opcodes that push inline operands.
    pub const fn is_push(self) -> bool {
        matches!(self.0, 0x40 | 0x41 | 0xB0..=0xBF)
    }

    /// Returns true if inline operands are 16-bit words.
    pub const fn is_push_words(self) -> bool {
        matches!(self.0, 0x41 | 0xB8..=0xBF)
    }

    /// Returns the encoded length of the instruction including inline
    /// operands.
    ///
    /// For `NPUSHB` and `NPUSHW`, the result is negative and its magnitude is
    /// the size of each operand; the operand count follows the opcode.
    pub const fn encoded_len(self) -> i32 {
        match self.0 {
            0x40 => -1,
            0x41 => -2,
            // PUSHB[abc]: 1 + (abc + 1) bytes
            0xB0..=0xB7 => 2 + (self.0 - 0xB0) as i32,
            // PUSHW[abc]: 1 + 2 * (abc + 1) bytes
            0xB8..=0xBF => 3 + 2 * (self.0 - 0xB8) as i32,
            _ => 1,
        }
    }

    /// Returns the mnemonic for the instruction.
    ///
    /// Opcode families that encode flags in their low bits (such as `MIRP`)
    /// share a single name.
    pub const fn name(self) -> &'static str {
        match self.0 {
            0x00..=0x01 => "SVTCA",
            0x02..=0x03 => "SPVTCA",
            0x04..=0x05 => "SFVTCA",
            0x06..=0x07 => "SPVTL",
            0x08..=0x09 => "SFVTL",
            0x0A => "SPVFS",
            0x0B => "SFVFS",
            0x0C => "GPV",
            0x0D => "GFV",
            0x0E => "SFVTPV",
            0x0F => "ISECT",
            0x10 => "SRP0",
            0x11 => "SRP1",
            0x12 => "SRP2",
            0x13 => "SZP0",
            0x14 => "SZP1",
            0x15 => "SZP2",
            0x16 => "SZPS",
            0x17 => "SLOOP",
            0x18 => "RTG",
            0x19 => "RTHG",
            0x1A => "SMD",
            0x1B => "ELSE",
            0x1C => "JMPR",
            0x1D => "SCVTCI",
            0x1E => "SSWCI",
            0x1F => "SSW",
            0x20 => "DUP",
            0x21 => "POP",
            0x22 => "CLEAR",
            0x23 => "SWAP",
            0x24 => "DEPTH",
            0x25 => "CINDEX",
            0x26 => "MINDEX",
            0x27 => "ALIGNPTS",
            0x29 => "UTP",
            0x2A => "LOOPCALL",
            0x2B => "CALL",
            0x2C => "FDEF",
            0x2D => "ENDF",
            0x2E..=0x2F => "MDAP",
            0x30..=0x31 => "IUP",
            0x32..=0x33 => "SHP",
            0x34..=0x35 => "SHC",
            0x36..=0x37 => "SHZ",
            0x38 => "SHPIX",
            0x39 => "IP",
            0x3A..=0x3B => "MSIRP",
            0x3C => "ALIGNRP",
            0x3D => "RTDG",
            0x3E..=0x3F => "MIAP",
            0x40 => "NPUSHB",
            0x41 => "NPUSHW",
            0x42 => "WS",
            0x43 => "RS",
            0x44 => "WCVTP",
            0x45 => "RCVT",
            0x46..=0x47 => "GC",
            0x48 => "SCFS",
            0x49..=0x4A => "MD",
            0x4B => "MPPEM",
            0x4C => "MPS",
            0x4D => "FLIPON",
            0x4E => "FLIPOFF",
            0x4F => "DEBUG",
            0x50 => "LT",
            0x51 => "LTEQ",
            0x52 => "GT",
            0x53 => "GTEQ",
            0x54 => "EQ",
            0x55 => "NEQ",
            0x56 => "ODD",
            0x57 => "EVEN",
            0x58 => "IF",
            0x59 => "EIF",
            0x5A => "AND",
            0x5B => "OR",
            0x5C => "NOT",
            0x5D => "DELTAP1",
            0x5E => "SDB",
            0x5F => "SDS",
            0x60 => "ADD",
            0x61 => "SUB",
            0x62 => "DIV",
            0x63 => "MUL",
            0x64 => "ABS",
            0x65 => "NEG",
            0x66 => "FLOOR",
            0x67 => "CEILING",
            0x68..=0x6B => "ROUND",
            0x6C..=0x6F => "NROUND",
            0x70 => "WCVTF",
            0x71 => "DELTAP2",
            0x72 => "DELTAP3",
            0x73 => "DELTAC1",
            0x74 => "DELTAC2",
            0x75 => "DELTAC3",
            0x76 => "SROUND",
            0x77 => "S45ROUND",
            0x78 => "JROT",
            0x79 => "JROF",
            0x7A => "ROFF",
            0x7C => "RUTG",
            0x7D => "RDTG",
            0x7E => "SANGW",
            0x7F => "AA",
            0x80 => "FLIPPT",
            0x81 => "FLIPRGON",
            0x82 => "FLIPRGOFF",
            0x85 => "SCANCTRL",
            0x86..=0x87 => "SDPVTL",
            0x88 => "GETINFO",
            0x89 => "IDEF",
            0x8A => "ROLL",
            0x8B => "MAX",
            0x8C => "MIN",
            0x8D => "SCANTYPE",
            0x8E => "INSTCTRL",
            0x91 => "GETVARIATION",
            0x92 => "GETDATA",
            0xB0..=0xB7 => "PUSHB",
            0xB8..=0xBF => "PUSHW",
            0xC0..=0xDF => "MDRP",
            0xE0..=0xFF => "MIRP",
            _ => "UNDEFINED",
        }
    }
}

impl core::fmt::Display for Opcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Operands encoded inline in the instruction stream by the push family.
#[derive(Copy, Clone, Default, Debug)]
pub struct InlineOperands<'a> {
    bytes: &'a [u8],
    is_words: bool,
}

impl<'a> InlineOperands<'a> {
    /// Returns the number of operands.
    pub fn len(&self) -> usize {
        if self.is_words {
            self.bytes.len() / 2
        } else {
            self.bytes.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns an iterator over the operand values. Words are sign
    /// extended, bytes are not.
    pub fn values(&self) -> impl Iterator<Item = i32> + 'a + Clone {
        let (bytes, words) = if self.is_words {
            (&[][..], self.bytes)
        } else {
            (self.bytes, &[][..])
        };
        bytes.iter().map(|byte| *byte as i32).chain(
            words
                .chunks_exact(2)
                .map(|pair| i16::from_be_bytes([pair[0], pair[1]]) as i32),
        )
    }
}

/// Decoded TrueType instruction.
#[derive(Copy, Clone, Debug)]
pub struct Instruction<'a> {
    pub opcode: Opcode,
    pub inline_operands: InlineOperands<'a>,
    /// Offset of the opcode in the bytecode.
    pub pc: usize,
}

impl Instruction<'_> {
    pub fn name(&self) -> &'static str {
        self.opcode.name()
    }
}

/// Decoder for TrueType bytecode.
#[derive(Copy, Clone, Debug)]
pub struct Decoder<'a> {
    pub bytecode: &'a [u8],
    /// Offset of the next instruction.
    pub pc: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytecode: &'a [u8], pc: usize) -> Self {
        Self { bytecode, pc }
    }

    /// Decodes the next instruction.
    ///
    /// Returns `None` at the end of the bytecode stream.
    pub fn maybe_next(&mut self) -> Option<Result<Instruction<'a>, HintErrorKind>> {
        let opcode = Opcode::from_u8(*self.bytecode.get(self.pc)?);
        Some(self.decode(opcode))
    }

    /// Decodes the next instruction, treating the end of the stream as an
    /// error.
    pub fn next(&mut self) -> Result<Instruction<'a>, HintErrorKind> {
        self.maybe_next()
            .unwrap_or(Err(HintErrorKind::UnexpectedEndOfBytecode))
    }

    fn decode(&mut self, opcode: Opcode) -> Result<Instruction<'a>, HintErrorKind> {
        let pc = self.pc;
        let (operands_start, operands_len) = match opcode.encoded_len() {
            len if len < 0 => {
                let count = *self
                    .bytecode
                    .get(pc + 1)
                    .ok_or(HintErrorKind::UnexpectedEndOfBytecode)?
                    as usize;
                (pc + 2, count * (-len) as usize)
            }
            len => (pc + 1, len as usize - 1),
        };
        let operands_end = operands_start + operands_len;
        let bytes = self
            .bytecode
            .get(operands_start..operands_end)
            .ok_or(HintErrorKind::UnexpectedEndOfBytecode)?;
        self.pc = operands_end;
        Ok(Instruction {
            opcode,
            inline_operands: InlineOperands {
                bytes,
                is_words: opcode.is_push_words(),
            },
            pc,
        })
    }
}
