/*
    mzdasm
    Copyright 2024-2025 mzdasm contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.
*/
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register8 {
    AL,
    CL,
    DL,
    BL,
    AH,
    CH,
    DH,
    BH,
}

impl Display for Register8 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Register8::AL => write!(f, "al"),
            Register8::CL => write!(f, "cl"),
            Register8::DL => write!(f, "dl"),
            Register8::BL => write!(f, "bl"),
            Register8::AH => write!(f, "ah"),
            Register8::CH => write!(f, "ch"),
            Register8::DH => write!(f, "dh"),
            Register8::BH => write!(f, "bh"),
        }
    }
}

pub const REGISTER8_LUT: [Register8; 8] = [
    Register8::AL,
    Register8::CL,
    Register8::DL,
    Register8::BL,
    Register8::AH,
    Register8::CH,
    Register8::DH,
    Register8::BH,
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register16 {
    AX,
    CX,
    DX,
    BX,
    SP,
    BP,
    SI,
    DI,
    ES,
    CS,
    SS,
    DS,
}

impl Register16 {
    #[inline]
    pub fn is_segment(&self) -> bool {
        matches!(self, Register16::ES | Register16::CS | Register16::SS | Register16::DS)
    }
}

pub const REGISTER16_LUT: [Register16; 8] = [
    Register16::AX,
    Register16::CX,
    Register16::DX,
    Register16::BX,
    Register16::SP,
    Register16::BP,
    Register16::SI,
    Register16::DI,
];

// The high bit of the modrm 'reg' field is ignored for segment register
// selection, as on the 8086 itself.
pub const SREGISTER16_LUT: [Register16; 8] = [
    Register16::ES,
    Register16::CS,
    Register16::SS,
    Register16::DS,
    Register16::ES,
    Register16::CS,
    Register16::SS,
    Register16::DS,
];

impl Display for Register16 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Register16::AX => write!(f, "ax"),
            Register16::CX => write!(f, "cx"),
            Register16::DX => write!(f, "dx"),
            Register16::BX => write!(f, "bx"),
            Register16::SP => write!(f, "sp"),
            Register16::BP => write!(f, "bp"),
            Register16::SI => write!(f, "si"),
            Register16::DI => write!(f, "di"),
            Register16::ES => write!(f, "es"),
            Register16::CS => write!(f, "cs"),
            Register16::SS => write!(f, "ss"),
            Register16::DS => write!(f, "ds"),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OperandSize {
    #[default]
    Operand8,
    Operand16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Displacement {
    NoDisp,
    Disp8(i8),
    Disp16(i16),
}

impl Displacement {
    pub fn is_some(&self) -> bool {
        !matches!(self, Displacement::NoDisp)
    }

    pub fn len(&self) -> usize {
        match self {
            Displacement::NoDisp => 0,
            Displacement::Disp8(_) => 1,
            Displacement::Disp16(_) => 2,
        }
    }
}

/// The 16-bit effective-address forms selected by a modrm byte's mod and r/m
/// fields, carrying any loaded displacement. `Direct` is the mod=00, rm=110
/// absolute-address form.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddressOffset16 {
    None,
    BxSi,
    BxDi,
    BpSi,
    BpDi,
    Si,
    Di,
    Direct(u16),
    Bx,
    BxSiDisp8(i8),
    BxDiDisp8(i8),
    BpSiDisp8(i8),
    BpDiDisp8(i8),
    SiDisp8(i8),
    DiDisp8(i8),
    BpDisp8(i8),
    BxDisp8(i8),
    BxSiDisp16(i16),
    BxDiDisp16(i16),
    BpSiDisp16(i16),
    BpDiDisp16(i16),
    SiDisp16(i16),
    DiDisp16(i16),
    BpDisp16(i16),
    BxDisp16(i16),
}

impl AddressOffset16 {
    /// True for the bare-value absolute form, which renders without
    /// brackets.
    pub fn is_direct(&self) -> bool {
        matches!(self, AddressOffset16::Direct(_))
    }
}

/// A fully resolved operand, ready for rendering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OperandType {
    NoOperand,
    Register8(Register8),
    Register16(Register16),
    Immediate8(u8),
    Immediate16(u16),
    /// A sign-extended byte immediate (group 0x83); rendered from the raw
    /// byte.
    Immediate8s(i8),
    /// A signed branch displacement relative to the next instruction.
    Relative8(i8),
    Relative16(i16),
    /// A direct 16-bit address of a byte-sized memory access (moffs8).
    Offset8(u16),
    /// A direct 16-bit address of a word-sized memory access (moffs16).
    Offset16(u16),
    /// An immediate far pointer: (segment, offset).
    FarPointer16(u16, u16),
    AddressingMode16(AddressOffset16, OperandSize),
    /// The implicit `ds:[si]` source of LODS, sized by the opcode.
    StringSource(OperandSize),
}

impl OperandType {
    /// True for operands that reference memory through a segment and can
    /// therefore carry a segment override.
    pub fn is_memory(&self) -> bool {
        matches!(
            self,
            OperandType::AddressingMode16(..)
                | OperandType::Offset8(_)
                | OperandType::Offset16(_)
                | OperandType::StringSource(_)
        )
    }
}
