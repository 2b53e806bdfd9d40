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

    ---------------------------------------------------------------------------

    decode.rs

    Opcode fetch and instruction decoding for the 8086/8088 subset.

    Dispatch is a single static template table: 256 one-byte opcode rows
    followed by eight-entry extension blocks for each group opcode, selected
    by the modrm 'reg' field. Prefix bytes (segment overrides and REP) are
    consumed in a loop ahead of dispatch and attached to the instruction at
    construction.
*/
use crate::{
    byte_reader::ByteReader,
    cpu_common::{
        Displacement, OperandSize, OperandType, Register16, Register8, REGISTER16_LUT,
        REGISTER8_LUT,
    },
    error::DecodeError,
    instruction::Instruction,
    mnemonic::Mnemonic,
    modrm16::ModRmByte16,
};
use std::io::{self, Cursor};

#[derive(Copy, Clone)]
pub struct InstTemplate {
    pub grp: u8,
    pub mnemonic: Mnemonic,
    pub operand1: OperandTemplate,
    pub operand2: OperandTemplate,
}

impl InstTemplate {
    pub(crate) const fn constdefault() -> Self {
        Self {
            grp: 0,
            mnemonic: Mnemonic::Invalid,
            operand1: OperandTemplate::NoOperand,
            operand2: OperandTemplate::NoOperand,
        }
    }

    fn uses_modrm(&self) -> bool {
        self.grp != 0 || self.operand1.uses_modrm() || self.operand2.uses_modrm()
    }
}

#[derive(Copy, Clone, Default, PartialEq)]
pub enum OperandTemplate {
    #[default]
    NoOperand,
    ModRM8,
    ModRM16,
    Register8,
    Register16,
    SegmentRegister,
    Register8Encoded,
    Register16Encoded,
    Immediate8,
    Immediate16,
    Immediate8SignExtended,
    Relative8,
    Relative16,
    Offset8,
    Offset16,
    FixedRegister8(Register8),
    FixedRegister16(Register16),
    Constant1,
    StringSrc8,
    StringSrc16,
    FarAddress,
}

impl OperandTemplate {
    fn uses_modrm(&self) -> bool {
        matches!(
            self,
            OperandTemplate::ModRM8
                | OperandTemplate::ModRM16
                | OperandTemplate::Register8
                | OperandTemplate::Register16
                | OperandTemplate::SegmentRegister
        )
    }

    fn resolve_operand(
        &self,
        bytes: &mut impl ByteReader,
        modrm: &Option<ModRmByte16>,
        displacement: Displacement,
        opcode: u8,
        instruction: &mut Instruction,
    ) -> io::Result<OperandType> {
        match self {
            OperandTemplate::ModRM8 => {
                let m = modrm.unwrap();
                match m.is_addressing_mode() {
                    true => Ok(OperandType::AddressingMode16(
                        m.address_offset(displacement),
                        OperandSize::Operand8,
                    )),
                    false => Ok(OperandType::Register8(m.op1_reg8())),
                }
            }
            OperandTemplate::ModRM16 => {
                let m = modrm.unwrap();
                match m.is_addressing_mode() {
                    true => Ok(OperandType::AddressingMode16(
                        m.address_offset(displacement),
                        OperandSize::Operand16,
                    )),
                    false => Ok(OperandType::Register16(m.op1_reg16())),
                }
            }
            OperandTemplate::Register8 => Ok(OperandType::Register8(modrm.unwrap().op2_reg8())),
            OperandTemplate::Register16 => Ok(OperandType::Register16(modrm.unwrap().op2_reg16())),
            OperandTemplate::SegmentRegister => {
                Ok(OperandType::Register16(modrm.unwrap().op2_segment_reg16()))
            }
            OperandTemplate::Register8Encoded => {
                Ok(OperandType::Register8(REGISTER8_LUT[(opcode & 0x07) as usize]))
            }
            OperandTemplate::Register16Encoded => {
                Ok(OperandType::Register16(REGISTER16_LUT[(opcode & 0x07) as usize]))
            }
            OperandTemplate::Immediate8 => {
                let operand = bytes.read_u8()?;
                instruction.bytes.push(operand);
                Ok(OperandType::Immediate8(operand))
            }
            OperandTemplate::Immediate16 => {
                let operand = bytes.read_u16()?;
                instruction.bytes.extend_from_slice(&operand.to_le_bytes());
                Ok(OperandType::Immediate16(operand))
            }
            OperandTemplate::Immediate8SignExtended => {
                let operand = bytes.read_i8()?;
                instruction.bytes.push(operand as u8);
                Ok(OperandType::Immediate8s(operand))
            }
            OperandTemplate::Relative8 => {
                let operand = bytes.read_i8()?;
                instruction.bytes.push(operand as u8);
                Ok(OperandType::Relative8(operand))
            }
            OperandTemplate::Relative16 => {
                let operand = bytes.read_i16()?;
                instruction.bytes.extend_from_slice(&operand.to_le_bytes());
                Ok(OperandType::Relative16(operand))
            }
            OperandTemplate::Offset8 => {
                let operand = bytes.read_u16()?;
                instruction.bytes.extend_from_slice(&operand.to_le_bytes());
                Ok(OperandType::Offset8(operand))
            }
            OperandTemplate::Offset16 => {
                let operand = bytes.read_u16()?;
                instruction.bytes.extend_from_slice(&operand.to_le_bytes());
                Ok(OperandType::Offset16(operand))
            }
            OperandTemplate::FixedRegister8(r8) => Ok(OperandType::Register8(*r8)),
            OperandTemplate::FixedRegister16(r16) => Ok(OperandType::Register16(*r16)),
            OperandTemplate::Constant1 => Ok(OperandType::Immediate8(1)),
            OperandTemplate::StringSrc8 => Ok(OperandType::StringSource(OperandSize::Operand8)),
            OperandTemplate::StringSrc16 => Ok(OperandType::StringSource(OperandSize::Operand16)),
            OperandTemplate::FarAddress => {
                let (segment, offset) = bytes.read_farptr16()?;
                instruction.bytes.extend_from_slice(&offset.to_le_bytes());
                instruction.bytes.extend_from_slice(&segment.to_le_bytes());
                Ok(OperandType::FarPointer16(segment, offset))
            }
            OperandTemplate::NoOperand => Ok(OperandType::NoOperand),
        }
    }
}

type Ot = OperandTemplate;

macro_rules! inst {
    ($opcode:literal, $init:ident, $grp:literal, $m:ident, $o1:expr, $o2:expr) => {
        $init.table[$init.idx] = InstTemplate {
            grp: $grp,
            mnemonic: Mnemonic::$m,
            operand1: $o1,
            operand2: $o2,
        };
        $init.idx += 1;
    };
}

pub const REGULAR_OPS_LEN: usize = 256;
pub const TOTAL_OPS_LEN: usize = REGULAR_OPS_LEN + 12 * 8;

pub struct TableInitializer {
    pub idx:   usize,
    pub table: [InstTemplate; TOTAL_OPS_LEN],
}

impl TableInitializer {
    const fn new() -> Self {
        Self {
            idx:   0,
            table: [InstTemplate::constdefault(); TOTAL_OPS_LEN],
        }
    }
}

#[rustfmt::skip]
pub static DECODE: [InstTemplate; TOTAL_OPS_LEN] = {
    let mut o: TableInitializer = TableInitializer::new();
    inst!( 0x00, o, 0, ADD,     Ot::ModRM8,                             Ot::Register8);
    inst!( 0x01, o, 0, ADD,     Ot::ModRM16,                            Ot::Register16);
    inst!( 0x02, o, 0, ADD,     Ot::Register8,                          Ot::ModRM8);
    inst!( 0x03, o, 0, ADD,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0x04, o, 0, ADD,     Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0x05, o, 0, ADD,     Ot::FixedRegister16(Register16::AX),    Ot::Immediate16);
    inst!( 0x06, o, 0, PUSH,    Ot::FixedRegister16(Register16::ES),    Ot::NoOperand);
    inst!( 0x07, o, 0, POP,     Ot::FixedRegister16(Register16::ES),    Ot::NoOperand);
    inst!( 0x08, o, 0, OR,      Ot::ModRM8,                             Ot::Register8);
    inst!( 0x09, o, 0, OR,      Ot::ModRM16,                            Ot::Register16);
    inst!( 0x0A, o, 0, OR,      Ot::Register8,                          Ot::ModRM8);
    inst!( 0x0B, o, 0, OR,      Ot::Register16,                         Ot::ModRM16);
    inst!( 0x0C, o, 0, OR,      Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0x0D, o, 0, OR,      Ot::FixedRegister16(Register16::AX),    Ot::Immediate16);
    inst!( 0x0E, o, 0, PUSH,    Ot::FixedRegister16(Register16::CS),    Ot::NoOperand);
    inst!( 0x0F, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x10, o, 0, ADC,     Ot::ModRM8,                             Ot::Register8);
    inst!( 0x11, o, 0, ADC,     Ot::ModRM16,                            Ot::Register16);
    inst!( 0x12, o, 0, ADC,     Ot::Register8,                          Ot::ModRM8);
    inst!( 0x13, o, 0, ADC,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0x14, o, 0, ADC,     Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0x15, o, 0, ADC,     Ot::FixedRegister16(Register16::AX),    Ot::Immediate16);
    inst!( 0x16, o, 0, PUSH,    Ot::FixedRegister16(Register16::SS),    Ot::NoOperand);
    inst!( 0x17, o, 0, POP,     Ot::FixedRegister16(Register16::SS),    Ot::NoOperand);
    inst!( 0x18, o, 0, SBB,     Ot::ModRM8,                             Ot::Register8);
    inst!( 0x19, o, 0, SBB,     Ot::ModRM16,                            Ot::Register16);
    inst!( 0x1A, o, 0, SBB,     Ot::Register8,                          Ot::ModRM8);
    inst!( 0x1B, o, 0, SBB,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0x1C, o, 0, SBB,     Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0x1D, o, 0, SBB,     Ot::FixedRegister16(Register16::AX),    Ot::Immediate16);
    inst!( 0x1E, o, 0, PUSH,    Ot::FixedRegister16(Register16::DS),    Ot::NoOperand);
    inst!( 0x1F, o, 0, POP,     Ot::FixedRegister16(Register16::DS),    Ot::NoOperand);
    inst!( 0x20, o, 0, AND,     Ot::ModRM8,                             Ot::Register8);
    inst!( 0x21, o, 0, AND,     Ot::ModRM16,                            Ot::Register16);
    inst!( 0x22, o, 0, AND,     Ot::Register8,                          Ot::ModRM8);
    inst!( 0x23, o, 0, AND,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0x24, o, 0, AND,     Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0x25, o, 0, AND,     Ot::FixedRegister16(Register16::AX),    Ot::Immediate16);
    inst!( 0x26, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand); // es: prefix, consumed before dispatch
    inst!( 0x27, o, 0, DAA,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x28, o, 0, SUB,     Ot::ModRM8,                             Ot::Register8);
    inst!( 0x29, o, 0, SUB,     Ot::ModRM16,                            Ot::Register16);
    inst!( 0x2A, o, 0, SUB,     Ot::Register8,                          Ot::ModRM8);
    inst!( 0x2B, o, 0, SUB,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0x2C, o, 0, SUB,     Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0x2D, o, 0, SUB,     Ot::FixedRegister16(Register16::AX),    Ot::Immediate16);
    inst!( 0x2E, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand); // cs: prefix, consumed before dispatch
    inst!( 0x2F, o, 0, DAS,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x30, o, 0, XOR,     Ot::ModRM8,                             Ot::Register8);
    inst!( 0x31, o, 0, XOR,     Ot::ModRM16,                            Ot::Register16);
    inst!( 0x32, o, 0, XOR,     Ot::Register8,                          Ot::ModRM8);
    inst!( 0x33, o, 0, XOR,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0x34, o, 0, XOR,     Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0x35, o, 0, XOR,     Ot::FixedRegister16(Register16::AX),    Ot::Immediate16);
    inst!( 0x36, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand); // ss: prefix, consumed before dispatch
    inst!( 0x37, o, 0, AAA,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x38, o, 0, CMP,     Ot::ModRM8,                             Ot::Register8);
    inst!( 0x39, o, 0, CMP,     Ot::ModRM16,                            Ot::Register16);
    inst!( 0x3A, o, 0, CMP,     Ot::Register8,                          Ot::ModRM8);
    inst!( 0x3B, o, 0, CMP,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0x3C, o, 0, CMP,     Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0x3D, o, 0, CMP,     Ot::FixedRegister16(Register16::AX),    Ot::Immediate16);
    inst!( 0x3E, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand); // ds: prefix, consumed before dispatch
    inst!( 0x3F, o, 0, AAS,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x40, o, 0, INC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x41, o, 0, INC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x42, o, 0, INC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x43, o, 0, INC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x44, o, 0, INC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x45, o, 0, INC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x46, o, 0, INC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x47, o, 0, INC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x48, o, 0, DEC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x49, o, 0, DEC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x4A, o, 0, DEC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x4B, o, 0, DEC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x4C, o, 0, DEC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x4D, o, 0, DEC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x4E, o, 0, DEC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x4F, o, 0, DEC,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x50, o, 0, PUSH,    Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x51, o, 0, PUSH,    Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x52, o, 0, PUSH,    Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x53, o, 0, PUSH,    Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x54, o, 0, PUSH,    Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x55, o, 0, PUSH,    Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x56, o, 0, PUSH,    Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x57, o, 0, PUSH,    Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x58, o, 0, POP,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x59, o, 0, POP,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x5A, o, 0, POP,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x5B, o, 0, POP,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x5C, o, 0, POP,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x5D, o, 0, POP,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x5E, o, 0, POP,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x5F, o, 0, POP,     Ot::Register16Encoded,                  Ot::NoOperand);
    inst!( 0x60, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x61, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x62, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x63, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x64, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x65, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x66, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x67, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x68, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x69, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x6A, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x6B, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x6C, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x6D, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x6E, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x6F, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x70, o, 0, JO,      Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x71, o, 0, JNO,     Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x72, o, 0, JB,      Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x73, o, 0, JNB,     Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x74, o, 0, JZ,      Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x75, o, 0, JNZ,     Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x76, o, 0, JBE,     Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x77, o, 0, JNBE,    Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x78, o, 0, JS,      Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x79, o, 0, JNS,     Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x7A, o, 0, JP,      Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x7B, o, 0, JNP,     Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x7C, o, 0, JL,      Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x7D, o, 0, JNL,     Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x7E, o, 0, JLE,     Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x7F, o, 0, JNLE,    Ot::Relative8,                          Ot::NoOperand);
    inst!( 0x80, o, 1, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x81, o, 2, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x82, o, 3, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x83, o, 4, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x84, o, 0, TEST,    Ot::ModRM8,                             Ot::Register8);
    inst!( 0x85, o, 0, TEST,    Ot::ModRM16,                            Ot::Register16);
    inst!( 0x86, o, 0, XCHG,    Ot::Register8,                          Ot::ModRM8);
    inst!( 0x87, o, 0, XCHG,    Ot::Register16,                         Ot::ModRM16);
    inst!( 0x88, o, 0, MOV,     Ot::ModRM8,                             Ot::Register8);
    inst!( 0x89, o, 0, MOV,     Ot::ModRM16,                            Ot::Register16);
    inst!( 0x8A, o, 0, MOV,     Ot::Register8,                          Ot::ModRM8);
    inst!( 0x8B, o, 0, MOV,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0x8C, o, 0, MOV,     Ot::ModRM16,                            Ot::SegmentRegister);
    inst!( 0x8D, o, 0, LEA,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0x8E, o, 0, MOV,     Ot::SegmentRegister,                    Ot::ModRM16);
    inst!( 0x8F, o, 0, POP,     Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0x90, o, 0, NOP,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x91, o, 0, XCHG,    Ot::Register16Encoded,                  Ot::FixedRegister16(Register16::AX));
    inst!( 0x92, o, 0, XCHG,    Ot::Register16Encoded,                  Ot::FixedRegister16(Register16::AX));
    inst!( 0x93, o, 0, XCHG,    Ot::Register16Encoded,                  Ot::FixedRegister16(Register16::AX));
    inst!( 0x94, o, 0, XCHG,    Ot::Register16Encoded,                  Ot::FixedRegister16(Register16::AX));
    inst!( 0x95, o, 0, XCHG,    Ot::Register16Encoded,                  Ot::FixedRegister16(Register16::AX));
    inst!( 0x96, o, 0, XCHG,    Ot::Register16Encoded,                  Ot::FixedRegister16(Register16::AX));
    inst!( 0x97, o, 0, XCHG,    Ot::Register16Encoded,                  Ot::FixedRegister16(Register16::AX));
    inst!( 0x98, o, 0, CBW,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x99, o, 0, CWD,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x9A, o, 0, CALLF,   Ot::FarAddress,                         Ot::NoOperand);
    inst!( 0x9B, o, 0, WAIT,    Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x9C, o, 0, PUSHF,   Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x9D, o, 0, POPF,    Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x9E, o, 0, SAHF,    Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0x9F, o, 0, LAHF,    Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xA0, o, 0, MOV,     Ot::FixedRegister8(Register8::AL),      Ot::Offset8);
    inst!( 0xA1, o, 0, MOV,     Ot::FixedRegister16(Register16::AX),    Ot::Offset16);
    inst!( 0xA2, o, 0, MOV,     Ot::Offset8,                            Ot::FixedRegister8(Register8::AL));
    inst!( 0xA3, o, 0, MOV,     Ot::Offset16,                           Ot::FixedRegister16(Register16::AX));
    inst!( 0xA4, o, 0, MOVSB,   Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xA5, o, 0, MOVSW,   Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xA6, o, 0, CMPSB,   Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xA7, o, 0, CMPSW,   Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xA8, o, 0, TEST,    Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0xA9, o, 0, TEST,    Ot::FixedRegister16(Register16::AX),    Ot::Immediate16);
    inst!( 0xAA, o, 0, STOSB,   Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xAB, o, 0, STOSW,   Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xAC, o, 0, LODS,    Ot::StringSrc8,                         Ot::NoOperand);
    inst!( 0xAD, o, 0, LODS,    Ot::StringSrc16,                        Ot::NoOperand);
    inst!( 0xAE, o, 0, SCASB,   Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xAF, o, 0, SCASW,   Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xB0, o, 0, MOV,     Ot::Register8Encoded,                   Ot::Immediate8);
    inst!( 0xB1, o, 0, MOV,     Ot::Register8Encoded,                   Ot::Immediate8);
    inst!( 0xB2, o, 0, MOV,     Ot::Register8Encoded,                   Ot::Immediate8);
    inst!( 0xB3, o, 0, MOV,     Ot::Register8Encoded,                   Ot::Immediate8);
    inst!( 0xB4, o, 0, MOV,     Ot::Register8Encoded,                   Ot::Immediate8);
    inst!( 0xB5, o, 0, MOV,     Ot::Register8Encoded,                   Ot::Immediate8);
    inst!( 0xB6, o, 0, MOV,     Ot::Register8Encoded,                   Ot::Immediate8);
    inst!( 0xB7, o, 0, MOV,     Ot::Register8Encoded,                   Ot::Immediate8);
    inst!( 0xB8, o, 0, MOV,     Ot::Register16Encoded,                  Ot::Immediate16);
    inst!( 0xB9, o, 0, MOV,     Ot::Register16Encoded,                  Ot::Immediate16);
    inst!( 0xBA, o, 0, MOV,     Ot::Register16Encoded,                  Ot::Immediate16);
    inst!( 0xBB, o, 0, MOV,     Ot::Register16Encoded,                  Ot::Immediate16);
    inst!( 0xBC, o, 0, MOV,     Ot::Register16Encoded,                  Ot::Immediate16);
    inst!( 0xBD, o, 0, MOV,     Ot::Register16Encoded,                  Ot::Immediate16);
    inst!( 0xBE, o, 0, MOV,     Ot::Register16Encoded,                  Ot::Immediate16);
    inst!( 0xBF, o, 0, MOV,     Ot::Register16Encoded,                  Ot::Immediate16);
    inst!( 0xC0, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xC1, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xC2, o, 0, RET,     Ot::Immediate16,                        Ot::NoOperand);
    inst!( 0xC3, o, 0, RET,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xC4, o, 0, LES,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0xC5, o, 0, LDS,     Ot::Register16,                         Ot::ModRM16);
    inst!( 0xC6, o, 0, MOV,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0xC7, o, 0, MOV,     Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0xC8, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xC9, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xCA, o, 0, RETF,    Ot::Immediate16,                        Ot::NoOperand);
    inst!( 0xCB, o, 0, RETF,    Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xCC, o, 0, INT3,    Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xCD, o, 0, INT,     Ot::Immediate8,                         Ot::NoOperand);
    inst!( 0xCE, o, 0, INTO,    Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xCF, o, 0, IRET,    Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xD0, o, 5, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xD1, o, 6, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xD2, o, 7, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xD3, o, 8, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xD4, o, 0, AAM,     Ot::Immediate8,                         Ot::NoOperand);
    inst!( 0xD5, o, 0, AAD,     Ot::Immediate8,                         Ot::NoOperand);
    inst!( 0xD6, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xD7, o, 0, XLAT,    Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xD8, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xD9, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xDA, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xDB, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xDC, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xDD, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xDE, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xDF, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xE0, o, 0, LOOPNE,  Ot::Relative8,                          Ot::NoOperand);
    inst!( 0xE1, o, 0, LOOPE,   Ot::Relative8,                          Ot::NoOperand);
    inst!( 0xE2, o, 0, LOOP,    Ot::Relative8,                          Ot::NoOperand);
    inst!( 0xE3, o, 0, JCXZ,    Ot::Relative8,                          Ot::NoOperand);
    inst!( 0xE4, o, 0, IN,      Ot::FixedRegister8(Register8::AL),      Ot::Immediate8);
    inst!( 0xE5, o, 0, IN,      Ot::FixedRegister16(Register16::AX),    Ot::Immediate8);
    inst!( 0xE6, o, 0, OUT,     Ot::Immediate8,                         Ot::FixedRegister8(Register8::AL));
    inst!( 0xE7, o, 0, OUT,     Ot::Immediate8,                         Ot::FixedRegister16(Register16::AX));
    inst!( 0xE8, o, 0, CALL,    Ot::Relative16,                         Ot::NoOperand);
    inst!( 0xE9, o, 0, JMP,     Ot::Relative16,                         Ot::NoOperand);
    inst!( 0xEA, o, 0, JMPF,    Ot::FarAddress,                         Ot::NoOperand);
    inst!( 0xEB, o, 0, JMP,     Ot::Relative8,                          Ot::NoOperand);
    inst!( 0xEC, o, 0, IN,      Ot::FixedRegister8(Register8::AL),      Ot::FixedRegister16(Register16::DX));
    inst!( 0xED, o, 0, IN,      Ot::FixedRegister16(Register16::AX),    Ot::FixedRegister16(Register16::DX));
    inst!( 0xEE, o, 0, OUT,     Ot::FixedRegister16(Register16::DX),    Ot::FixedRegister8(Register8::AL));
    inst!( 0xEF, o, 0, OUT,     Ot::FixedRegister16(Register16::DX),    Ot::FixedRegister16(Register16::AX));
    inst!( 0xF0, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xF1, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xF2, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xF3, o, 0, Invalid, Ot::NoOperand,                          Ot::NoOperand); // rep prefix, consumed before dispatch
    inst!( 0xF4, o, 0, HLT,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xF5, o, 0, CMC,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xF6, o, 9, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xF7, o,10, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xF8, o, 0, CLC,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xF9, o, 0, STC,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFA, o, 0, CLI,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFB, o, 0, STI,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFC, o, 0, CLD,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFD, o, 0, STD,     Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFE, o,11, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFF, o,12, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    // Group 0x80: r/m8, imm8
    inst!( 0x80, o, 1, ADD,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x80, o, 1, OR,      Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x80, o, 1, ADC,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x80, o, 1, SBB,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x80, o, 1, AND,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x80, o, 1, SUB,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x80, o, 1, XOR,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x80, o, 1, CMP,     Ot::ModRM8,                             Ot::Immediate8);
    // Group 0x81: r/m16, imm16
    inst!( 0x81, o, 2, ADD,     Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0x81, o, 2, OR,      Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0x81, o, 2, ADC,     Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0x81, o, 2, SBB,     Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0x81, o, 2, AND,     Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0x81, o, 2, SUB,     Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0x81, o, 2, XOR,     Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0x81, o, 2, CMP,     Ot::ModRM16,                            Ot::Immediate16);
    // Group 0x82: alias of 0x80 on the 8086
    inst!( 0x82, o, 3, ADD,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x82, o, 3, OR,      Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x82, o, 3, ADC,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x82, o, 3, SBB,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x82, o, 3, AND,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x82, o, 3, SUB,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x82, o, 3, XOR,     Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0x82, o, 3, CMP,     Ot::ModRM8,                             Ot::Immediate8);
    // Group 0x83: r/m16, sign-extended imm8
    inst!( 0x83, o, 4, ADD,     Ot::ModRM16,                            Ot::Immediate8SignExtended);
    inst!( 0x83, o, 4, OR,      Ot::ModRM16,                            Ot::Immediate8SignExtended);
    inst!( 0x83, o, 4, ADC,     Ot::ModRM16,                            Ot::Immediate8SignExtended);
    inst!( 0x83, o, 4, SBB,     Ot::ModRM16,                            Ot::Immediate8SignExtended);
    inst!( 0x83, o, 4, AND,     Ot::ModRM16,                            Ot::Immediate8SignExtended);
    inst!( 0x83, o, 4, SUB,     Ot::ModRM16,                            Ot::Immediate8SignExtended);
    inst!( 0x83, o, 4, XOR,     Ot::ModRM16,                            Ot::Immediate8SignExtended);
    inst!( 0x83, o, 4, CMP,     Ot::ModRM16,                            Ot::Immediate8SignExtended);
    // Group 0xD0: r/m8 shifted by 1
    inst!( 0xD0, o, 5, ROL,     Ot::ModRM8,                             Ot::Constant1);
    inst!( 0xD0, o, 5, ROR,     Ot::ModRM8,                             Ot::Constant1);
    inst!( 0xD0, o, 5, RCL,     Ot::ModRM8,                             Ot::Constant1);
    inst!( 0xD0, o, 5, RCR,     Ot::ModRM8,                             Ot::Constant1);
    inst!( 0xD0, o, 5, SHL,     Ot::ModRM8,                             Ot::Constant1);
    inst!( 0xD0, o, 5, SHR,     Ot::ModRM8,                             Ot::Constant1);
    inst!( 0xD0, o, 5, SHL,     Ot::ModRM8,                             Ot::Constant1);
    inst!( 0xD0, o, 5, SAR,     Ot::ModRM8,                             Ot::Constant1);
    // Group 0xD1: r/m16 shifted by 1
    inst!( 0xD1, o, 6, ROL,     Ot::ModRM16,                            Ot::Constant1);
    inst!( 0xD1, o, 6, ROR,     Ot::ModRM16,                            Ot::Constant1);
    inst!( 0xD1, o, 6, RCL,     Ot::ModRM16,                            Ot::Constant1);
    inst!( 0xD1, o, 6, RCR,     Ot::ModRM16,                            Ot::Constant1);
    inst!( 0xD1, o, 6, SHL,     Ot::ModRM16,                            Ot::Constant1);
    inst!( 0xD1, o, 6, SHR,     Ot::ModRM16,                            Ot::Constant1);
    inst!( 0xD1, o, 6, SHL,     Ot::ModRM16,                            Ot::Constant1);
    inst!( 0xD1, o, 6, SAR,     Ot::ModRM16,                            Ot::Constant1);
    // Group 0xD2: r/m8 shifted by cl
    inst!( 0xD2, o, 7, ROL,     Ot::ModRM8,                             Ot::FixedRegister8(Register8::CL));
    inst!( 0xD2, o, 7, ROR,     Ot::ModRM8,                             Ot::FixedRegister8(Register8::CL));
    inst!( 0xD2, o, 7, RCL,     Ot::ModRM8,                             Ot::FixedRegister8(Register8::CL));
    inst!( 0xD2, o, 7, RCR,     Ot::ModRM8,                             Ot::FixedRegister8(Register8::CL));
    inst!( 0xD2, o, 7, SHL,     Ot::ModRM8,                             Ot::FixedRegister8(Register8::CL));
    inst!( 0xD2, o, 7, SHR,     Ot::ModRM8,                             Ot::FixedRegister8(Register8::CL));
    inst!( 0xD2, o, 7, SHL,     Ot::ModRM8,                             Ot::FixedRegister8(Register8::CL));
    inst!( 0xD2, o, 7, SAR,     Ot::ModRM8,                             Ot::FixedRegister8(Register8::CL));
    // Group 0xD3: r/m16 shifted by cl
    inst!( 0xD3, o, 8, ROL,     Ot::ModRM16,                            Ot::FixedRegister8(Register8::CL));
    inst!( 0xD3, o, 8, ROR,     Ot::ModRM16,                            Ot::FixedRegister8(Register8::CL));
    inst!( 0xD3, o, 8, RCL,     Ot::ModRM16,                            Ot::FixedRegister8(Register8::CL));
    inst!( 0xD3, o, 8, RCR,     Ot::ModRM16,                            Ot::FixedRegister8(Register8::CL));
    inst!( 0xD3, o, 8, SHL,     Ot::ModRM16,                            Ot::FixedRegister8(Register8::CL));
    inst!( 0xD3, o, 8, SHR,     Ot::ModRM16,                            Ot::FixedRegister8(Register8::CL));
    inst!( 0xD3, o, 8, SHL,     Ot::ModRM16,                            Ot::FixedRegister8(Register8::CL));
    inst!( 0xD3, o, 8, SAR,     Ot::ModRM16,                            Ot::FixedRegister8(Register8::CL));
    // Group 0xF6: r/m8 unary/test
    inst!( 0xF6, o, 9, TEST,    Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0xF6, o, 9, TEST,    Ot::ModRM8,                             Ot::Immediate8);
    inst!( 0xF6, o, 9, NOT,     Ot::ModRM8,                             Ot::NoOperand);
    inst!( 0xF6, o, 9, NEG,     Ot::ModRM8,                             Ot::NoOperand);
    inst!( 0xF6, o, 9, MUL,     Ot::ModRM8,                             Ot::NoOperand);
    inst!( 0xF6, o, 9, IMUL,    Ot::ModRM8,                             Ot::NoOperand);
    inst!( 0xF6, o, 9, DIV,     Ot::ModRM8,                             Ot::NoOperand);
    inst!( 0xF6, o, 9, IDIV,    Ot::ModRM8,                             Ot::NoOperand);
    // Group 0xF7: r/m16 unary/test
    inst!( 0xF7, o,10, TEST,    Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0xF7, o,10, TEST,    Ot::ModRM16,                            Ot::Immediate16);
    inst!( 0xF7, o,10, NOT,     Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xF7, o,10, NEG,     Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xF7, o,10, MUL,     Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xF7, o,10, IMUL,    Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xF7, o,10, DIV,     Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xF7, o,10, IDIV,    Ot::ModRM16,                            Ot::NoOperand);
    // Group 0xFE: r/m8 inc/dec; remaining extensions have no decoding
    inst!( 0xFE, o,11, INC,     Ot::ModRM8,                             Ot::NoOperand);
    inst!( 0xFE, o,11, DEC,     Ot::ModRM8,                             Ot::NoOperand);
    inst!( 0xFE, o,11, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFE, o,11, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFE, o,11, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFE, o,11, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFE, o,11, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    inst!( 0xFE, o,11, Invalid, Ot::NoOperand,                          Ot::NoOperand);
    // Group 0xFF: r/m16 inc/dec/call/jmp/push
    inst!( 0xFF, o,12, INC,     Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xFF, o,12, DEC,     Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xFF, o,12, CALL,    Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xFF, o,12, CALLF,   Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xFF, o,12, JMP,     Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xFF, o,12, JMPF,    Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xFF, o,12, PUSH,    Ot::ModRM16,                            Ot::NoOperand);
    inst!( 0xFF, o,12, Invalid, Ot::NoOperand,                          Ot::NoOperand);

    o.table
};

/// Decode one instruction from the reader. Total over the supported
/// 8086/8088 subset; anything else is a [DecodeError]. Consumes exactly the
/// instruction's bytes from the stream.
pub fn decode(bytes: &mut impl ByteReader) -> Result<Instruction, DecodeError> {
    let mut instruction = Instruction::default();

    let mut opcode = bytes.read_u8()?;
    instruction.bytes.push(opcode);

    let mut segment_override = None;
    let mut rep_prefix = false;

    // Consume prefixes until the opcode proper. The last segment override
    // seen wins.
    loop {
        match opcode {
            0x26 => segment_override = Some(Register16::ES),
            0x2E => segment_override = Some(Register16::CS),
            0x36 => segment_override = Some(Register16::SS),
            0x3E => segment_override = Some(Register16::DS),
            0xF3 => rep_prefix = true,
            _ => break,
        }
        opcode = bytes.read_u8()?;
        instruction.bytes.push(opcode);
    }

    instruction.opcode = opcode;
    instruction.segment_override = segment_override;
    instruction.rep_prefix = rep_prefix;

    let mut op_lu = &DECODE[opcode as usize];
    if op_lu.grp == 0 && matches!(op_lu.mnemonic, Mnemonic::Invalid) {
        return Err(DecodeError::UnsupportedOpcode(opcode));
    }

    let mut displacement = Displacement::NoDisp;

    // All group opcodes carry a modrm byte; for the rest it depends on the
    // operand templates.
    let modrm = if op_lu.uses_modrm() {
        let inner_modrm = ModRmByte16::read(bytes, &mut instruction.bytes)?;
        displacement = inner_modrm.displacement();

        if op_lu.grp != 0 {
            // Secondary lookup of opcode group + extension.
            let decode_idx =
                REGULAR_OPS_LEN + (op_lu.grp as usize - 1) * 8 + inner_modrm.op_extension() as usize;
            op_lu = &DECODE[decode_idx];
            if matches!(op_lu.mnemonic, Mnemonic::Invalid) {
                return Err(DecodeError::UnsupportedOpcode(opcode));
            }
        }
        Some(inner_modrm)
    }
    else {
        None
    };

    instruction.operand1 =
        op_lu
            .operand1
            .resolve_operand(bytes, &modrm, displacement, opcode, &mut instruction)?;
    instruction.operand2 =
        op_lu
            .operand2
            .resolve_operand(bytes, &modrm, displacement, opcode, &mut instruction)?;
    instruction.mnemonic = op_lu.mnemonic;

    // A segment override is only legal on kinds with a segment slot.
    if instruction.segment_override.is_some() && !instruction.accepts_segment_override() {
        return Err(DecodeError::MalformedOperand(opcode));
    }

    Ok(instruction)
}

/// Decode the instruction starting at `offset` within `buffer`.
pub fn decode_at(buffer: &[u8], offset: usize) -> Result<Instruction, DecodeError> {
    if offset >= buffer.len() {
        return Err(DecodeError::BufferUnderrun);
    }
    let mut cursor = Cursor::new(&buffer[offset..]);
    decode(&mut cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu_common::AddressOffset16;

    #[test]
    fn decode_reg_reg_direction() {
        let ins = decode_at(&[0x03, 0xC2], 0).expect("decode ok");
        assert_eq!(ins.mnemonic, Mnemonic::ADD);
        assert_eq!(ins.len(), 2);
        assert_eq!(ins.operand1, OperandType::Register16(Register16::AX));
        assert_eq!(ins.operand2, OperandType::Register16(Register16::DX));
    }

    #[test]
    fn decode_consumes_exact_length() {
        let ins = decode_at(&[0x8B, 0x5D, 0x08, 0x90], 0).expect("decode ok");
        assert_eq!(ins.len(), 3);
        assert_eq!(ins.bytes, vec![0x8B, 0x5D, 0x08]);
        assert_eq!(
            ins.operand2,
            OperandType::AddressingMode16(AddressOffset16::DiDisp8(8), OperandSize::Operand16)
        );
    }

    #[test]
    fn decode_group_extension() {
        let ins = decode_at(&[0xF7, 0xE1], 0).expect("decode ok"); // mul cx
        assert_eq!(ins.mnemonic, Mnemonic::MUL);
        assert_eq!(ins.operand1, OperandType::Register16(Register16::CX));
    }

    #[test]
    fn decode_group_hole_is_unsupported() {
        assert_eq!(
            decode_at(&[0xFE, 0xD1], 0), // 0xFE with reg=2
            Err(DecodeError::UnsupportedOpcode(0xFE))
        );
    }

    #[test]
    fn decode_unknown_first_byte() {
        assert_eq!(decode_at(&[0x0F], 0), Err(DecodeError::UnsupportedOpcode(0x0F)));
        assert_eq!(decode_at(&[0x63], 0), Err(DecodeError::UnsupportedOpcode(0x63)));
    }

    #[test]
    fn decode_underrun_is_typed() {
        assert_eq!(decode_at(&[0xB8, 0x01], 0), Err(DecodeError::BufferUnderrun));
        assert_eq!(decode_at(&[], 0), Err(DecodeError::BufferUnderrun));
        assert_eq!(decode_at(&[0x90], 5), Err(DecodeError::BufferUnderrun));
    }

    #[test]
    fn segment_prefix_sets_override_once() {
        let ins = decode_at(&[0x26, 0xA1, 0x02, 0x00], 0).expect("decode ok");
        assert_eq!(ins.segment_override, Some(Register16::ES));
        assert_eq!(ins.len(), 4);
        assert_eq!(ins.operand2, OperandType::Offset16(2));
    }

    #[test]
    fn segment_prefix_without_slot_is_malformed() {
        assert_eq!(
            decode_at(&[0x26, 0x90], 0), // es: nop
            Err(DecodeError::MalformedOperand(0x90))
        );
    }

    #[test]
    fn rep_prefix_wraps_string_op() {
        let ins = decode_at(&[0xF3, 0xAA], 0).expect("decode ok");
        assert!(ins.rep_prefix);
        assert_eq!(ins.mnemonic, Mnemonic::STOSB);
        assert_eq!(ins.len(), 2);
    }

    #[test]
    fn signed_near_call_displacement() {
        let ins = decode_at(&[0xE8, 0x9F, 0xF8], 0).expect("decode ok");
        assert_eq!(ins.mnemonic, Mnemonic::CALL);
        assert_eq!(ins.operand1, OperandType::Relative16(-1889));
        assert_eq!(ins.len(), 3);
    }

    #[test]
    fn far_call_operand_order() {
        let ins = decode_at(&[0x9A, 0x00, 0x00, 0xBB, 0x15], 0).expect("decode ok");
        assert_eq!(ins.mnemonic, Mnemonic::CALLF);
        assert_eq!(ins.operand1, OperandType::FarPointer16(0x15BB, 0x0000));
        assert_eq!(ins.len(), 5);
    }
}
