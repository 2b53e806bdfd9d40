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
use crate::{
    address::Address,
    cpu_common::{OperandType, Register16},
    mnemonic::Mnemonic,
};
use std::fmt::{Display, Formatter};

/// One decoded instruction. Owns every byte consumed from its start address
/// (prefixes included), so the reported length and the rendered text can
/// never disagree. Immutable after construction; the segment override, if
/// any, is set once at decode time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    pub mnemonic: Mnemonic,
    pub bytes: Vec<u8>,
    pub operand1: OperandType,
    pub operand2: OperandType,
    pub segment_override: Option<Register16>,
    pub rep_prefix: bool,
}

impl Default for Instruction {
    fn default() -> Self {
        Self {
            opcode: 0,
            mnemonic: Mnemonic::Invalid,
            bytes: Vec::new(),
            operand1: OperandType::NoOperand,
            operand2: OperandType::NoOperand,
            segment_override: None,
            rep_prefix: false,
        }
    }
}

impl Instruction {
    /// Byte length: exactly the bytes consumed from the start address.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn has_operands(&self) -> bool {
        self.operand1 != OperandType::NoOperand || self.operand2 != OperandType::NoOperand
    }

    /// True if fall-through execution is not assumed after this instruction:
    /// returns in all forms and the unconditional short jump. Near/far
    /// unconditional jumps and HLT are deliberately not terminators here,
    /// matching the traversal's documented scope.
    pub fn is_flow_terminator(&self) -> bool {
        self.mnemonic.is_return()
            || (self.mnemonic == Mnemonic::JMP
                && matches!(self.operand1, OperandType::Relative8(_)))
    }

    /// The statically known control-transfer target followed by the
    /// traversal: an immediate far call's segment:offset, or the
    /// displacement-relative target of a near call or short jump. Indirect
    /// transfers, conditional jumps, near/far unconditional jumps, LOOP and
    /// JCXZ yield no target.
    pub fn branch_target(&self, address: Address) -> Option<Address> {
        match (self.mnemonic, self.operand1) {
            (Mnemonic::CALLF, OperandType::FarPointer16(segment, offset)) => {
                Some(Address::new(segment, offset))
            }
            (Mnemonic::CALL, OperandType::Relative16(disp)) => {
                Some(address + (self.len() as i32 + disp as i32))
            }
            (Mnemonic::JMP, OperandType::Relative8(disp)) => {
                Some(address + (self.len() as i32 + disp as i32))
            }
            _ => None,
        }
    }

    /// True for instruction kinds that carry a segment slot: anything with
    /// an explicit or implicit memory operand, plus far-pointer transfers
    /// and XLAT.
    pub fn accepts_segment_override(&self) -> bool {
        self.operand1.is_memory()
            || self.operand2.is_memory()
            || matches!(self.operand1, OperandType::FarPointer16(..))
            || self.mnemonic == Mnemonic::XLAT
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = crate::formatter::format_instruction(self, &Default::default());
        f.write_str(&text)
    }
}
