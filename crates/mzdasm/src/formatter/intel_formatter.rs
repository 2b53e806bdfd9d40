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
use crate::cpu_common::{AddressOffset16, OperandSize, OperandType, Register16};
use crate::formatter::{Format, FormatOptions, FormatterOutput};
use crate::instruction::Instruction;
use crate::mnemonic::Mnemonic;
use num_traits::PrimInt;
use std::fmt::{Display, UpperHex};

/// Intel-syntax formatter: `mnemonic operand1, operand2`.
///
/// Small values render decimal, larger ones as uppercase hex with an `h`
/// suffix. Byte quantities switch to hex above 8, word quantities above 15.
#[derive(Copy, Clone, Debug, Default)]
pub struct IntelFormatter;

/// Format a byte-sized value: decimal up to 8, `{:02X}h` beyond.
pub fn format_byte_value<T: PrimInt + Display + UpperHex>(value: T) -> String {
    if value <= T::from(8).unwrap() {
        format!("{}", value)
    }
    else {
        format!("{:02X}h", value)
    }
}

/// Format a word-sized value: decimal up to 15, two hex digits below 256,
/// four beyond.
pub fn format_word_value<T: PrimInt + Display + UpperHex>(value: T) -> String {
    if value <= T::from(15).unwrap() {
        format!("{}", value)
    }
    else if value < T::from(256).unwrap() {
        format!("{:02X}h", value)
    }
    else {
        format!("{:04X}h", value)
    }
}

/// Format a byte displacement with an explicit sign, magnitude per the byte
/// rule.
pub fn format_byte_disp(disp: i8) -> String {
    let mag = disp.unsigned_abs();
    if disp < 0 {
        format!("-{}", format_byte_value(mag))
    }
    else {
        format!("+{}", format_byte_value(mag))
    }
}

/// Format a word displacement with an explicit sign, magnitude per the word
/// rule.
pub fn format_word_disp(disp: i16) -> String {
    let mag = disp.unsigned_abs();
    if disp < 0 {
        format!("-{}", format_word_value(mag))
    }
    else {
        format!("+{}", format_word_value(mag))
    }
}

/// Format a signed branch displacement; positive values carry no sign.
pub fn format_signed_word(value: i16) -> String {
    if value < 0 {
        format!("-{}", format_word_value(value.unsigned_abs()))
    }
    else {
        format_word_value(value as u16)
    }
}

impl Format for IntelFormatter {
    fn format_prefixes(&self, inst: &Instruction, _opts: &FormatOptions, out: &mut dyn FormatterOutput) {
        if inst.rep_prefix {
            out.write_prefix("rep");
            out.write_separator(" ");
        }
    }

    fn format_mnemonic(&self, inst: &Instruction, opts: &FormatOptions, out: &mut dyn FormatterOutput) {
        let m = inst.mnemonic.to_str();
        if opts.uppercase_mnemonic {
            out.write_mnemonic(m);
        }
        else {
            out.write_mnemonic(&m.to_ascii_lowercase());
        }
    }

    fn format_operands(&self, inst: &Instruction, opts: &FormatOptions, out: &mut dyn FormatterOutput) {
        self.format_operand(inst, inst.operand1, inst.segment_override, opts, out);
        if !matches!(inst.operand2, OperandType::NoOperand) {
            out.write_separator(", ");
        }
        self.format_operand(inst, inst.operand2, inst.segment_override, opts, out);
    }

    fn operands_suppressed(&self, inst: &Instruction) -> bool {
        match inst.mnemonic {
            Mnemonic::AAM | Mnemonic::AAD => {
                // The default operand for AAD & AAM is 0x0A; it is standard
                // not to display it.
                matches!(inst.operand1, OperandType::Immediate8(0x0A))
            }
            _ => false,
        }
    }
}

impl IntelFormatter {
    /// A bracketed memory operand gets a `byte ptr`/`word ptr` qualifier
    /// when no register operand fixes the size.
    fn needs_size_qualifier(inst: &Instruction) -> bool {
        let register_present = matches!(
            inst.operand1,
            OperandType::Register8(_) | OperandType::Register16(_)
        ) || matches!(
            inst.operand2,
            OperandType::Register8(_) | OperandType::Register16(_)
        );
        !register_present
    }

    fn write_size_qualifier(size: OperandSize, out: &mut dyn FormatterOutput) {
        match size {
            OperandSize::Operand8 => out.write_text("byte ptr "),
            OperandSize::Operand16 => out.write_text("word ptr "),
        }
    }

    fn write_segment_prefix(seg: Option<Register16>, out: &mut dyn FormatterOutput) {
        if let Some(seg) = seg {
            out.write_register(&seg.to_string());
            out.write_symbol(":");
        }
    }

    fn format_address(&self, mode: AddressOffset16, out: &mut dyn FormatterOutput) {
        use AddressOffset16::*;

        // Base and index registers
        match mode {
            None | Direct(_) => {}
            BxSi | BxSiDisp8(_) | BxSiDisp16(_) => {
                out.write_register("bx");
                out.write_symbol("+");
                out.write_register("si");
            }
            BxDi | BxDiDisp8(_) | BxDiDisp16(_) => {
                out.write_register("bx");
                out.write_symbol("+");
                out.write_register("di");
            }
            BpSi | BpSiDisp8(_) | BpSiDisp16(_) => {
                out.write_register("bp");
                out.write_symbol("+");
                out.write_register("si");
            }
            BpDi | BpDiDisp8(_) | BpDiDisp16(_) => {
                out.write_register("bp");
                out.write_symbol("+");
                out.write_register("di");
            }
            Si | SiDisp8(_) | SiDisp16(_) => out.write_register("si"),
            Di | DiDisp8(_) | DiDisp16(_) => out.write_register("di"),
            Bx | BxDisp8(_) | BxDisp16(_) => out.write_register("bx"),
            BpDisp8(_) | BpDisp16(_) => out.write_register("bp"),
        }

        // Displacement
        match mode {
            BxSiDisp8(disp) | BxDiDisp8(disp) | BpSiDisp8(disp) | BpDiDisp8(disp)
            | SiDisp8(disp) | DiDisp8(disp) | BpDisp8(disp) | BxDisp8(disp) => {
                out.write_displacement(&format_byte_disp(disp))
            }
            BxSiDisp16(disp) | BxDiDisp16(disp) | BpSiDisp16(disp) | BpDiDisp16(disp)
            | SiDisp16(disp) | DiDisp16(disp) | BpDisp16(disp) | BxDisp16(disp) => {
                out.write_displacement(&format_word_disp(disp))
            }
            _ => {}
        }
    }

    fn format_operand(
        &self,
        inst: &Instruction,
        operand: OperandType,
        seg_override: Option<Register16>,
        _opts: &FormatOptions,
        out: &mut dyn FormatterOutput,
    ) {
        match operand {
            OperandType::Immediate8(imm) => out.write_immediate(&format_byte_value(imm)),
            OperandType::Immediate16(imm) => out.write_immediate(&format_word_value(imm)),
            OperandType::Immediate8s(imm) => {
                // Sign-extended immediates render from the raw byte.
                out.write_immediate(&format_byte_value(imm as u8))
            }
            OperandType::Relative8(num) => out.write_relative(&format_signed_word(num as i16)),
            OperandType::Relative16(num) => out.write_relative(&format_signed_word(num)),
            OperandType::Offset8(offset) | OperandType::Offset16(offset) => {
                // Direct addresses render as a bare word value.
                Self::write_segment_prefix(seg_override, out);
                out.write_displacement(&format_word_value(offset));
            }
            OperandType::Register8(reg) => out.write_register(&reg.to_string()),
            OperandType::Register16(reg) => out.write_register(&reg.to_string()),
            OperandType::AddressingMode16(mode, size) => {
                if let AddressOffset16::Direct(addr) = mode {
                    Self::write_segment_prefix(seg_override, out);
                    out.write_displacement(&format_word_value(addr));
                }
                else {
                    if Self::needs_size_qualifier(inst) {
                        Self::write_size_qualifier(size, out);
                    }
                    Self::write_segment_prefix(seg_override, out);
                    out.write_symbol("[");
                    self.format_address(mode, out);
                    out.write_symbol("]");
                }
            }
            OperandType::StringSource(size) => {
                Self::write_size_qualifier(size, out);
                Self::write_segment_prefix(seg_override.or(Some(Register16::DS)), out);
                out.write_symbol("[");
                out.write_register("si");
                out.write_symbol("]");
            }
            OperandType::FarPointer16(segment, offset) => {
                if let Some(seg) = seg_override {
                    out.write_register(&seg.to_string());
                    out.write_separator(" ");
                }
                out.write_text(&format!("{:04X}:{:04X}", segment, offset));
            }
            OperandType::NoOperand => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_values_switch_to_hex_above_eight() {
        assert_eq!(format_byte_value(8u8), "8");
        assert_eq!(format_byte_value(9u8), "09h");
        assert_eq!(format_byte_value(0x21u8), "21h");
        assert_eq!(format_byte_value(0xFEu8), "FEh");
    }

    #[test]
    fn word_values_switch_to_hex_above_fifteen() {
        assert_eq!(format_word_value(15u16), "15");
        assert_eq!(format_word_value(0x13u16), "13h");
        assert_eq!(format_word_value(0x1000u16), "1000h");
        assert_eq!(format_word_value(0x01DDu16), "01DDh");
    }

    #[test]
    fn displacements_carry_signs() {
        assert_eq!(format_byte_disp(8), "+8");
        assert_eq!(format_byte_disp(12), "+0Ch");
        assert_eq!(format_byte_disp(-18), "-12h");
        assert_eq!(format_word_disp(-4096), "-1000h");
    }

    #[test]
    fn branch_displacements_sign_only_when_negative() {
        assert_eq!(format_signed_word(-1889), "-0761h");
        assert_eq!(format_signed_word(7), "7");
    }
}
