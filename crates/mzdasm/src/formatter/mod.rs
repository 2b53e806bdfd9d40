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

pub mod intel_formatter;

pub use intel_formatter::IntelFormatter;

use crate::instruction::Instruction;

/// Options controlling disassembly formatting
#[derive(Copy, Clone, Debug, Default)]
pub struct FormatOptions {
    /// If true, render the mnemonic in uppercase; otherwise lowercase.
    pub uppercase_mnemonic: bool,
    /// If true, only output the mnemonic, no operands
    pub mnemonic_only: bool,
}

/// Output sink for formatting tokens. Implement this to capture rich tokens
/// or to accumulate plain text.
pub trait FormatterOutput {
    /// Fallback text writer for any token type
    fn write_text(&mut self, s: &str);

    fn write_prefix(&mut self, s: &str) {
        self.write_text(s)
    }

    fn write_register(&mut self, s: &str) {
        self.write_text(s)
    }

    fn write_mnemonic(&mut self, s: &str) {
        self.write_text(s)
    }

    fn write_immediate(&mut self, s: &str) {
        self.write_text(s)
    }

    fn write_relative(&mut self, s: &str) {
        self.write_text(s)
    }

    fn write_displacement(&mut self, s: &str) {
        self.write_text(s)
    }

    fn write_separator(&mut self, s: &str) {
        self.write_text(s)
    }

    fn write_symbol(&mut self, s: &str) {
        self.write_text(s)
    }
}

/// Provide a basic String sink implementation
impl FormatterOutput for String {
    fn write_text(&mut self, s: &str) {
        self.push_str(s);
    }
}

/// Trait for disassembly formatting styles
pub trait Format {
    /// Emit any instruction prefixes (e.g. rep). Includes the trailing
    /// separator when anything is written.
    fn format_prefixes(&self, inst: &Instruction, opts: &FormatOptions, out: &mut dyn FormatterOutput);
    /// Emit the mnemonic token without leading/trailing spaces.
    fn format_mnemonic(&self, inst: &Instruction, opts: &FormatOptions, out: &mut dyn FormatterOutput);
    /// Emit the operand list.
    fn format_operands(&self, inst: &Instruction, opts: &FormatOptions, out: &mut dyn FormatterOutput);

    fn operands_suppressed(&self, _inst: &Instruction) -> bool {
        false
    }

    /// Compose the full instruction from parts (default behavior)
    fn format_instruction(&self, inst: &Instruction, opts: &FormatOptions, out: &mut dyn FormatterOutput) {
        if opts.mnemonic_only {
            self.format_mnemonic(inst, opts, out);
            return;
        }

        self.format_prefixes(inst, opts, out);
        self.format_mnemonic(inst, opts, out);

        if inst.has_operands() && !self.operands_suppressed(inst) {
            out.write_separator(" ");
            self.format_operands(inst, opts, out);
        }
    }
}

/// Convenience helper using the Intel-style formatter; returns a flat String
pub fn format_instruction(inst: &Instruction, opts: &FormatOptions) -> String {
    let mut s = String::new();
    IntelFormatter.format_instruction(inst, opts, &mut s);
    s
}
