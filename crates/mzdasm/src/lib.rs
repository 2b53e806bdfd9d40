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

//! Static disassembly of 16-bit real-mode MS-DOS MZ executables.
//!
//! The crate decodes the 8086/8088 instruction subset from raw program
//! bytes, walks the reachable code from the entry point by following
//! statically known control transfers, and can splice overlay-stored code
//! into the image ahead of the walk, rewriting the overlay call stubs to
//! direct far jumps.

pub mod address;
pub mod byte_reader;
pub mod cpu_common;
pub mod decode;
pub mod error;
pub mod formatter;
pub mod instruction;
pub mod loader;
pub mod mnemonic;
pub mod modrm16;
pub mod overlay;
pub mod program;

pub use address::Address;
pub use decode::{decode, decode_at};
pub use error::{DecodeError, LoadError, OverlayError, WalkError};
pub use formatter::{format_instruction, Format, FormatOptions, FormatterOutput, IntelFormatter};
pub use instruction::Instruction;
pub use loader::{load_program, read_relocation_table, MzHeader};
pub use mnemonic::Mnemonic;
pub use overlay::{overlay, scan_units, OverlayUnit};
pub use program::{Program, Walk};

pub mod prelude {
    pub use crate::{
        address::Address,
        cpu_common::{OperandSize, OperandType, Register16, Register8},
        decode::{decode, decode_at},
        error::{DecodeError, LoadError, OverlayError, WalkError},
        formatter::{format_instruction, Format, FormatOptions, IntelFormatter},
        instruction::Instruction,
        loader::{load_program, read_relocation_table, MzHeader},
        mnemonic::Mnemonic,
        overlay::{overlay, scan_units, OverlayUnit},
        program::{Program, Walk},
    };
}
