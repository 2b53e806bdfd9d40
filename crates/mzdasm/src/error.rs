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
use crate::address::Address;
use std::{error::Error, fmt::Display, io};

/// Errors raised while decoding a single instruction. All variants are fatal
/// to the decode call; there is no skip-and-resync recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The first byte, or a group opcode's `reg` sub-field, has no decoding.
    UnsupportedOpcode(u8),
    /// A mode/direction/size combination (or a misapplied segment prefix)
    /// that the rendering tables have no entry for on an otherwise-known
    /// opcode.
    MalformedOperand(u8),
    /// The instruction's trailing bytes run past the end of the buffer.
    BufferUnderrun,
}

impl Error for DecodeError {}
impl Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DecodeError::UnsupportedOpcode(o) => {
                write!(f, "unsupported opcode {:#04x}", o)
            }
            DecodeError::MalformedOperand(o) => {
                write!(f, "malformed operand for opcode {:#04x}", o)
            }
            DecodeError::BufferUnderrun => {
                write!(f, "unexpected buffer exhaustion while decoding instruction")
            }
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(_: io::Error) -> Self {
        // The decoder reads from in-memory buffers; the only io error a
        // Cursor can produce here is running off the end.
        DecodeError::BufferUnderrun
    }
}

/// A decode failure during a control-flow walk, tagged with the address the
/// driver was decoding when it failed. Terminates the walk.
#[derive(Debug)]
pub struct WalkError {
    pub address: Address,
    pub source:  DecodeError,
}

impl Error for WalkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for WalkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decode error at {}: {}", self.address, self.source)
    }
}

/// Errors raised while splicing an overlay file into a program image.
#[derive(Debug)]
pub enum OverlayError {
    /// A unit header or trampoline slot would run past the program buffer.
    CorruptOverlay { offset: usize },
    /// A positioned read from the overlay source failed.
    Io(io::Error),
}

impl Error for OverlayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OverlayError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for OverlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayError::CorruptOverlay { offset } => {
                write!(f, "overlay unit at offset {:#x} runs past the program image", offset)
            }
            OverlayError::Io(e) => write!(f, "overlay read failed: {}", e),
        }
    }
}

impl From<io::Error> for OverlayError {
    fn from(e: io::Error) -> Self {
        OverlayError::Io(e)
    }
}

/// Errors raised while reading an MZ executable.
#[derive(Debug)]
pub enum LoadError {
    /// The file does not start with the "MZ" signature.
    BadSignature(u16),
    Io(io::Error),
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::BadSignature(sig) => {
                write!(f, "not an MZ executable (signature {:#06x})", sig)
            }
            LoadError::Io(e) => write!(f, "read failed: {}", e),
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        LoadError::Io(e)
    }
}
