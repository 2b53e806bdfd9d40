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
use std::{
    fmt::{Display, Formatter},
    ops::Add,
};

/// A real-mode segment:offset pair.
///
/// Equality and hashing compare both fields exactly, so aliased pairs that
/// resolve to the same physical byte (e.g. `0001:0000` and `0000:0010`) are
/// distinct values. The traversal visited-set inherits this limitation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub segment: u16,
    pub offset:  u16,
}

impl Address {
    pub fn new(segment: u16, offset: u16) -> Self {
        Self { segment, offset }
    }

    /// Physical address: segment * 16 + offset.
    #[inline]
    pub fn linear(&self) -> usize {
        (self.segment as usize) * 16 + self.offset as usize
    }

    /// Build an address from a linear buffer offset, paragraph-aligned
    /// segment first: `segment = linear >> 4`, `offset = linear & 0xF`.
    pub fn from_linear(linear: usize) -> Self {
        Self {
            segment: (linear >> 4) as u16,
            offset:  (linear & 0xF) as u16,
        }
    }
}

impl Add<i32> for Address {
    type Output = Address;

    /// Apply a signed displacement to the offset. The segment is untouched;
    /// the offset wraps modulo 64K.
    fn add(self, rhs: i32) -> Address {
        Address {
            segment: self.segment,
            offset:  (self.offset as i32).wrapping_add(rhs) as u16,
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}:{:04X}", self.segment, self.offset)
    }
}
