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
    decode::decode_at,
    error::WalkError,
    instruction::Instruction,
};
use std::collections::HashSet;

pub const PARAGRAPH_SIZE: usize = 16;

/// A loaded program image: the code buffer and its entry address. The buffer
/// is mutated only by the overlay patcher's [Program::append]; traversal
/// takes the image read-only, so patching always completes before a walk
/// starts.
pub struct Program {
    code:  Vec<u8>,
    entry: Address,
}

impl Program {
    pub fn new(code: Vec<u8>, entry: Address) -> Self {
        Self { code, entry }
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn entry(&self) -> Address {
        self.entry
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub(crate) fn code_mut(&mut self) -> &mut Vec<u8> {
        &mut self.code
    }

    /// Append a code block at the next paragraph boundary, zero-padding as
    /// needed, and return the address of the appended block.
    pub fn append(&mut self, block: &[u8]) -> Address {
        let adjustment = (PARAGRAPH_SIZE - (self.code.len() & 0xF)) % PARAGRAPH_SIZE;
        if adjustment > 0 {
            self.code.extend(std::iter::repeat(0u8).take(adjustment));
        }
        let block_address = Address::from_linear(self.code.len());
        self.code.extend_from_slice(block);
        block_address
    }

    /// Walk the reachable instructions from the entry address, depth-first
    /// through statically known control transfers.
    pub fn instructions(&self) -> Walk<'_> {
        Walk::new(&self.code, self.entry)
    }
}

/// Control-flow-following iterator over a program image.
///
/// Maintains a LIFO work list of pending addresses and a visited set of
/// every address ever enqueued; the visited check on each push is the sole
/// loop-prevention mechanism. Yields each reachable instruction exactly
/// once, tagged with its address. A decode failure is yielded once and
/// exhausts the iterator.
pub struct Walk<'a> {
    code:    &'a [u8],
    pending: Vec<Address>,
    visited: HashSet<Address>,
    failed:  bool,
}

impl<'a> Walk<'a> {
    fn new(code: &'a [u8], entry: Address) -> Self {
        let mut visited = HashSet::new();
        visited.insert(entry);
        Self {
            code,
            pending: vec![entry],
            visited,
            failed: false,
        }
    }

    fn push_pending(&mut self, address: Address) {
        if self.visited.insert(address) {
            self.pending.push(address);
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<(Address, Instruction), WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let address = self.pending.pop()?;

        let instruction = match decode_at(self.code, address.linear()) {
            Ok(instruction) => instruction,
            Err(source) => {
                self.failed = true;
                return Some(Err(WalkError { address, source }));
            }
        };

        // Fall through unless the instruction terminates the flow; the
        // branch target, if statically known, is pushed last so it is
        // explored first.
        if !instruction.is_flow_terminator() {
            self.push_pending(address + instruction.len() as i32);
        }
        if let Some(target) = instruction.branch_target(address) {
            self.push_pending(target);
        }

        Some(Ok((address, instruction)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::mnemonic::Mnemonic;

    fn walk_ok(program: &Program) -> Vec<(Address, Instruction)> {
        program
            .instructions()
            .collect::<Result<Vec<_>, _>>()
            .expect("walk ok")
    }

    #[test]
    fn append_pads_to_paragraph() {
        let mut program = Program::new(vec![0x90; 37], Address::new(0, 0));
        let address = program.append(&[0xAA; 16]);
        assert_eq!(address, Address::new(3, 0));
        assert_eq!(program.len(), 64);
        assert_eq!(&program.code()[37..48], &[0u8; 11]);
        assert_eq!(program.code()[48], 0xAA);
    }

    #[test]
    fn append_at_boundary_adds_no_padding() {
        let mut program = Program::new(vec![0x90; 32], Address::new(0, 0));
        let address = program.append(&[0xBB; 4]);
        assert_eq!(address, Address::new(2, 0));
        assert_eq!(program.len(), 36);
    }

    #[test]
    fn walk_stops_at_return() {
        // nop; nop; ret; (unreachable garbage)
        let program = Program::new(vec![0x90, 0x90, 0xC3, 0x0F], Address::new(0, 0));
        let seen = walk_ok(&program);
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, Address::new(0, 0));
        assert_eq!(seen[2].1.mnemonic, Mnemonic::RET);
    }

    #[test]
    fn walk_terminates_on_backward_jump() {
        // 0000: nop
        // 0001: jmp short -3  (back to 0000, already visited)
        let program = Program::new(vec![0x90, 0xEB, 0xFD], Address::new(0, 0));
        let seen = walk_ok(&program);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].1.mnemonic, Mnemonic::JMP);
    }

    #[test]
    fn walk_follows_near_call_before_fall_through() {
        // 0000: call +2 (target 0005); 0003: ret; 0004: ret; 0005: ret
        let program = Program::new(
            vec![0xE8, 0x02, 0x00, 0xC3, 0xC3, 0xC3],
            Address::new(0, 0),
        );
        let seen = walk_ok(&program);
        let addresses: Vec<Address> = seen.iter().map(|(a, _)| *a).collect();
        // Depth-first: the call target is explored before the fall-through.
        assert_eq!(
            addresses,
            vec![Address::new(0, 0), Address::new(0, 5), Address::new(0, 3)]
        );
        // 0004 is never reached.
        assert!(!addresses.contains(&Address::new(0, 4)));
    }

    #[test]
    fn walk_follows_far_call_target() {
        // 0000: call far 0001:0002; 0005: ret; linear 0x12: ret
        let mut code = vec![0x9A, 0x02, 0x00, 0x01, 0x00, 0xC3];
        code.resize(0x12, 0x00);
        code.push(0xC3);
        let program = Program::new(code, Address::new(0, 0));
        let seen = walk_ok(&program);
        let addresses: Vec<Address> = seen.iter().map(|(a, _)| *a).collect();
        assert!(addresses.contains(&Address::new(1, 2)));
    }

    #[test]
    fn walk_does_not_follow_interrupts_or_conditional_jumps() {
        // 0000: int 21h; 0002: jz +4; 0004: ret
        let program = Program::new(vec![0xCD, 0x21, 0x74, 0x04, 0xC3], Address::new(0, 0));
        let seen = walk_ok(&program);
        let addresses: Vec<Address> = seen.iter().map(|(a, _)| *a).collect();
        assert_eq!(
            addresses,
            vec![Address::new(0, 0), Address::new(0, 2), Address::new(0, 4)]
        );
    }

    #[test]
    fn walk_error_is_fatal() {
        // entry decodes, fall-through hits an unsupported opcode
        let program = Program::new(vec![0x90, 0x0F], Address::new(0, 0));
        let mut walk = program.instructions();
        assert!(walk.next().unwrap().is_ok());
        let err = walk.next().unwrap().unwrap_err();
        assert_eq!(err.address, Address::new(0, 1));
        assert_eq!(err.source, DecodeError::UnsupportedOpcode(0x0F));
        assert!(walk.next().is_none());
    }

    #[test]
    fn walk_error_on_unsupported_entry_yields_nothing_more() {
        let program = Program::new(vec![0x0F], Address::new(0, 0));
        let mut walk = program.instructions();
        assert!(walk.next().unwrap().is_err());
        assert!(walk.next().is_none());
    }
}
