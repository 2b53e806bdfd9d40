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
use mzdasm::prelude::*;
use std::io::Cursor;

fn listing(program: &Program) -> Vec<String> {
    program
        .instructions()
        .map(|item| {
            let (address, instruction) = item.expect("walk ok");
            format!("{} {}", address, format_instruction(&instruction, &FormatOptions::default()))
        })
        .collect()
}

#[test]
fn walk_produces_depth_first_listing() {
    // 0000: mov ax, 1234h
    // 0003: call 0008
    // 0006: int 20h
    // 0008: ret
    let code = vec![0xB8, 0x34, 0x12, 0xE8, 0x02, 0x00, 0xCD, 0x20, 0xC3];
    let program = Program::new(code, Address::new(0, 0));
    assert_eq!(
        listing(&program),
        vec![
            "0000:0000 mov ax, 1234h",
            "0000:0003 call 2",
            "0000:0008 ret",
            "0000:0006 int 20h",
        ]
    );
}

#[test]
fn near_call_queues_signed_displacement_target() {
    let instruction = decode_at(&[0xE8, 0x9F, 0xF8], 0).expect("decode ok");
    assert_eq!(
        instruction.branch_target(Address::new(0, 0)),
        Some(Address::new(0, 0) + (3 - 1889))
    );
    assert_eq!(
        instruction.branch_target(Address::new(0, 0)),
        Some(Address::new(0, 0xF8A2))
    );
}

#[test]
fn interrupt_is_not_followed() {
    let instruction = decode_at(&[0xCD, 0x21], 0).expect("decode ok");
    assert_eq!(instruction.branch_target(Address::new(0, 0)), None);
    assert!(!instruction.is_flow_terminator());
}

#[test]
fn near_and_far_unconditional_jumps_are_not_followed() {
    // e9: near jmp is neither followed nor a terminator in this traversal
    let near = decode_at(&[0xE9, 0x10, 0x00], 0).expect("decode ok");
    assert_eq!(near.branch_target(Address::new(0, 0)), None);
    assert!(!near.is_flow_terminator());

    let far = decode_at(&[0xEA, 0x00, 0x00, 0xBB, 0x15], 0).expect("decode ok");
    assert_eq!(far.branch_target(Address::new(0, 0)), None);
}

#[test]
fn indirect_call_has_no_static_target() {
    let instruction = decode_at(&[0xFF, 0x17], 0).expect("decode ok"); // call [bx]
    assert_eq!(instruction.mnemonic, Mnemonic::CALL);
    assert_eq!(instruction.branch_target(Address::new(0, 0)), None);
}

#[test]
fn backward_branch_into_visited_code_terminates() {
    // A loop body that jumps back to the entry: the walk must visit each
    // address once and stop.
    // 0000: inc ax
    // 0001: dec bx
    // 0002: jmp short -4 (target 0000)
    let program = Program::new(vec![0x40, 0x4B, 0xEB, 0xFC], Address::new(0, 0));
    let lines = listing(&program);
    assert_eq!(
        lines,
        vec!["0000:0000 inc ax", "0000:0001 dec bx", "0000:0002 jmp -4"]
    );
}

#[test]
fn overlay_then_walk_reaches_spliced_code() {
    // Image: entry jumps over an overlay stub via a near call into the
    // trampoline, which the patcher rewrites to a far jump at the appended
    // segment.
    //
    // 0000: call 0024 (first trampoline slot)
    // 0003: ret
    // 0004: overlay stub + header (32 bytes at paragraph offset 4)
    // 0024: trampoline (5 bytes)
    let mut code = vec![0xE8, 0x21, 0x00, 0xC3];
    code.extend_from_slice(&[0xCD, 0x3F, 0x00, 0x00]); // stub signature
    code.extend_from_slice(&0u32.to_le_bytes()); // file offset
    code.extend_from_slice(&2u16.to_le_bytes()); // code size
    code.extend_from_slice(&0u16.to_le_bytes()); // relocation size
    code.extend_from_slice(&1u16.to_le_bytes()); // entries
    code.resize(4 + 32, 0x00);
    code.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00]); // trampoline slot

    let mut program = Program::new(code, Address::new(0, 0));

    // Overlay source holds the unit's code: two returns.
    let mut source = Cursor::new(vec![0xC3, 0xC3]);
    overlay(&mut program, &mut source).expect("overlay ok");

    // 41 bytes pad to 48, so the unit lands at segment 3.
    assert_eq!(program.len(), 50);
    assert_eq!(&program.code()[36..41], &[0xEA, 0x00, 0x00, 0x03, 0x00]);

    let lines = listing(&program);
    assert!(lines.contains(&"0000:0024 jmp 0003:0000".to_string()));
}
