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

fn check(bytes: &[u8], text: &str, length: usize) {
    let instruction = decode_at(bytes, 0).expect("decode ok");
    assert_eq!(
        format_instruction(&instruction, &FormatOptions::default()),
        text,
        "bytes {:02X?}",
        bytes
    );
    assert_eq!(instruction.len(), length, "bytes {:02X?}", bytes);
}

#[test]
fn add_forms() {
    check(&[0x03, 0xC2], "add ax, dx", 2);
    check(&[0x03, 0x06, 0x56, 0x43], "add ax, 4356h", 4);
    check(&[0x05, 0x13, 0x00], "add ax, 13h", 3);
    check(&[0x83, 0xC7, 0x04], "add di, 4", 3);
}

#[test]
fn sub_forms() {
    check(&[0x2B, 0xC8], "sub cx, ax", 2);
    check(&[0x2D, 0x00, 0x10], "sub ax, 1000h", 3);
}

#[test]
fn logic_and_compare() {
    check(&[0x33, 0xED], "xor bp, bp", 2);
    check(&[0x3B, 0xDA], "cmp bx, dx", 2);
    check(&[0x80, 0x7E, 0xFE, 0x13], "cmp byte ptr [bp-2], 13h", 4);
}

#[test]
fn mov_forms() {
    check(&[0x89, 0x1D], "mov [di], bx", 2);
    check(&[0x8B, 0xC4], "mov ax, sp", 2);
    check(&[0x8B, 0x5D, 0x08], "mov bx, [di+8]", 3);
    check(&[0x8C, 0x06, 0x84, 0x43], "mov 4384h, es", 4);
    check(&[0x8C, 0x45, 0x02], "mov [di+2], es", 3);
    check(&[0x8E, 0xDA], "mov ds, dx", 2);
    check(&[0xC6, 0x05, 0x05], "mov byte ptr [di], 5", 3);
}

#[test]
fn mov_immediate_registers() {
    check(&[0xB1, 0x04], "mov cl, 4", 2);
    check(&[0xB4, 0x35], "mov ah, 35h", 2);
    check(&[0xB9, 0x12, 0x00], "mov cx, 12h", 3);
    check(&[0xBA, 0x40, 0x17], "mov dx, 1740h", 3);
    check(&[0xBE, 0xDD, 0x01], "mov si, 01DDh", 3);
    check(&[0xBF, 0xD0, 0x84], "mov di, 84D0h", 3);
}

#[test]
fn mov_direct_offsets() {
    check(&[0xA0, 0xC9, 0x82], "mov al, 82C9h", 3);
    check(&[0xA3, 0x5C, 0x43], "mov 435Ch, ax", 3);
}

#[test]
fn transfers() {
    check(&[0x90], "nop", 1);
    check(&[0x9A, 0x00, 0x00, 0xBB, 0x15], "call 15BB:0000", 5);
    check(&[0xE8, 0x9F, 0xF8], "call -0761h", 3);
    check(&[0xE2, 0xF0], "loop -10h", 2);
    check(&[0xE3, 0x07], "jcxz 7", 2);
    check(&[0xEB, 0xFE], "jmp -2", 2);
    check(&[0xCD, 0x21], "int 21h", 2);
    check(&[0xC2, 0x04, 0x00], "ret 4", 3);
    check(&[0xC3], "ret", 1);
}

#[test]
fn group_opcodes() {
    check(&[0xD1, 0xE0], "shl ax, 1", 2);
    check(&[0xD3, 0xE8], "shr ax, cl", 2);
    check(&[0xF7, 0xE1], "mul cx", 2);
    check(&[0xFE, 0x07], "inc byte ptr [bx]", 2);
    check(&[0xFF, 0x36, 0x26, 0x26], "push 2626h", 4);
}

#[test]
fn load_pointer_forms() {
    check(&[0xC4, 0x7D, 0x0C], "les di, [di+0Ch]", 3);
}

#[test]
fn string_ops_and_prefixes() {
    check(&[0xAC], "lods byte ptr ds:[si]", 1);
    check(&[0xAD], "lods word ptr ds:[si]", 1);
    check(&[0x2E, 0xAC], "lods byte ptr cs:[si]", 2);
    check(&[0xF3, 0xA4], "rep movsb", 2);
    check(&[0xF3, 0xAA], "rep stosb", 2);
}

#[test]
fn segment_override_attaches_to_memory_operand() {
    check(&[0x26, 0xA1, 0x02, 0x00], "mov ax, es:2", 4);
    check(&[0x2E, 0x8B, 0x5D, 0x08], "mov bx, cs:[di+8]", 4);
}

#[test]
fn aam_default_operand_is_suppressed() {
    check(&[0xD4, 0x0A], "aam", 2);
    check(&[0xD4, 0x05], "aam 5", 2);
}

#[test]
fn segment_override_neutrality() {
    // The same inner instruction under each override changes only the
    // rendered segment and adds exactly one byte.
    let inner = decode_at(&[0xA1, 0x02, 0x00], 0).expect("decode ok");
    assert_eq!(format_instruction(&inner, &FormatOptions::default()), "mov ax, 2");

    for (prefix, segment) in [(0x26u8, "es"), (0x2E, "cs"), (0x36, "ss"), (0x3E, "ds")] {
        let bytes = [prefix, 0xA1, 0x02, 0x00];
        let wrapped = decode_at(&bytes, 0).expect("decode ok");
        assert_eq!(wrapped.len(), inner.len() + 1);
        assert_eq!(wrapped.mnemonic, inner.mnemonic);
        assert_eq!(
            format_instruction(&wrapped, &FormatOptions::default()),
            format!("mov ax, {}:2", segment)
        );
    }
}

#[test]
fn idempotent_redecode() {
    let bytes = [0x8B, 0x5D, 0x08];
    let first = decode_at(&bytes, 0).expect("decode ok");
    let second = decode_at(&bytes, 0).expect("decode ok");
    assert_eq!(
        format_instruction(&first, &FormatOptions::default()),
        format_instruction(&second, &FormatOptions::default())
    );
    assert_eq!(first.bytes, second.bytes);
}

#[test]
fn consumption_consistency() {
    // Decoding then re-decoding at address + length never overlaps or
    // skips bytes.
    let stream: Vec<u8> = [
        &[0xB8u8, 0x34, 0x12][..],
        &[0x03, 0xC2],
        &[0x8B, 0x5D, 0x08],
        &[0x26, 0xA1, 0x02, 0x00],
        &[0xF3, 0xA4],
        &[0x9A, 0x00, 0x00, 0xBB, 0x15],
        &[0xD1, 0xE0],
        &[0xC3],
    ]
    .concat();

    let mut offset = 0;
    while offset < stream.len() {
        let instruction = decode_at(&stream, offset).expect("decode ok");
        assert!(instruction.len() > 0);
        offset += instruction.len();
    }
    assert_eq!(offset, stream.len());
}

#[test]
fn unsupported_and_malformed_decodes() {
    assert_eq!(decode_at(&[0x0F], 0), Err(DecodeError::UnsupportedOpcode(0x0F)));
    assert_eq!(decode_at(&[0x60], 0), Err(DecodeError::UnsupportedOpcode(0x60)));
    assert_eq!(decode_at(&[0xF0, 0x90], 0), Err(DecodeError::UnsupportedOpcode(0xF0)));
    // es: on an instruction kind with no segment slot
    assert_eq!(decode_at(&[0x26, 0x40], 0), Err(DecodeError::MalformedOperand(0x40)));
    // imm16 with only one trailing byte
    assert_eq!(decode_at(&[0xB8, 0x01], 0), Err(DecodeError::BufferUnderrun));
}
