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

    overlay.rs

    Splices overlay-stored code into a program image ahead of time: scans the
    image for unresolved overlay call stubs, appends each unit's code from
    the overlay file, and rewrites the stub's trampolines to direct far
    jumps at the appended segment.
*/
use crate::{
    address::Address,
    error::OverlayError,
    program::Program,
};
use std::io::{Read, Seek, SeekFrom};

/// The 4-byte signature of an unresolved overlay call stub: `int 3Fh`
/// followed by two zero bytes. The overlay format guarantees stub bodies and
/// trampolines never re-match it.
pub const STUB_SIGNATURE: [u8; 4] = [0xCD, 0x3F, 0x00, 0x00];

/// Total bytes of stub plus unit header ahead of the trampoline slots.
const STUB_HEADER_SIZE: usize = 32;

/// Bytes per trampoline slot.
const TRAMPOLINE_SIZE: usize = 5;

/// One overlay code block, parsed from the 14-byte unit header at its stub:
/// signature word, a reserved word, then the code's file offset and size,
/// the size of its fixup table, and the number of trampoline entries that
/// follow the stub.
#[derive(Debug, Clone)]
pub struct OverlayUnit {
    pub origin: Address,
    pub file_offset: u32,
    pub code_size: u16,
    pub relocation_size: u16,
    pub entries: u16,
}

fn is_unit_stub(code: &[u8], offset: usize) -> bool {
    code.len() - offset >= STUB_SIGNATURE.len()
        && code[offset..offset + STUB_SIGNATURE.len()] == STUB_SIGNATURE
}

fn read_u16_at(code: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([code[offset], code[offset + 1]])
}

fn read_u32_at(code: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        code[offset],
        code[offset + 1],
        code[offset + 2],
        code[offset + 3],
    ])
}

impl OverlayUnit {
    fn parse(code: &[u8], offset: usize) -> Result<Self, OverlayError> {
        if offset + 14 > code.len() {
            return Err(OverlayError::CorruptOverlay { offset });
        }
        Ok(Self {
            origin: Address::from_linear(offset),
            file_offset: read_u32_at(code, offset + 4),
            code_size: read_u16_at(code, offset + 8),
            relocation_size: read_u16_at(code, offset + 10),
            entries: read_u16_at(code, offset + 12),
        })
    }

    /// Linear offset of the unit's first trampoline slot.
    fn trampoline_base(&self) -> usize {
        self.origin.linear() + STUB_HEADER_SIZE
    }
}

/// Scan a program image for overlay unit stubs. Stub bodies and their
/// trampolines are skipped wholesale once recognized.
pub fn scan_units(program: &Program) -> Result<Vec<OverlayUnit>, OverlayError> {
    let code = program.code();
    let mut units = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        if is_unit_stub(code, offset) {
            let unit = OverlayUnit::parse(code, offset)?;
            log::debug!(
                "overlay unit at {}: file offset {:#x}, code {:#x} bytes, {} entries",
                unit.origin,
                unit.file_offset,
                unit.code_size,
                unit.entries
            );
            offset += STUB_HEADER_SIZE + unit.entries as usize * TRAMPOLINE_SIZE;
            units.push(unit);
        }
        else {
            offset += 1;
        }
    }
    Ok(units)
}

/// Splice every overlay unit found in `program` from the overlay source:
/// append the unit's code at the next paragraph boundary and rewrite its
/// trampolines to direct far jumps targeting the appended segment. The
/// intra-unit offset stored in each trampoline is preserved; only the
/// segment changes.
///
/// The unit's fixup table is read and intentionally left unapplied: the
/// loader places the image at segment zero, so the appended code needs no
/// relocation.
pub fn overlay<R: Read + Seek>(program: &mut Program, source: &mut R) -> Result<(), OverlayError> {
    let units = scan_units(program)?;
    for unit in units {
        let code = extract_code(source, &unit)?;
        let fixups = extract_fixup_table(source, &unit)?;
        if !fixups.is_empty() {
            log::debug!(
                "unit at {}: {} fixups parsed, none applied (image loads at segment zero)",
                unit.origin,
                fixups.len()
            );
        }

        let unit_address = program.append(&code);
        log::debug!("unit code appended at {}", unit_address);
        fix_trampolines(program, &unit, unit_address.segment)?;
    }
    Ok(())
}

fn extract_code<R: Read + Seek>(source: &mut R, unit: &OverlayUnit) -> Result<Vec<u8>, OverlayError> {
    source.seek(SeekFrom::Start(unit.file_offset as u64))?;
    let mut code = vec![0u8; unit.code_size as usize];
    source.read_exact(&mut code)?;
    Ok(code)
}

fn extract_fixup_table<R: Read + Seek>(
    source: &mut R,
    unit: &OverlayUnit,
) -> Result<Vec<u16>, OverlayError> {
    source.seek(SeekFrom::Start(unit.file_offset as u64 + unit.code_size as u64))?;
    let mut table = Vec::with_capacity(unit.relocation_size as usize / 2);
    let mut buf = [0u8; 2];
    for _ in 0..unit.relocation_size / 2 {
        source.read_exact(&mut buf)?;
        table.push(u16::from_le_bytes(buf));
    }
    Ok(table)
}

/// Rewrite each of the unit's trampoline slots to `jmp far segment:offset`:
/// byte 0xEA, then the offset already stored in the slot, then the new
/// segment, both little-endian.
fn fix_trampolines(
    program: &mut Program,
    unit: &OverlayUnit,
    segment: u16,
) -> Result<(), OverlayError> {
    let base = unit.trampoline_base();
    let end = base + unit.entries as usize * TRAMPOLINE_SIZE;
    if end > program.len() {
        return Err(OverlayError::CorruptOverlay { offset: unit.origin.linear() });
    }

    let code = program.code_mut();
    for entry in 0..unit.entries as usize {
        let slot = base + entry * TRAMPOLINE_SIZE;
        let offset = read_u16_at(code, slot + 2);
        code[slot] = 0xEA;
        code[slot + 1..slot + 3].copy_from_slice(&offset.to_le_bytes());
        code[slot + 3..slot + 5].copy_from_slice(&segment.to_le_bytes());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Build a program containing a single overlay stub with `entries`
    /// trampolines, padded so the image ends right after the last slot.
    fn stub_program(file_offset: u32, code_size: u16, reloc_size: u16, entries: u16) -> Vec<u8> {
        let mut code = Vec::new();
        code.extend_from_slice(&STUB_SIGNATURE);
        code.extend_from_slice(&file_offset.to_le_bytes());
        code.extend_from_slice(&code_size.to_le_bytes());
        code.extend_from_slice(&reloc_size.to_le_bytes());
        code.extend_from_slice(&entries.to_le_bytes());
        code.resize(STUB_HEADER_SIZE, 0x90);
        for entry in 0..entries {
            // A pre-patch trampoline slot: two scratch bytes, then the
            // intra-unit offset.
            code.push(0x00);
            code.push(0x00);
            code.extend_from_slice(&(0x1230u16 + entry).to_le_bytes());
            code.push(0x00);
        }
        code
    }

    #[test]
    fn scan_finds_and_skips_units() {
        let mut image = vec![0x90; 3];
        image.extend_from_slice(&stub_program(0, 16, 0, 2));
        let program = Program::new(image, Address::new(0, 0));
        let units = scan_units(&program).expect("scan ok");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].origin, Address::from_linear(3));
        assert_eq!(units[0].code_size, 16);
        assert_eq!(units[0].entries, 2);
    }

    #[test]
    fn scan_rejects_truncated_header() {
        let mut image = vec![0u8; 0];
        image.extend_from_slice(&STUB_SIGNATURE);
        image.extend_from_slice(&[0x00; 4]); // 8 bytes total, header needs 14
        let program = Program::new(image, Address::new(0, 0));
        assert!(matches!(
            scan_units(&program),
            Err(OverlayError::CorruptOverlay { offset: 0 })
        ));
    }

    #[test]
    fn overlay_appends_and_rewrites_trampolines() {
        let image = stub_program(4, 16, 4, 1);
        let initial_len = image.len(); // 37 bytes
        assert_eq!(initial_len, 37);
        let mut program = Program::new(image, Address::new(0, 0));

        // Overlay source: 4 junk bytes, 16 code bytes, 4 fixup bytes.
        let mut source_bytes = vec![0xFF; 4];
        source_bytes.extend_from_slice(&[0xAB; 16]);
        source_bytes.extend_from_slice(&[0x02, 0x00, 0x04, 0x00]);
        let mut source = Cursor::new(source_bytes);

        overlay(&mut program, &mut source).expect("overlay ok");

        // Code lands at the next paragraph boundary: 48 = segment 3.
        assert_eq!(program.len(), 64);
        assert_eq!(&program.code()[37..48], &[0u8; 11]);
        assert_eq!(&program.code()[48..64], &[0xAB; 16]);

        // The trampoline at 32 is now a direct far jump, keeping the stored
        // offset and substituting segment 3.
        assert_eq!(
            &program.code()[32..37],
            &[0xEA, 0x30, 0x12, 0x03, 0x00]
        );
    }

    #[test]
    fn overlay_with_no_units_is_a_no_op() {
        let mut program = Program::new(vec![0x90; 8], Address::new(0, 0));
        let mut source = Cursor::new(Vec::new());
        overlay(&mut program, &mut source).expect("overlay ok");
        assert_eq!(program.len(), 8);
    }

    #[test]
    fn short_overlay_source_is_an_error() {
        let image = stub_program(0, 64, 0, 1);
        let mut program = Program::new(image, Address::new(0, 0));
        let mut source = Cursor::new(vec![0u8; 8]);
        assert!(matches!(
            overlay(&mut program, &mut source),
            Err(OverlayError::Io(_))
        ));
    }
}
