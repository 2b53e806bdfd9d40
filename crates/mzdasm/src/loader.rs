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
    byte_reader::ByteReader,
    error::LoadError,
    program::{Program, PARAGRAPH_SIZE},
};
use std::{
    fmt::{Display, Formatter},
    io::{BufReader, Read, Seek, SeekFrom},
};

pub const BLOCK_BYTES: usize = 512;

const MZ_SIGNATURE: u16 = u16::from_le_bytes(*b"MZ");

/// The 28-byte MZ executable header.
#[derive(Debug, Clone)]
pub struct MzHeader {
    pub signature: u16,
    pub bytes_in_last_block: u16,
    pub blocks_in_file: u16,
    pub num_relocs: u16,
    pub header_paragraphs: u16,
    pub min_extra_paragraphs: u16,
    pub max_extra_paragraphs: u16,
    pub ss: u16,
    pub sp: u16,
    pub checksum: u16,
    pub ip: u16,
    pub cs: u16,
    pub reloc_table_offset: u16,
    pub overlay_number: u16,
}

impl MzHeader {
    /// Read the header from the start of an executable, validating the
    /// signature.
    pub fn read<R: Read + Seek>(exe: &mut R) -> Result<Self, LoadError> {
        exe.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(exe);
        let signature = reader.read_u16()?;
        if signature != MZ_SIGNATURE {
            return Err(LoadError::BadSignature(signature));
        }
        let header = Self {
            signature,
            bytes_in_last_block: reader.read_u16()?,
            blocks_in_file: reader.read_u16()?,
            num_relocs: reader.read_u16()?,
            header_paragraphs: reader.read_u16()?,
            min_extra_paragraphs: reader.read_u16()?,
            max_extra_paragraphs: reader.read_u16()?,
            ss: reader.read_u16()?,
            sp: reader.read_u16()?,
            checksum: reader.read_u16()?,
            ip: reader.read_u16()?,
            cs: reader.read_u16()?,
            reloc_table_offset: reader.read_u16()?,
            overlay_number: reader.read_u16()?,
        };
        log::debug!(
            "MZ header: {} blocks, {} in last, {} header paragraphs, entry cs:ip {:04X}:{:04X}",
            header.blocks_in_file,
            header.bytes_in_last_block,
            header.header_paragraphs,
            header.cs,
            header.ip
        );
        Ok(header)
    }

    /// Total file size covered by the image, from the 512-byte block count
    /// and the bytes used in the last block.
    pub fn total_size(&self) -> usize {
        if self.bytes_in_last_block != 0 {
            (self.blocks_in_file as usize - 1) * BLOCK_BYTES + self.bytes_in_last_block as usize
        }
        else {
            self.blocks_in_file as usize * BLOCK_BYTES
        }
    }

    pub fn header_size(&self) -> usize {
        self.header_paragraphs as usize * PARAGRAPH_SIZE
    }

    pub fn program_size(&self) -> usize {
        self.total_size() - self.header_size()
    }
}

impl Display for MzHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "signature: {:x}", self.signature)?;
        writeln!(f, "bytes in last block: {}", self.bytes_in_last_block)?;
        writeln!(f, "blocks in file: {}", self.blocks_in_file)?;
        writeln!(f, "num relocs: {}", self.num_relocs)?;
        writeln!(f, "header paragraphs: {}", self.header_paragraphs)?;
        writeln!(f, "min extra paragraphs: {}", self.min_extra_paragraphs)?;
        writeln!(f, "max extra paragraphs: {}", self.max_extra_paragraphs)?;
        writeln!(f, "ss: {:04x}", self.ss)?;
        writeln!(f, "sp: {:04x}", self.sp)?;
        writeln!(f, "checksum: {:04x}", self.checksum)?;
        writeln!(f, "ip: {:04x}", self.ip)?;
        writeln!(f, "cs: {:04x}", self.cs)?;
        writeln!(f, "reloc table offset: {}", self.reloc_table_offset)?;
        write!(f, "overlay number: {}", self.overlay_number)
    }
}

/// Read the program image that follows the header and build a [Program].
/// The image loads at segment zero, so the entry address is `0000:ip`.
pub fn load_program<R: Read + Seek>(exe: &mut R, header: &MzHeader) -> Result<Program, LoadError> {
    exe.seek(SeekFrom::Start(header.header_size() as u64))?;
    let mut code = vec![0u8; header.program_size()];
    exe.read_exact(&mut code)?;
    Ok(Program::new(code, Address::new(0, header.ip)))
}

/// Read the relocation table: `num_relocs` (offset, segment) pairs at the
/// header's relocation-table offset. The table is surfaced for inspection
/// only; with the image fixed at segment zero, applying it is a no-op.
pub fn read_relocation_table<R: Read + Seek>(
    exe: &mut R,
    header: &MzHeader,
) -> Result<Vec<(u16, u16)>, LoadError> {
    exe.seek(SeekFrom::Start(header.reloc_table_offset as u64))?;
    let mut reader = BufReader::new(exe);
    let mut table = Vec::with_capacity(header.num_relocs as usize);
    for _ in 0..header.num_relocs {
        let offset = reader.read_u16()?;
        let segment = reader.read_u16()?;
        table.push((offset, segment));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// A minimal EXE: 2-paragraph header (28 header bytes plus a 4-byte
    /// relocation table at offset 28), then `program` bytes.
    fn build_exe(program: &[u8]) -> Vec<u8> {
        let header_size = 32u16;
        let total = header_size as usize + program.len();
        let blocks = total.div_ceil(BLOCK_BYTES) as u16;
        let last = (total % BLOCK_BYTES) as u16;

        let mut exe = Vec::new();
        exe.extend_from_slice(b"MZ");
        exe.extend_from_slice(&last.to_le_bytes());
        exe.extend_from_slice(&blocks.to_le_bytes());
        exe.extend_from_slice(&1u16.to_le_bytes()); // num_relocs
        exe.extend_from_slice(&2u16.to_le_bytes()); // header_paragraphs
        exe.extend_from_slice(&0u16.to_le_bytes()); // min_extra
        exe.extend_from_slice(&0u16.to_le_bytes()); // max_extra
        exe.extend_from_slice(&0u16.to_le_bytes()); // ss
        exe.extend_from_slice(&0x100u16.to_le_bytes()); // sp
        exe.extend_from_slice(&0u16.to_le_bytes()); // checksum
        exe.extend_from_slice(&3u16.to_le_bytes()); // ip
        exe.extend_from_slice(&0u16.to_le_bytes()); // cs
        exe.extend_from_slice(&28u16.to_le_bytes()); // reloc_table_offset
        exe.extend_from_slice(&0u16.to_le_bytes()); // overlay_number
        // One relocation entry at offset 28.
        exe.extend_from_slice(&0x0012u16.to_le_bytes());
        exe.extend_from_slice(&0x0034u16.to_le_bytes());
        exe.extend_from_slice(program);
        exe
    }

    #[test]
    fn header_sizes() {
        let program = vec![0x90u8; 16];
        let mut exe = Cursor::new(build_exe(&program));
        let header = MzHeader::read(&mut exe).expect("header ok");
        assert_eq!(header.total_size(), 48);
        assert_eq!(header.header_size(), 32);
        assert_eq!(header.program_size(), 16);
    }

    #[test]
    fn load_program_reads_image_after_header() {
        let mut program_bytes = vec![0x90u8, 0x90, 0x90, 0xC3];
        program_bytes.resize(16, 0x00);
        let mut exe = Cursor::new(build_exe(&program_bytes));
        let header = MzHeader::read(&mut exe).expect("header ok");
        let program = load_program(&mut exe, &header).expect("load ok");
        assert_eq!(program.code(), &program_bytes[..]);
        assert_eq!(program.entry(), Address::new(0, 3));
    }

    #[test]
    fn relocation_table_is_parsed_not_applied() {
        let program = vec![0x90u8; 16];
        let mut exe = Cursor::new(build_exe(&program));
        let header = MzHeader::read(&mut exe).expect("header ok");
        let relocs = read_relocation_table(&mut exe, &header).expect("relocs ok");
        assert_eq!(relocs, vec![(0x0012, 0x0034)]);
    }

    #[test]
    fn bad_signature_is_rejected() {
        let mut exe = Cursor::new(b"ZM\x00\x00".to_vec());
        assert!(matches!(
            MzHeader::read(&mut exe),
            Err(LoadError::BadSignature(_))
        ));
    }

    #[test]
    fn full_last_block_counts_whole_blocks() {
        let header = MzHeader {
            signature: MZ_SIGNATURE,
            bytes_in_last_block: 0,
            blocks_in_file: 2,
            num_relocs: 0,
            header_paragraphs: 2,
            min_extra_paragraphs: 0,
            max_extra_paragraphs: 0,
            ss: 0,
            sp: 0,
            checksum: 0,
            ip: 0,
            cs: 0,
            reloc_table_offset: 28,
            overlay_number: 0,
        };
        assert_eq!(header.total_size(), 1024);
        assert_eq!(header.program_size(), 1024 - 32);
    }
}
