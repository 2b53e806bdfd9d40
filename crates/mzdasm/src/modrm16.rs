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
use crate::byte_reader::ByteReader;
use crate::cpu_common::{
    AddressOffset16, Displacement, Register16, Register8, REGISTER16_LUT, REGISTER8_LUT,
    SREGISTER16_LUT,
};
use std::io;

/// One decoded mode byte: addressing class (`mod`), register or
/// opcode-extension selector (`reg`), base/index selector (`rm`), and the
/// displacement it implies. `mod=3` (register-direct) never carries a
/// displacement.
#[derive(Copy, Clone)]
pub struct ModRmByte16 {
    b_mod: u8,
    b_reg: u8,
    b_rm: u8,
    disp: Displacement,
    addressing_mode: AddressOffset16,
}

const MODRM16_TABLE: [ModRmByte16; 256] = {
    let mut table: [ModRmByte16; 256] = [ModRmByte16 {
        b_mod: 0,
        b_reg: 0,
        b_rm: 0,
        disp: Displacement::NoDisp,
        addressing_mode: AddressOffset16::BxSi,
    }; 256];
    let mut byte: u8 = 0;

    loop {
        let b_mod = (byte >> 6) & 0x03;

        let displacement = match b_mod {
            0b00 => {
                // [disp16] is a single direct-address mode within mod 0b00
                if byte & ModRmByte16::MODRM_ADDR_MASK == ModRmByte16::MODRM_ADDR_DIRECT {
                    Displacement::Disp16(0)
                }
                else {
                    Displacement::NoDisp
                }
            }
            0b01 => Displacement::Disp8(0),
            0b10 => Displacement::Disp16(0),
            _ => Displacement::NoDisp,
        };

        let addressing_mode = match byte & ModRmByte16::MODRM_ADDR_MASK {
            ModRmByte16::MODRM_ADDR_BX_SI => AddressOffset16::BxSi,
            ModRmByte16::MODRM_ADDR_BX_DI => AddressOffset16::BxDi,
            ModRmByte16::MODRM_ADDR_BP_SI => AddressOffset16::BpSi,
            ModRmByte16::MODRM_ADDR_BP_DI => AddressOffset16::BpDi,
            ModRmByte16::MODRM_ADDR_SI => AddressOffset16::Si,
            ModRmByte16::MODRM_ADDR_DI => AddressOffset16::Di,
            ModRmByte16::MODRM_ADDR_DIRECT => AddressOffset16::Direct(0),
            ModRmByte16::MODRM_ADDR_BX => AddressOffset16::Bx,
            ModRmByte16::MODRM_ADDR_BX_SI_DISP8 => AddressOffset16::BxSiDisp8(0),
            ModRmByte16::MODRM_ADDR_BX_DI_DISP8 => AddressOffset16::BxDiDisp8(0),
            ModRmByte16::MODRM_ADDR_BP_SI_DISP8 => AddressOffset16::BpSiDisp8(0),
            ModRmByte16::MODRM_ADDR_BP_DI_DISP8 => AddressOffset16::BpDiDisp8(0),
            ModRmByte16::MODRM_ADDR_SI_DISP8 => AddressOffset16::SiDisp8(0),
            ModRmByte16::MODRM_ADDR_DI_DISP8 => AddressOffset16::DiDisp8(0),
            ModRmByte16::MODRM_ADDR_BP_DISP8 => AddressOffset16::BpDisp8(0),
            ModRmByte16::MODRM_ADDR_BX_DISP8 => AddressOffset16::BxDisp8(0),
            ModRmByte16::MODRM_ADDR_BX_SI_DISP16 => AddressOffset16::BxSiDisp16(0),
            ModRmByte16::MODRM_ADDR_BX_DI_DISP16 => AddressOffset16::BxDiDisp16(0),
            ModRmByte16::MODRM_ADDR_BP_SI_DISP16 => AddressOffset16::BpSiDisp16(0),
            ModRmByte16::MODRM_ADDR_BP_DI_DISP16 => AddressOffset16::BpDiDisp16(0),
            ModRmByte16::MODRM_ADDR_SI_DISP16 => AddressOffset16::SiDisp16(0),
            ModRmByte16::MODRM_ADDR_DI_DISP16 => AddressOffset16::DiDisp16(0),
            ModRmByte16::MODRM_ADDR_BP_DISP16 => AddressOffset16::BpDisp16(0),
            ModRmByte16::MODRM_ADDR_BX_DISP16 => AddressOffset16::BxDisp16(0),
            _ => AddressOffset16::None,
        };

        let b_reg: u8 = (byte >> 3) & 0x07;
        let b_rm: u8 = byte & 0x07;

        table[byte as usize] = ModRmByte16 {
            b_mod,
            b_reg,
            b_rm,
            disp: displacement,
            addressing_mode,
        };

        if byte < 255 {
            byte += 1;
        }
        else {
            break;
        }
    }

    table
};

impl ModRmByte16 {
    const MODRM_ADDR_MASK: u8 = 0b11_000_111;

    const MODRM_ADDR_BX_SI: u8 = 0b00_000_000;
    const MODRM_ADDR_BX_DI: u8 = 0b00_000_001;
    const MODRM_ADDR_BP_SI: u8 = 0b00_000_010;
    const MODRM_ADDR_BP_DI: u8 = 0b00_000_011;
    const MODRM_ADDR_SI: u8 = 0b00_000_100;
    const MODRM_ADDR_DI: u8 = 0b00_000_101;
    const MODRM_ADDR_DIRECT: u8 = 0b00_000_110;
    const MODRM_ADDR_BX: u8 = 0b00_000_111;

    const MODRM_ADDR_BX_SI_DISP8: u8 = 0b01_000_000;
    const MODRM_ADDR_BX_DI_DISP8: u8 = 0b01_000_001;
    const MODRM_ADDR_BP_SI_DISP8: u8 = 0b01_000_010;
    const MODRM_ADDR_BP_DI_DISP8: u8 = 0b01_000_011;
    const MODRM_ADDR_SI_DISP8: u8 = 0b01_000_100;
    const MODRM_ADDR_DI_DISP8: u8 = 0b01_000_101;
    const MODRM_ADDR_BP_DISP8: u8 = 0b01_000_110;
    const MODRM_ADDR_BX_DISP8: u8 = 0b01_000_111;

    const MODRM_ADDR_BX_SI_DISP16: u8 = 0b10_000_000;
    const MODRM_ADDR_BX_DI_DISP16: u8 = 0b10_000_001;
    const MODRM_ADDR_BP_SI_DISP16: u8 = 0b10_000_010;
    const MODRM_ADDR_BP_DI_DISP16: u8 = 0b10_000_011;
    const MODRM_ADDR_SI_DISP16: u8 = 0b10_000_100;
    const MODRM_ADDR_DI_DISP16: u8 = 0b10_000_101;
    const MODRM_ADDR_BP_DISP16: u8 = 0b10_000_110;
    const MODRM_ADDR_BX_DISP16: u8 = 0b10_000_111;

    #[inline(always)]
    pub fn from_byte(byte: u8) -> ModRmByte16 {
        MODRM16_TABLE[byte as usize]
    }

    /// Read the modrm byte, look up its table entry, and load any trailing
    /// displacement bytes. Every consumed byte is appended to
    /// `instruction_bytes`.
    pub fn read(
        bytes: &mut impl ByteReader,
        instruction_bytes: &mut Vec<u8>,
    ) -> io::Result<ModRmByte16> {
        let raw_modrm_byte = bytes.read_u8()?;
        let mut modrm = ModRmByte16::from_byte(raw_modrm_byte);
        instruction_bytes.push(raw_modrm_byte);

        // mod=3 is register-direct; only addressing modes load displacement.
        if modrm.b_mod != 0b11 {
            match modrm.disp {
                Displacement::Disp8(_) => {
                    let disp = bytes.read_u8()?;
                    instruction_bytes.push(disp);
                    modrm.disp = Displacement::Disp8(disp as i8);
                }
                Displacement::Disp16(_) => {
                    let disp = bytes.read_u16()?;
                    instruction_bytes.extend_from_slice(&disp.to_le_bytes());
                    modrm.disp = Displacement::Disp16(disp as i16);
                }
                _ => { /* No displacement to read */ }
            }
        }
        Ok(modrm)
    }

    // Interpret the 'R/M' field as an 8 bit register selector
    #[inline(always)]
    pub fn op1_reg8(&self) -> Register8 {
        REGISTER8_LUT[self.b_rm as usize]
    }

    // Interpret the 'R/M' field as a 16 bit register selector
    #[inline(always)]
    pub fn op1_reg16(&self) -> Register16 {
        REGISTER16_LUT[self.b_rm as usize]
    }

    // Interpret the 'REG' field as an 8 bit register selector
    #[inline(always)]
    pub fn op2_reg8(&self) -> Register8 {
        REGISTER8_LUT[self.b_reg as usize]
    }

    // Interpret the 'REG' field as a 16 bit register selector
    #[inline(always)]
    pub fn op2_reg16(&self) -> Register16 {
        REGISTER16_LUT[self.b_reg as usize]
    }

    // Interpret the 'REG' field as a segment register selector
    #[inline(always)]
    pub fn op2_segment_reg16(&self) -> Register16 {
        SREGISTER16_LUT[self.b_reg as usize]
    }

    // Interpret the 'REG' field as a 3 bit opcode extension
    #[inline(always)]
    pub fn op_extension(&self) -> u8 {
        self.b_reg
    }

    // Return whether the modrm byte specifies a memory addressing mode
    #[inline(always)]
    pub fn is_addressing_mode(&self) -> bool {
        self.b_mod != 0b11
    }

    /// Produce an [AddressOffset16] with the provided [Displacement]
    /// inserted.
    pub fn address_offset(&self, displacement: Displacement) -> AddressOffset16 {
        let d8 = match displacement {
            Displacement::Disp8(d) => d,
            _ => 0,
        };
        let d16 = match displacement {
            Displacement::Disp16(d) => d,
            _ => 0,
        };
        match self.addressing_mode {
            AddressOffset16::Direct(_) => AddressOffset16::Direct(d16 as u16),
            AddressOffset16::BxSiDisp8(_) => AddressOffset16::BxSiDisp8(d8),
            AddressOffset16::BxDiDisp8(_) => AddressOffset16::BxDiDisp8(d8),
            AddressOffset16::BpSiDisp8(_) => AddressOffset16::BpSiDisp8(d8),
            AddressOffset16::BpDiDisp8(_) => AddressOffset16::BpDiDisp8(d8),
            AddressOffset16::SiDisp8(_) => AddressOffset16::SiDisp8(d8),
            AddressOffset16::DiDisp8(_) => AddressOffset16::DiDisp8(d8),
            AddressOffset16::BpDisp8(_) => AddressOffset16::BpDisp8(d8),
            AddressOffset16::BxDisp8(_) => AddressOffset16::BxDisp8(d8),
            AddressOffset16::BxSiDisp16(_) => AddressOffset16::BxSiDisp16(d16),
            AddressOffset16::BxDiDisp16(_) => AddressOffset16::BxDiDisp16(d16),
            AddressOffset16::BpSiDisp16(_) => AddressOffset16::BpSiDisp16(d16),
            AddressOffset16::BpDiDisp16(_) => AddressOffset16::BpDiDisp16(d16),
            AddressOffset16::SiDisp16(_) => AddressOffset16::SiDisp16(d16),
            AddressOffset16::DiDisp16(_) => AddressOffset16::DiDisp16(d16),
            AddressOffset16::BpDisp16(_) => AddressOffset16::BpDisp16(d16),
            AddressOffset16::BxDisp16(_) => AddressOffset16::BxDisp16(d16),
            mode => mode,
        }
    }

    #[inline(always)]
    pub fn displacement(&self) -> Displacement {
        self.disp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn register_direct_consumes_no_displacement() {
        let mut bytes = Vec::new();
        let mut cur = Cursor::new(&[0xC2u8, 0xFF][..]);
        let modrm = ModRmByte16::read(&mut cur, &mut bytes).unwrap();
        assert!(!modrm.is_addressing_mode());
        assert_eq!(bytes, vec![0xC2]);
        assert_eq!(modrm.op1_reg16(), Register16::DX);
        assert_eq!(modrm.op2_reg16(), Register16::AX);
    }

    #[test]
    fn mod1_loads_one_displacement_byte() {
        let mut bytes = Vec::new();
        let mut cur = Cursor::new(&[0x5Du8, 0x08][..]);
        let modrm = ModRmByte16::read(&mut cur, &mut bytes).unwrap();
        assert_eq!(bytes, vec![0x5D, 0x08]);
        assert_eq!(modrm.displacement(), Displacement::Disp8(8));
        assert_eq!(
            modrm.address_offset(modrm.displacement()),
            AddressOffset16::DiDisp8(8)
        );
    }

    #[test]
    fn direct_mode_loads_word_displacement() {
        let mut bytes = Vec::new();
        let mut cur = Cursor::new(&[0x06u8, 0x56, 0x43][..]);
        let modrm = ModRmByte16::read(&mut cur, &mut bytes).unwrap();
        assert_eq!(bytes, vec![0x06, 0x56, 0x43]);
        assert_eq!(
            modrm.address_offset(modrm.displacement()),
            AddressOffset16::Direct(0x4356)
        );
    }

    #[test]
    fn extension_field_is_reg() {
        let modrm = ModRmByte16::from_byte(0xE8); // mod=3, reg=5, rm=0
        assert_eq!(modrm.op_extension(), 5);
    }
}
