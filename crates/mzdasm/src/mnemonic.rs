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
use std::fmt::{Display, Formatter};

/// The closed set of operations decodable from the 8086/8088 subset. One
/// variant per operation; opcode bytes with no decoding map to `Invalid`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    #[default]
    Invalid,
    AAA,
    AAD,
    AAM,
    AAS,
    ADC,
    ADD,
    AND,
    CALL,
    CALLF,
    CBW,
    CLC,
    CLD,
    CLI,
    CMC,
    CMP,
    CMPSB,
    CMPSW,
    CWD,
    DAA,
    DAS,
    DEC,
    DIV,
    HLT,
    IDIV,
    IMUL,
    IN,
    INC,
    INT,
    INT3,
    INTO,
    IRET,
    JB,
    JBE,
    JCXZ,
    JL,
    JLE,
    JMP,
    JMPF,
    JNB,
    JNBE,
    JNL,
    JNLE,
    JNO,
    JNP,
    JNS,
    JNZ,
    JO,
    JP,
    JS,
    JZ,
    LAHF,
    LDS,
    LEA,
    LES,
    LODS,
    LOOP,
    LOOPE,
    LOOPNE,
    MOV,
    MOVSB,
    MOVSW,
    MUL,
    NEG,
    NOP,
    NOT,
    OR,
    OUT,
    POP,
    POPF,
    PUSH,
    PUSHF,
    RCL,
    RCR,
    RET,
    RETF,
    ROL,
    ROR,
    SAHF,
    SAR,
    SBB,
    SCASB,
    SCASW,
    SHL,
    SHR,
    STC,
    STD,
    STI,
    STOSB,
    STOSW,
    SUB,
    TEST,
    WAIT,
    XCHG,
    XLAT,
    XOR,
}

pub(crate) fn mnemonic_to_str(op: Mnemonic) -> &'static str {
    use Mnemonic::*;
    match op {
        Invalid => "(bad)",
        AAA => "AAA",
        AAD => "AAD",
        AAM => "AAM",
        AAS => "AAS",
        ADC => "ADC",
        ADD => "ADD",
        AND => "AND",
        CALL => "CALL",
        CALLF => "CALL",
        CBW => "CBW",
        CLC => "CLC",
        CLD => "CLD",
        CLI => "CLI",
        CMC => "CMC",
        CMP => "CMP",
        CMPSB => "CMPSB",
        CMPSW => "CMPSW",
        CWD => "CWD",
        DAA => "DAA",
        DAS => "DAS",
        DEC => "DEC",
        DIV => "DIV",
        HLT => "HLT",
        IDIV => "IDIV",
        IMUL => "IMUL",
        IN => "IN",
        INC => "INC",
        INT => "INT",
        INT3 => "INT3",
        INTO => "INTO",
        IRET => "IRET",
        JB => "JB",
        JBE => "JBE",
        JCXZ => "JCXZ",
        JL => "JL",
        JLE => "JLE",
        JMP => "JMP",
        JMPF => "JMP",
        JNB => "JNB",
        JNBE => "JNBE",
        JNL => "JNL",
        JNLE => "JNLE",
        JNO => "JNO",
        JNP => "JNP",
        JNS => "JNS",
        JNZ => "JNZ",
        JO => "JO",
        JP => "JP",
        JS => "JS",
        JZ => "JZ",
        LAHF => "LAHF",
        LDS => "LDS",
        LEA => "LEA",
        LES => "LES",
        LODS => "LODS",
        LOOP => "LOOP",
        LOOPE => "LOOPE",
        LOOPNE => "LOOPNE",
        MOV => "MOV",
        MOVSB => "MOVSB",
        MOVSW => "MOVSW",
        MUL => "MUL",
        NEG => "NEG",
        NOP => "NOP",
        NOT => "NOT",
        OR => "OR",
        OUT => "OUT",
        POP => "POP",
        POPF => "POPF",
        PUSH => "PUSH",
        PUSHF => "PUSHF",
        RCL => "RCL",
        RCR => "RCR",
        RET => "RET",
        RETF => "RETF",
        ROL => "ROL",
        ROR => "ROR",
        SAHF => "SAHF",
        SAR => "SAR",
        SBB => "SBB",
        SCASB => "SCASB",
        SCASW => "SCASW",
        SHL => "SHL",
        SHR => "SHR",
        STC => "STC",
        STD => "STD",
        STI => "STI",
        STOSB => "STOSB",
        STOSW => "STOSW",
        SUB => "SUB",
        TEST => "TEST",
        WAIT => "WAIT",
        XCHG => "XCHG",
        XLAT => "XLAT",
        XOR => "XOR",
    }
}

impl Display for Mnemonic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", mnemonic_to_str(*self))
    }
}

impl Mnemonic {
    pub fn to_str(&self) -> &'static str {
        mnemonic_to_str(*self)
    }

    pub fn is_string_op(&self) -> bool {
        matches!(
            self,
            Mnemonic::MOVSB
                | Mnemonic::MOVSW
                | Mnemonic::CMPSB
                | Mnemonic::CMPSW
                | Mnemonic::SCASB
                | Mnemonic::SCASW
                | Mnemonic::LODS
                | Mnemonic::STOSB
                | Mnemonic::STOSW
        )
    }

    pub fn is_far(&self) -> bool {
        matches!(self, Mnemonic::JMPF | Mnemonic::CALLF)
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Mnemonic::CALL | Mnemonic::CALLF)
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Mnemonic::RET | Mnemonic::RETF)
    }
}
