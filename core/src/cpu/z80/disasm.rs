//! Statement decoding over the executor's opcode tables.
//!
//! Operand bytes are consumed from the cursor in the same order the
//! executor fetches them, so the byte count of a statement always matches
//! what a step would consume.

use crate::bits;
use crate::disassembler::Statement;
use crate::memory::{Cursor, Memory};

use super::tables::{
    AluOp, BlockKind, Cond, Entry, Op, Operand8, Operand16, Reg8, Reg16, Shift, tables,
};

struct Decoder<'a> {
    cursor: Cursor<'a>,
    displacement: Option<u8>,
}

pub fn disassemble(memory: &dyn Memory, address: u16) -> Statement {
    let mut decoder = Decoder {
        cursor: Cursor::new(memory, address),
        displacement: None,
    };
    let entry = decoder.decode();
    let (mnemonic, operands) = decoder.format(entry.op);

    let len = decoder.cursor.position().wrapping_sub(address);
    let bytes = (0..len).map(|n| memory.load(address.wrapping_add(n))).collect();
    Statement {
        address,
        bytes,
        mnemonic,
        operands,
    }
}

impl Decoder<'_> {
    fn decode(&mut self) -> Entry {
        let t = tables();
        let mut index = None;
        let mut opcode = self.cursor.fetch();
        while opcode == 0xDD || opcode == 0xFD {
            index = Some(opcode);
            opcode = self.cursor.fetch();
        }
        match (index, opcode) {
            (_, 0xED) => t.ed[self.cursor.fetch() as usize],
            (None, 0xCB) => t.cb[self.cursor.fetch() as usize],
            (Some(prefix), 0xCB) => {
                self.displacement = Some(self.cursor.fetch());
                let op = self.cursor.fetch() as usize;
                if prefix == 0xDD { t.ddcb[op] } else { t.fdcb[op] }
            }
            (Some(0xDD), op) => t.dd[op as usize],
            (Some(_), op) => t.fd[op as usize],
            (None, op) => t.primary[op as usize],
        }
    }

    fn byte(&mut self) -> String {
        format!("${:02X}", self.cursor.fetch())
    }

    fn word(&mut self) -> String {
        format!("${:04X}", self.cursor.fetch_word())
    }

    /// Relative branch target, resolved against the following instruction.
    fn relative(&mut self) -> String {
        let e = self.cursor.fetch();
        format!("${:04X}", bits::displace(self.cursor.position(), e))
    }

    fn operand8(&mut self, operand: Operand8) -> String {
        match operand {
            Operand8::Reg(r) => reg8(r).to_string(),
            Operand8::I => "I".to_string(),
            Operand8::R => "R".to_string(),
            Operand8::Imm => self.byte(),
            Operand8::Ind(rr) => format!("({})", reg16(rr)),
            Operand8::Indexed(rr) => {
                let d = match self.displacement {
                    Some(d) => d,
                    None => {
                        let d = self.cursor.fetch();
                        self.displacement = Some(d);
                        d
                    }
                };
                let (sign, magnitude) = if (d as i8) < 0 {
                    ('-', (d as i8).unsigned_abs())
                } else {
                    ('+', d)
                };
                format!("({}{sign}${magnitude:02X})", reg16(rr))
            }
            Operand8::Abs => format!("({})", self.word()),
            Operand8::Port => format!("({})", self.byte()),
            Operand8::PortC => "(C)".to_string(),
        }
    }

    fn operand16(&mut self, operand: Operand16) -> String {
        match operand {
            Operand16::Reg(rr) => reg16(rr).to_string(),
            Operand16::Imm => self.word(),
            Operand16::Abs => format!("({})", self.word()),
        }
    }

    fn pair(&mut self, first: Operand8, second: Operand8) -> String {
        let first = self.operand8(first);
        let second = self.operand8(second);
        format!("{first},{second}")
    }

    /// Operand text with an optional register copy (`RLC (IX+$05),B`).
    fn with_copy(&mut self, prefix: String, target: Operand8, copy: Option<Reg8>) -> String {
        let target = self.operand8(target);
        match copy {
            Some(r) => format!("{prefix}{target},{}", reg8(r)),
            None => format!("{prefix}{target}"),
        }
    }

    fn format(&mut self, op: Op) -> (&'static str, String) {
        let none = String::new;
        match op {
            Op::Nop | Op::Prefix => ("NOP", none()),
            Op::Halt => ("HALT", none()),
            Op::Ld8(dst, src) => ("LD", self.pair(dst, src)),
            Op::LdAIR(src) => ("LD", self.pair(Operand8::Reg(Reg8::A), src)),
            Op::Ld16(dst, src) => {
                let dst = self.operand16(dst);
                let src = self.operand16(src);
                ("LD", format!("{dst},{src}"))
            }
            Op::Alu(kind, src) => {
                let src = self.operand8(src);
                match kind {
                    AluOp::Add => ("ADD", format!("A,{src}")),
                    AluOp::Adc => ("ADC", format!("A,{src}")),
                    AluOp::Sub => ("SUB", src),
                    AluOp::Sbc => ("SBC", format!("A,{src}")),
                    AluOp::And => ("AND", src),
                    AluOp::Xor => ("XOR", src),
                    AluOp::Or => ("OR", src),
                    AluOp::Cp => ("CP", src),
                }
            }
            Op::Inc8(o) => ("INC", self.operand8(o)),
            Op::Dec8(o) => ("DEC", self.operand8(o)),
            Op::Inc16(rr) => ("INC", reg16(rr).to_string()),
            Op::Dec16(rr) => ("DEC", reg16(rr).to_string()),
            Op::Add16(dst, src) => ("ADD", format!("{},{}", reg16(dst), reg16(src))),
            Op::Adc16(rr) => ("ADC", format!("HL,{}", reg16(rr))),
            Op::Sbc16(rr) => ("SBC", format!("HL,{}", reg16(rr))),
            Op::Rlca => ("RLCA", none()),
            Op::Rrca => ("RRCA", none()),
            Op::Rla => ("RLA", none()),
            Op::Rra => ("RRA", none()),
            Op::Daa => ("DAA", none()),
            Op::Cpl => ("CPL", none()),
            Op::Scf => ("SCF", none()),
            Op::Ccf => ("CCF", none()),
            Op::Neg => ("NEG", none()),
            Op::Shift(kind, target, copy) => (shift(kind), self.with_copy(String::new(), target, copy)),
            Op::Bit(n, target) => ("BIT", format!("{n},{}", self.operand8(target))),
            Op::Res(n, target, copy) => ("RES", self.with_copy(format!("{n},"), target, copy)),
            Op::Set(n, target, copy) => ("SET", self.with_copy(format!("{n},"), target, copy)),
            Op::Rrd => ("RRD", none()),
            Op::Rld => ("RLD", none()),
            Op::Jp(None) => ("JP", self.word()),
            Op::Jp(Some(cc)) => ("JP", format!("{},{}", cond(cc), self.word())),
            Op::JpInd(rr) => ("JP", format!("({})", reg16(rr))),
            Op::Jr(None) => ("JR", self.relative()),
            Op::Jr(Some(cc)) => ("JR", format!("{},{}", cond(cc), self.relative())),
            Op::Djnz => ("DJNZ", self.relative()),
            Op::Call(None) => ("CALL", self.word()),
            Op::Call(Some(cc)) => ("CALL", format!("{},{}", cond(cc), self.word())),
            Op::Ret(None) => ("RET", none()),
            Op::Ret(Some(cc)) => ("RET", cond(cc).to_string()),
            Op::Reti => ("RETI", none()),
            Op::Retn => ("RETN", none()),
            Op::Rst(p) => ("RST", format!("${p:02X}")),
            Op::Push(rr) => ("PUSH", reg16(rr).to_string()),
            Op::Pop(rr) => ("POP", reg16(rr).to_string()),
            Op::ExAf => ("EX", "AF,AF'".to_string()),
            Op::ExDeHl => ("EX", "DE,HL".to_string()),
            Op::Exx => ("EXX", none()),
            Op::ExSp(rr) => ("EX", format!("(SP),{}", reg16(rr))),
            Op::Di => ("DI", none()),
            Op::Ei => ("EI", none()),
            Op::Im(mode) => ("IM", mode.to_string()),
            Op::In(dst, port) => {
                let port = self.operand8(port);
                match dst {
                    Some(r) => ("IN", format!("{},{port}", reg8(r))),
                    None => ("IN", port),
                }
            }
            Op::Out(port, src) => {
                let port = self.operand8(port);
                let src = src.map_or("0", reg8);
                ("OUT", format!("{port},{src}"))
            }
            Op::Block { kind, decrement, repeat } => (block(kind, decrement, repeat), none()),
        }
    }
}

fn reg8(r: Reg8) -> &'static str {
    match r {
        Reg8::A => "A",
        Reg8::B => "B",
        Reg8::C => "C",
        Reg8::D => "D",
        Reg8::E => "E",
        Reg8::H => "H",
        Reg8::L => "L",
        Reg8::IXH => "IXH",
        Reg8::IXL => "IXL",
        Reg8::IYH => "IYH",
        Reg8::IYL => "IYL",
    }
}

fn reg16(rr: Reg16) -> &'static str {
    match rr {
        Reg16::AF => "AF",
        Reg16::BC => "BC",
        Reg16::DE => "DE",
        Reg16::HL => "HL",
        Reg16::SP => "SP",
        Reg16::IX => "IX",
        Reg16::IY => "IY",
    }
}

fn cond(cc: Cond) -> &'static str {
    match cc {
        Cond::NZ => "NZ",
        Cond::Z => "Z",
        Cond::NC => "NC",
        Cond::C => "C",
        Cond::PO => "PO",
        Cond::PE => "PE",
        Cond::P => "P",
        Cond::M => "M",
    }
}

fn shift(kind: Shift) -> &'static str {
    match kind {
        Shift::Rlc => "RLC",
        Shift::Rrc => "RRC",
        Shift::Rl => "RL",
        Shift::Rr => "RR",
        Shift::Sla => "SLA",
        Shift::Sra => "SRA",
        Shift::Sll => "SLL",
        Shift::Srl => "SRL",
    }
}

fn block(kind: BlockKind, decrement: bool, repeat: bool) -> &'static str {
    match (kind, decrement, repeat) {
        (BlockKind::Ld, false, false) => "LDI",
        (BlockKind::Ld, true, false) => "LDD",
        (BlockKind::Ld, false, true) => "LDIR",
        (BlockKind::Ld, true, true) => "LDDR",
        (BlockKind::Cp, false, false) => "CPI",
        (BlockKind::Cp, true, false) => "CPD",
        (BlockKind::Cp, false, true) => "CPIR",
        (BlockKind::Cp, true, true) => "CPDR",
        (BlockKind::In, false, false) => "INI",
        (BlockKind::In, true, false) => "IND",
        (BlockKind::In, false, true) => "INIR",
        (BlockKind::In, true, true) => "INDR",
        (BlockKind::Out, false, false) => "OUTI",
        (BlockKind::Out, true, false) => "OUTD",
        (BlockKind::Out, false, true) => "OTIR",
        (BlockKind::Out, true, true) => "OTDR",
    }
}
