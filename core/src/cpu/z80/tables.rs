//! Opcode tables shared by the executor and the disassembler.
//!
//! Seven 256-entry tables (primary, CB, ED, DD, FD, DDCB, FDCB) map an
//! opcode byte to a tagged [`Op`] plus its base T-state cost. The DD/FD
//! tables are derived from the primary table by substituting the index
//! register for HL; instructions that never touch HL come through
//! unchanged and simply pay for the prefix fetch.

use std::sync::LazyLock;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    IXH,
    IXL,
    IYH,
    IYL,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
    IX,
    IY,
}

/// 8-bit operand addressing modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operand8 {
    Reg(Reg8),
    I,
    R,
    /// `n`, fetched from the instruction stream.
    Imm,
    /// `(BC)`, `(DE)`, `(HL)`.
    Ind(Reg16),
    /// `(IX+d)` / `(IY+d)`; the displacement follows the opcode.
    Indexed(Reg16),
    /// `(nn)`.
    Abs,
    /// `(n)` in the I/O space, high address byte from A.
    Port,
    /// `(C)` in the I/O space, full address from BC.
    PortC,
}

/// 16-bit operand addressing modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operand16 {
    Reg(Reg16),
    /// `nn`.
    Imm,
    /// `(nn)`, a little-endian word in memory.
    Abs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cond {
    NZ,
    Z,
    NC,
    C,
    PO,
    PE,
    P,
    M,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shift {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Sll,
    Srl,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Ld,
    Cp,
    In,
    Out,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Nop,
    Halt,
    /// Lead byte of a longer encoding; consumed by the fetch loop.
    Prefix,
    Ld8(Operand8, Operand8),
    /// `LD A,I` / `LD A,R`, the only 8-bit loads that touch flags.
    LdAIR(Operand8),
    Ld16(Operand16, Operand16),
    Alu(AluOp, Operand8),
    Inc8(Operand8),
    Dec8(Operand8),
    Inc16(Reg16),
    Dec16(Reg16),
    Add16(Reg16, Reg16),
    Adc16(Reg16),
    Sbc16(Reg16),
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Neg,
    /// Rotate/shift; indexed forms may also copy the result to a register.
    Shift(Shift, Operand8, Option<Reg8>),
    Bit(u8, Operand8),
    Res(u8, Operand8, Option<Reg8>),
    Set(u8, Operand8, Option<Reg8>),
    Rrd,
    Rld,
    Jp(Option<Cond>),
    JpInd(Reg16),
    Jr(Option<Cond>),
    Djnz,
    Call(Option<Cond>),
    Ret(Option<Cond>),
    Reti,
    Retn,
    Rst(u8),
    Push(Reg16),
    Pop(Reg16),
    ExAf,
    ExDeHl,
    Exx,
    ExSp(Reg16),
    Di,
    Ei,
    Im(u8),
    /// `IN A,(n)`, `IN r,(C)`; `None` discards the value (`IN (C)`).
    In(Option<Reg8>, Operand8),
    /// `OUT (n),A`, `OUT (C),r`; `None` writes zero (`OUT (C),0`).
    Out(Operand8, Option<Reg8>),
    Block {
        kind: BlockKind,
        decrement: bool,
        repeat: bool,
    },
}

#[derive(Copy, Clone, Debug)]
pub struct Entry {
    pub op: Op,
    pub cycles: u8,
}

const fn entry(op: Op, cycles: u8) -> Entry {
    Entry { op, cycles }
}

pub struct Tables {
    pub primary: [Entry; 256],
    pub cb: [Entry; 256],
    pub ed: [Entry; 256],
    pub dd: [Entry; 256],
    pub fd: [Entry; 256],
    pub ddcb: [Entry; 256],
    pub fdcb: [Entry; 256],
}

static TABLES: LazyLock<Tables> = LazyLock::new(Tables::build);

pub fn tables() -> &'static Tables {
    &TABLES
}

impl Tables {
    fn build() -> Self {
        let primary: [Entry; 256] = std::array::from_fn(|n| primary(n as u8));
        Self {
            cb: std::array::from_fn(|n| cb(n as u8)),
            ed: std::array::from_fn(|n| ed(n as u8)),
            dd: std::array::from_fn(|n| indexed(primary[n], Reg16::IX)),
            fd: std::array::from_fn(|n| indexed(primary[n], Reg16::IY)),
            ddcb: std::array::from_fn(|n| indexed_cb(n as u8, Reg16::IX)),
            fdcb: std::array::from_fn(|n| indexed_cb(n as u8, Reg16::IY)),
            primary,
        }
    }
}

// --- Field decoding (x = bits 7-6, y = bits 5-3, z = bits 2-0, p = y >> 1, q = y & 1) ---

const HL_MEM: Operand8 = Operand8::Ind(Reg16::HL);

fn r(index: u8) -> Operand8 {
    match index {
        6 => HL_MEM,
        n => Operand8::Reg(reg8(n)),
    }
}

fn reg8(index: u8) -> Reg8 {
    match index & 7 {
        0 => Reg8::B,
        1 => Reg8::C,
        2 => Reg8::D,
        3 => Reg8::E,
        4 => Reg8::H,
        5 => Reg8::L,
        7 => Reg8::A,
        _ => unreachable!("register index 6 is (HL)"),
    }
}

fn rp(p: u8) -> Reg16 {
    [Reg16::BC, Reg16::DE, Reg16::HL, Reg16::SP][p as usize]
}

fn rp2(p: u8) -> Reg16 {
    [Reg16::BC, Reg16::DE, Reg16::HL, Reg16::AF][p as usize]
}

fn cc(y: u8) -> Cond {
    [Cond::NZ, Cond::Z, Cond::NC, Cond::C, Cond::PO, Cond::PE, Cond::P, Cond::M][y as usize]
}

fn alu(y: u8) -> AluOp {
    [
        AluOp::Add,
        AluOp::Adc,
        AluOp::Sub,
        AluOp::Sbc,
        AluOp::And,
        AluOp::Xor,
        AluOp::Or,
        AluOp::Cp,
    ][y as usize]
}

fn rot(y: u8) -> Shift {
    [
        Shift::Rlc,
        Shift::Rrc,
        Shift::Rl,
        Shift::Rr,
        Shift::Sla,
        Shift::Sra,
        Shift::Sll,
        Shift::Srl,
    ][y as usize]
}

fn fields(opcode: u8) -> (u8, u8, u8, u8, u8) {
    let y = (opcode >> 3) & 7;
    (opcode >> 6, y, opcode & 7, y >> 1, y & 1)
}

fn primary(opcode: u8) -> Entry {
    use Op::*;
    let (x, y, z, p, q) = fields(opcode);
    let a = Operand8::Reg(Reg8::A);
    match (x, z) {
        (0, 0) => match y {
            0 => entry(Nop, 4),
            1 => entry(ExAf, 4),
            2 => entry(Djnz, 8),
            3 => entry(Jr(None), 12),
            _ => entry(Jr(Some(cc(y - 4))), 7),
        },
        (0, 1) if q == 0 => entry(Ld16(Operand16::Reg(rp(p)), Operand16::Imm), 10),
        (0, 1) => entry(Add16(Reg16::HL, rp(p)), 11),
        (0, 2) => match (q, p) {
            (0, 0) => entry(Ld8(Operand8::Ind(Reg16::BC), a), 7),
            (0, 1) => entry(Ld8(Operand8::Ind(Reg16::DE), a), 7),
            (0, 2) => entry(Ld16(Operand16::Abs, Operand16::Reg(Reg16::HL)), 16),
            (0, _) => entry(Ld8(Operand8::Abs, a), 13),
            (_, 0) => entry(Ld8(a, Operand8::Ind(Reg16::BC)), 7),
            (_, 1) => entry(Ld8(a, Operand8::Ind(Reg16::DE)), 7),
            (_, 2) => entry(Ld16(Operand16::Reg(Reg16::HL), Operand16::Abs), 16),
            (_, _) => entry(Ld8(a, Operand8::Abs), 13),
        },
        (0, 3) if q == 0 => entry(Inc16(rp(p)), 6),
        (0, 3) => entry(Dec16(rp(p)), 6),
        (0, 4) => entry(Inc8(r(y)), if y == 6 { 11 } else { 4 }),
        (0, 5) => entry(Dec8(r(y)), if y == 6 { 11 } else { 4 }),
        (0, 6) => entry(Ld8(r(y), Operand8::Imm), if y == 6 { 10 } else { 7 }),
        (0, _) => {
            let op = [Rlca, Rrca, Rla, Rra, Daa, Cpl, Scf, Ccf][y as usize];
            entry(op, 4)
        }
        (1, 6) if y == 6 => entry(Halt, 4),
        (1, _) => entry(Ld8(r(y), r(z)), if y == 6 || z == 6 { 7 } else { 4 }),
        (2, _) => entry(Alu(alu(y), r(z)), if z == 6 { 7 } else { 4 }),
        (_, 0) => entry(Ret(Some(cc(y))), 5),
        (_, 1) if q == 0 => entry(Pop(rp2(p)), 10),
        (_, 1) => match p {
            0 => entry(Ret(None), 10),
            1 => entry(Exx, 4),
            2 => entry(JpInd(Reg16::HL), 4),
            _ => entry(Ld16(Operand16::Reg(Reg16::SP), Operand16::Reg(Reg16::HL)), 6),
        },
        (_, 2) => entry(Jp(Some(cc(y))), 10),
        (_, 3) => match y {
            0 => entry(Jp(None), 10),
            1 => entry(Prefix, 4),
            2 => entry(Out(Operand8::Port, Some(Reg8::A)), 11),
            3 => entry(In(Some(Reg8::A), Operand8::Port), 11),
            4 => entry(ExSp(Reg16::HL), 19),
            5 => entry(ExDeHl, 4),
            6 => entry(Di, 4),
            _ => entry(Ei, 4),
        },
        (_, 4) => entry(Call(Some(cc(y))), 10),
        (_, 5) if q == 0 => entry(Push(rp2(p)), 11),
        (_, 5) if p == 0 => entry(Call(None), 17),
        (_, 5) => entry(Prefix, 4),
        (_, 6) => entry(Alu(alu(y), Operand8::Imm), 7),
        (_, _) => entry(Rst(y * 8), 11),
    }
}

fn cb(opcode: u8) -> Entry {
    let (x, y, z, _, _) = fields(opcode);
    let target = r(z);
    let memory = z == 6;
    match x {
        0 => entry(Op::Shift(rot(y), target, None), if memory { 15 } else { 8 }),
        1 => entry(Op::Bit(y, target), if memory { 12 } else { 8 }),
        2 => entry(Op::Res(y, target, None), if memory { 15 } else { 8 }),
        _ => entry(Op::Set(y, target, None), if memory { 15 } else { 8 }),
    }
}

fn ed(opcode: u8) -> Entry {
    use Op::*;
    let (x, y, z, p, q) = fields(opcode);
    match (x, z) {
        (1, 0) => entry(In(if y == 6 { None } else { Some(reg8(y)) }, Operand8::PortC), 12),
        (1, 1) => entry(Out(Operand8::PortC, if y == 6 { None } else { Some(reg8(y)) }), 12),
        (1, 2) if q == 0 => entry(Sbc16(rp(p)), 15),
        (1, 2) => entry(Adc16(rp(p)), 15),
        (1, 3) if q == 0 => entry(Ld16(Operand16::Abs, Operand16::Reg(rp(p))), 20),
        (1, 3) => entry(Ld16(Operand16::Reg(rp(p)), Operand16::Abs), 20),
        (1, 4) => entry(Neg, 8),
        (1, 5) if y == 1 => entry(Reti, 14),
        (1, 5) => entry(Retn, 14),
        (1, 6) => entry(Im([0, 0, 1, 2][(y & 3) as usize]), 8),
        (1, _) => match y {
            0 => entry(Ld8(Operand8::I, Operand8::Reg(Reg8::A)), 9),
            1 => entry(Ld8(Operand8::R, Operand8::Reg(Reg8::A)), 9),
            2 => entry(LdAIR(Operand8::I), 9),
            3 => entry(LdAIR(Operand8::R), 9),
            4 => entry(Rrd, 18),
            5 => entry(Rld, 18),
            _ => entry(Nop, 8),
        },
        (2, 0..=3) if y >= 4 => {
            let kind = [BlockKind::Ld, BlockKind::Cp, BlockKind::In, BlockKind::Out][z as usize];
            let op = Block {
                kind,
                decrement: y & 1 != 0,
                repeat: y >= 6,
            };
            entry(op, 16)
        }
        _ => entry(Nop, 8),
    }
}

fn halves(index: Reg16) -> (Reg8, Reg8) {
    match index {
        Reg16::IX => (Reg8::IXH, Reg8::IXL),
        _ => (Reg8::IYH, Reg8::IYL),
    }
}

/// Derive a DD/FD entry from the unprefixed one.
fn indexed(base: Entry, index: Reg16) -> Entry {
    use Op::*;
    let (high, low) = halves(index);
    let half = |o: Operand8| match o {
        Operand8::Reg(Reg8::H) => Operand8::Reg(high),
        Operand8::Reg(Reg8::L) => Operand8::Reg(low),
        o => o,
    };
    let memory = |o: Operand8| if o == HL_MEM { Operand8::Indexed(index) } else { o };
    let wide = |r: Reg16| if r == Reg16::HL { index } else { r };
    let wide16 = |o: Operand16| match o {
        Operand16::Reg(r) => Operand16::Reg(wide(r)),
        o => o,
    };

    let cycles = base.cycles + 4;
    match base.op {
        Ld8(HL_MEM, Operand8::Imm) => entry(Ld8(Operand8::Indexed(index), Operand8::Imm), 19),
        Ld8(dst, src) if dst == HL_MEM || src == HL_MEM => {
            entry(Ld8(memory(dst), memory(src)), cycles + 8)
        }
        Ld8(dst, src) => entry(Ld8(half(dst), half(src)), cycles),
        Alu(op, HL_MEM) => entry(Alu(op, Operand8::Indexed(index)), cycles + 8),
        Alu(op, src) => entry(Alu(op, half(src)), cycles),
        Inc8(HL_MEM) => entry(Inc8(Operand8::Indexed(index)), cycles + 8),
        Inc8(o) => entry(Inc8(half(o)), cycles),
        Dec8(HL_MEM) => entry(Dec8(Operand8::Indexed(index)), cycles + 8),
        Dec8(o) => entry(Dec8(half(o)), cycles),
        Ld16(dst, src) => entry(Ld16(wide16(dst), wide16(src)), cycles),
        Inc16(rr) => entry(Inc16(wide(rr)), cycles),
        Dec16(rr) => entry(Dec16(wide(rr)), cycles),
        Add16(dst, src) => entry(Add16(wide(dst), wide(src)), cycles),
        Push(rr) => entry(Push(wide(rr)), cycles),
        Pop(rr) => entry(Pop(wide(rr)), cycles),
        ExSp(rr) => entry(ExSp(wide(rr)), cycles),
        JpInd(rr) => entry(JpInd(wide(rr)), cycles),
        op => entry(op, cycles),
    }
}

/// DD CB d op / FD CB d op. Every form addresses `(index+d)`; register
/// encodings other than 6 also copy the result into that register.
fn indexed_cb(opcode: u8, index: Reg16) -> Entry {
    let (x, y, z, _, _) = fields(opcode);
    let target = Operand8::Indexed(index);
    let copy = if z == 6 { None } else { Some(reg8(z)) };
    match x {
        0 => entry(Op::Shift(rot(y), target, copy), 23),
        1 => entry(Op::Bit(y, target), 20),
        2 => entry(Op::Res(y, target, copy), 23),
        _ => entry(Op::Set(y, target, copy), 23),
    }
}
