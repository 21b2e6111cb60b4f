mod alu;
mod bit;
mod block;
mod branch;
pub mod disasm;
mod load_store;
pub mod registers;
mod stack;
pub mod tables;

use crate::bits;
use crate::core::Bus;
use crate::core::snapshot::{Snapshot, SnapshotError, SnapshotReader, SnapshotWriter};
use crate::cpu::{Cpu, CpuFault};
use crate::disassembler::Statement;
use crate::memory::Memory;
use tables::{Cond, Entry, Op, Operand8, Operand16, Reg8, Reg16, tables};

pub use crate::alu::Flag;

/// Default clock: 3.072 MHz, the common arcade crystal divided by four.
pub const DEFAULT_CLOCK_HZ: u64 = 3_072_000;

const NMI_VECTOR: u16 = 0x0066;
const IM1_VECTOR: u16 = 0x0038;

pub struct Z80 {
    // Registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    // Shadow Registers
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,
    // Index & Special Registers
    pub ix: u16,
    pub iy: u16,
    pub i: u8,
    pub r: u8,
    pub sp: u16,
    pub pc: u16,

    // Interrupt state
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub halted: bool,
    pub(crate) nmi_pending: bool,
    pub(crate) irq_pending: Option<u8>,

    clock_hz: u64,
}

/// Operand resolved to a concrete location for one instruction.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Loc8 {
    Reg(Reg8),
    I,
    R,
    Mem(u16),
    Port(u16),
    Value(u8),
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum Loc16 {
    Reg(Reg16),
    Mem(u16),
    Value(u16),
}

/// Per-instruction decode context. DDCB/FDCB encodings place the
/// displacement before the final opcode byte, so it arrives prefetched.
#[derive(Default)]
pub(crate) struct Decode {
    pub(crate) displacement: Option<u8>,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_CLOCK_HZ)
    }

    pub fn with_clock(clock_hz: u64) -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0xFF,
            c: 0xFF,
            d: 0xFF,
            e: 0xFF,
            h: 0xFF,
            l: 0xFF,
            a_prime: 0xFF,
            f_prime: 0xFF,
            b_prime: 0xFF,
            c_prime: 0xFF,
            d_prime: 0xFF,
            e_prime: 0xFF,
            h_prime: 0xFF,
            l_prime: 0xFF,
            ix: 0xFFFF,
            iy: 0xFFFF,
            i: 0,
            r: 0,
            sp: 0xFFFF,
            pc: 0x0000,
            iff1: false,
            iff2: false,
            im: 0,
            halted: false,
            nmi_pending: false,
            irq_pending: None,
            clock_hz,
        }
    }

    // Helpers for 16-bit register access
    pub fn get_bc(&self) -> u16 { bits::join(self.b, self.c) }
    pub fn set_bc(&mut self, val: u16) { self.b = bits::hi(val); self.c = bits::lo(val); }

    pub fn get_de(&self) -> u16 { bits::join(self.d, self.e) }
    pub fn set_de(&mut self, val: u16) { self.d = bits::hi(val); self.e = bits::lo(val); }

    pub fn get_hl(&self) -> u16 { bits::join(self.h, self.l) }
    pub fn set_hl(&mut self, val: u16) { self.h = bits::hi(val); self.l = bits::lo(val); }

    pub fn get_af(&self) -> u16 { bits::join(self.a, self.f) }
    pub fn set_af(&mut self, val: u16) { self.a = bits::hi(val); self.f = bits::lo(val); }

    pub fn get_reg8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.a,
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
            Reg8::IXH => bits::hi(self.ix),
            Reg8::IXL => bits::lo(self.ix),
            Reg8::IYH => bits::hi(self.iy),
            Reg8::IYL => bits::lo(self.iy),
        }
    }

    pub fn set_reg8(&mut self, reg: Reg8, val: u8) {
        match reg {
            Reg8::A => self.a = val,
            Reg8::B => self.b = val,
            Reg8::C => self.c = val,
            Reg8::D => self.d = val,
            Reg8::E => self.e = val,
            Reg8::H => self.h = val,
            Reg8::L => self.l = val,
            Reg8::IXH => self.ix = bits::join(val, bits::lo(self.ix)),
            Reg8::IXL => self.ix = bits::join(bits::hi(self.ix), val),
            Reg8::IYH => self.iy = bits::join(val, bits::lo(self.iy)),
            Reg8::IYL => self.iy = bits::join(bits::hi(self.iy), val),
        }
    }

    pub fn get_rp(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::AF => self.get_af(),
            Reg16::BC => self.get_bc(),
            Reg16::DE => self.get_de(),
            Reg16::HL => self.get_hl(),
            Reg16::SP => self.sp,
            Reg16::IX => self.ix,
            Reg16::IY => self.iy,
        }
    }

    pub fn set_rp(&mut self, reg: Reg16, val: u16) {
        match reg {
            Reg16::AF => self.set_af(val),
            Reg16::BC => self.set_bc(val),
            Reg16::DE => self.set_de(val),
            Reg16::HL => self.set_hl(val),
            Reg16::SP => self.sp = val,
            Reg16::IX => self.ix = val,
            Reg16::IY => self.iy = val,
        }
    }

    pub(crate) fn flag(&self, flag: Flag) -> bool {
        self.f & flag as u8 != 0
    }

    pub(crate) fn carry(&self) -> bool {
        self.flag(Flag::C)
    }

    pub(crate) fn condition(&self, cond: Cond) -> bool {
        match cond {
            Cond::NZ => !self.flag(Flag::Z),
            Cond::Z => self.flag(Flag::Z),
            Cond::NC => !self.flag(Flag::C),
            Cond::C => self.flag(Flag::C),
            Cond::PO => !self.flag(Flag::PV),
            Cond::PE => self.flag(Flag::PV),
            Cond::P => !self.flag(Flag::S),
            Cond::M => self.flag(Flag::S),
        }
    }

    /// Bump the refresh counter: low 7 bits roll over, bit 7 is kept.
    pub(crate) fn refresh(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    /// M1 fetch: read an opcode byte and refresh.
    fn fetch_opcode(&mut self, bus: &mut dyn Bus) -> u8 {
        let opcode = self.fetch(bus);
        self.refresh();
        opcode
    }

    pub(crate) fn fetch(&mut self, bus: &mut dyn Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_word(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        bits::join(hi, lo)
    }

    pub(crate) fn read_word(bus: &mut dyn Bus, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr.wrapping_add(1));
        bits::join(hi, lo)
    }

    pub(crate) fn write_word(bus: &mut dyn Bus, addr: u16, val: u16) {
        bus.write(addr, bits::lo(val));
        bus.write(addr.wrapping_add(1), bits::hi(val));
    }

    // --- Operand resolution ---

    pub(crate) fn resolve8(&mut self, bus: &mut dyn Bus, operand: Operand8, ctx: &mut Decode) -> Loc8 {
        match operand {
            Operand8::Reg(r) => Loc8::Reg(r),
            Operand8::I => Loc8::I,
            Operand8::R => Loc8::R,
            Operand8::Imm => Loc8::Value(self.fetch(bus)),
            Operand8::Ind(rr) => Loc8::Mem(self.get_rp(rr)),
            Operand8::Indexed(rr) => {
                let d = match ctx.displacement {
                    Some(d) => d,
                    None => {
                        let d = self.fetch(bus);
                        ctx.displacement = Some(d);
                        d
                    }
                };
                Loc8::Mem(bits::displace(self.get_rp(rr), d))
            }
            Operand8::Abs => Loc8::Mem(self.fetch_word(bus)),
            Operand8::Port => {
                let n = self.fetch(bus);
                Loc8::Port(bits::join(self.a, n))
            }
            Operand8::PortC => Loc8::Port(self.get_bc()),
        }
    }

    pub(crate) fn read8(&mut self, bus: &mut dyn Bus, loc: Loc8) -> u8 {
        match loc {
            Loc8::Reg(r) => self.get_reg8(r),
            Loc8::I => self.i,
            Loc8::R => self.r,
            Loc8::Mem(addr) => bus.read(addr),
            Loc8::Port(addr) => bus.io_read(addr),
            Loc8::Value(v) => v,
        }
    }

    pub(crate) fn write8(&mut self, bus: &mut dyn Bus, loc: Loc8, val: u8) {
        match loc {
            Loc8::Reg(r) => self.set_reg8(r, val),
            Loc8::I => self.i = val,
            Loc8::R => self.r = val,
            Loc8::Mem(addr) => bus.write(addr, val),
            Loc8::Port(addr) => bus.io_write(addr, val),
            Loc8::Value(_) => {}
        }
    }

    pub(crate) fn resolve16(&mut self, bus: &mut dyn Bus, operand: Operand16) -> Loc16 {
        match operand {
            Operand16::Reg(rr) => Loc16::Reg(rr),
            Operand16::Imm => Loc16::Value(self.fetch_word(bus)),
            Operand16::Abs => Loc16::Mem(self.fetch_word(bus)),
        }
    }

    pub(crate) fn read16(&mut self, bus: &mut dyn Bus, loc: Loc16) -> u16 {
        match loc {
            Loc16::Reg(rr) => self.get_rp(rr),
            Loc16::Mem(addr) => Self::read_word(bus, addr),
            Loc16::Value(v) => v,
        }
    }

    pub(crate) fn write16(&mut self, bus: &mut dyn Bus, loc: Loc16, val: u16) {
        match loc {
            Loc16::Reg(rr) => self.set_rp(rr, val),
            Loc16::Mem(addr) => Self::write_word(bus, addr, val),
            Loc16::Value(_) => {}
        }
    }

    // --- Execution ---

    /// Fetch the next instruction, following any prefix chain, and return
    /// its table entry together with the cycles spent on ignored prefixes.
    fn decode(&mut self, bus: &mut dyn Bus, ctx: &mut Decode) -> (Entry, u32) {
        let t = tables();
        let mut ignored = 0;
        let mut index = None;
        let mut opcode = self.fetch_opcode(bus);
        while opcode == 0xDD || opcode == 0xFD {
            // Only the last of a run of index prefixes counts.
            if index.is_some() {
                ignored += 4;
            }
            index = Some(opcode);
            opcode = self.fetch_opcode(bus);
        }

        let entry = match (index, opcode) {
            (Some(_), 0xED) => {
                ignored += 4;
                t.ed[self.fetch_opcode(bus) as usize]
            }
            (None, 0xED) => t.ed[self.fetch_opcode(bus) as usize],
            (None, 0xCB) => t.cb[self.fetch_opcode(bus) as usize],
            (Some(prefix), 0xCB) => {
                ctx.displacement = Some(self.fetch(bus));
                let op = self.fetch(bus) as usize;
                if prefix == 0xDD { t.ddcb[op] } else { t.fdcb[op] }
            }
            (Some(0xDD), op) => t.dd[op as usize],
            (Some(_), op) => t.fd[op as usize],
            (None, op) => t.primary[op as usize],
        };
        (entry, ignored)
    }

    /// Execute one instruction (or one halted cycle) and then service any
    /// pending interrupt. Returns the T-states consumed.
    pub fn step(&mut self, bus: &mut dyn Bus) -> Result<u32, CpuFault> {
        let mut cycles = if self.halted {
            self.refresh();
            4
        } else {
            let mut ctx = Decode::default();
            let (entry, ignored) = self.decode(bus, &mut ctx);
            let extra = self.execute(bus, entry.op, &mut ctx);
            let cycles = entry.cycles as u32 + ignored + extra;
            // EI holds off acceptance until after the following instruction.
            if entry.op == Op::Ei {
                return Ok(cycles);
            }
            cycles
        };
        cycles += self.accept_interrupts(bus)?;
        Ok(cycles)
    }

    /// Run one decoded operation. Returns any cycles beyond the table cost
    /// (taken branches, repeating block instructions).
    fn execute(&mut self, bus: &mut dyn Bus, op: Op, ctx: &mut Decode) -> u32 {
        match op {
            Op::Nop | Op::Prefix => 0,
            Op::Halt => {
                self.halted = true;
                0
            }

            Op::Ld8(dst, src) => self.op_ld8(bus, dst, src, ctx),
            Op::LdAIR(src) => self.op_ld_a_ir(src),
            Op::Ld16(dst, src) => self.op_ld16(bus, dst, src),
            Op::ExAf => self.op_ex_af_af(),
            Op::ExDeHl => self.op_ex_de_hl(),
            Op::Exx => self.op_exx(),
            Op::ExSp(rr) => self.op_ex_sp(bus, rr),
            Op::In(dst, port) => self.op_in(bus, dst, port, ctx),
            Op::Out(port, src) => self.op_out(bus, port, src, ctx),

            Op::Alu(kind, src) => self.op_alu(bus, kind, src, ctx),
            Op::Inc8(o) => self.op_inc8(bus, o, ctx),
            Op::Dec8(o) => self.op_dec8(bus, o, ctx),
            Op::Inc16(rr) => self.op_inc16(rr),
            Op::Dec16(rr) => self.op_dec16(rr),
            Op::Add16(dst, src) => self.op_add16(dst, src),
            Op::Adc16(rr) => self.op_adc16(rr),
            Op::Sbc16(rr) => self.op_sbc16(rr),
            Op::Rlca => self.op_rlca(),
            Op::Rrca => self.op_rrca(),
            Op::Rla => self.op_rla(),
            Op::Rra => self.op_rra(),
            Op::Daa => self.op_daa(),
            Op::Cpl => self.op_cpl(),
            Op::Scf => self.op_scf(),
            Op::Ccf => self.op_ccf(),
            Op::Neg => self.op_neg(),

            Op::Shift(kind, o, copy) => self.op_shift(bus, kind, o, copy, ctx),
            Op::Bit(n, o) => self.op_bit(bus, n, o, ctx),
            Op::Res(n, o, copy) => self.op_res_set(bus, n, false, o, copy, ctx),
            Op::Set(n, o, copy) => self.op_res_set(bus, n, true, o, copy, ctx),
            Op::Rrd => self.op_rrd(bus),
            Op::Rld => self.op_rld(bus),

            Op::Jp(cond) => self.op_jp(bus, cond),
            Op::JpInd(rr) => self.op_jp_ind(rr),
            Op::Jr(cond) => self.op_jr(bus, cond),
            Op::Djnz => self.op_djnz(bus),
            Op::Call(cond) => self.op_call(bus, cond),
            Op::Ret(cond) => self.op_ret(bus, cond),
            Op::Reti | Op::Retn => self.op_retn(bus),
            Op::Rst(p) => self.op_rst(bus, p),
            Op::Di => self.op_di(),
            Op::Ei => self.op_ei(),
            Op::Im(mode) => self.op_im(mode),

            Op::Push(rr) => self.op_push(bus, rr),
            Op::Pop(rr) => self.op_pop(bus, rr),

            Op::Block { kind, decrement, repeat } => self.op_block(bus, kind, decrement, repeat),
        }
    }

    /// Service a pending NMI or maskable interrupt after an instruction.
    fn accept_interrupts(&mut self, bus: &mut dyn Bus) -> Result<u32, CpuFault> {
        if self.nmi_pending {
            self.nmi_pending = false;
            self.halted = false;
            self.iff1 = false;
            self.refresh();
            self.push(bus, self.pc);
            self.pc = NMI_VECTOR;
            log::trace!("z80: NMI accepted");
            return Ok(11);
        }

        let Some(vector) = self.irq_pending else {
            return Ok(0);
        };
        if !self.iff1 {
            return Ok(0);
        }
        let (target, cycles) = match self.im {
            1 => (IM1_VECTOR, 13),
            2 => {
                let table = bits::join(self.i, vector);
                (Self::read_word(bus, table), 19)
            }
            mode => return Err(CpuFault::UnsupportedInterruptMode(mode)),
        };
        self.irq_pending = None;
        self.halted = false;
        self.iff1 = false;
        self.iff2 = false;
        self.refresh();
        self.push(bus, self.pc);
        self.pc = target;
        log::trace!("z80: IM{} interrupt (vector {vector:#04x}) -> {target:#06x}", self.im);
        Ok(cycles)
    }
}

impl Cpu for Z80 {
    fn step(&mut self, bus: &mut dyn Bus) -> Result<u32, CpuFault> {
        Z80::step(self, bus)
    }

    fn reset(&mut self) {
        self.a = 0xFF;
        self.f = 0xFF;
        self.sp = 0xFFFF;
        self.pc = 0x0000;
        self.i = 0;
        self.r = 0;
        self.im = 0;
        self.iff1 = false;
        self.iff2 = false;
        self.halted = false;
        self.nmi_pending = false;
        self.irq_pending = None;
    }

    fn program_counter(&self) -> u16 {
        self.pc
    }

    fn set_program_counter(&mut self, pc: u16) {
        self.pc = pc;
    }

    fn is_ready(&self) -> bool {
        !self.halted
    }

    fn raise_interrupt(&mut self, vector: u8) {
        self.irq_pending = Some(vector);
    }

    fn raise_nmi(&mut self) {
        self.nmi_pending = true;
    }

    fn register_names(&self) -> &'static [&'static str] {
        &registers::NAMES
    }

    fn register(&self, name: &str) -> Option<u16> {
        registers::find(name).map(|reg| (reg.get)(self))
    }

    fn set_register(&mut self, name: &str, value: u16) -> bool {
        match registers::find(name) {
            Some(reg) => {
                (reg.set)(self, value);
                true
            }
            None => false,
        }
    }

    fn clock_rate(&self) -> u64 {
        self.clock_hz
    }

    fn disassemble(&self, memory: &dyn Memory, address: u16) -> Statement {
        disasm::disassemble(memory, address)
    }
}

impl Snapshot for Z80 {
    fn save(&self, out: &mut SnapshotWriter) {
        let persisted = &registers::TABLE[..registers::PERSISTED];
        out.put_u16(persisted.len() as u16);
        for reg in persisted {
            out.put_u16((reg.get)(self));
        }
        out.put_bool(self.iff1);
        out.put_bool(self.iff2);
        out.put_u8(self.im);
        out.put_bool(self.halted);
        out.put_bool(self.nmi_pending);
        out.put_bool(self.irq_pending.is_some());
        out.put_u8(self.irq_pending.unwrap_or(0));
    }

    fn restore(&mut self, input: &mut SnapshotReader<'_>) -> Result<(), SnapshotError> {
        let count = input.get_u16()? as usize;
        if count != registers::PERSISTED {
            return Err(SnapshotError::LengthMismatch {
                expected: registers::PERSISTED,
                actual: count,
            });
        }
        let mut values = [0u16; registers::PERSISTED];
        for value in values.iter_mut() {
            *value = input.get_u16()?;
        }
        let iff1 = input.get_bool()?;
        let iff2 = input.get_bool()?;
        let im = input.get_u8()?;
        if im > 2 {
            return Err(SnapshotError::InvalidValue { field: "interrupt mode", value: im });
        }
        let halted = input.get_bool()?;
        let nmi_pending = input.get_bool()?;
        let irq_flag = input.get_bool()?;
        let irq_vector = input.get_u8()?;

        for (reg, value) in registers::TABLE.iter().zip(values) {
            (reg.set)(self, value);
        }
        self.iff1 = iff1;
        self.iff2 = iff2;
        self.im = im;
        self.halted = halted;
        self.nmi_pending = nmi_pending;
        self.irq_pending = irq_flag.then_some(irq_vector);
        Ok(())
    }
}
