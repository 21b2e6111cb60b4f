use crate::alu;
use crate::bits;
use crate::core::Bus;
use crate::cpu::z80::tables::{Operand8, Reg8, Shift};
use crate::cpu::z80::{Decode, Flag, Loc8, Z80};

impl Z80 {
    /// CB rotate/shift group. 8 T register, 15 T (HL), 23 T (IX+d).
    /// Indexed forms with a register field also copy the result there.
    pub(crate) fn op_shift(
        &mut self,
        bus: &mut dyn Bus,
        kind: Shift,
        target: Operand8,
        copy: Option<Reg8>,
        ctx: &mut Decode,
    ) -> u32 {
        let loc = self.resolve8(bus, target, ctx);
        let val = self.read8(bus, loc);
        let carry = self.carry();
        let (result, f) = match kind {
            Shift::Rlc => alu::rlc(val),
            Shift::Rrc => alu::rrc(val),
            Shift::Rl => alu::rl(val, carry),
            Shift::Rr => alu::rr(val, carry),
            Shift::Sla => alu::sla(val),
            Shift::Sra => alu::sra(val),
            Shift::Sll => alu::sll(val),
            Shift::Srl => alu::srl(val),
        };
        self.write8(bus, loc, result);
        if let Some(reg) = copy {
            self.set_reg8(reg, result);
        }
        self.f = f;
        0
    }

    /// BIT n, target. 8 T register, 12 T (HL), 20 T (IX+d).
    /// X/Y come from the register, or from the high byte of the address for
    /// memory operands.
    pub(crate) fn op_bit(&mut self, bus: &mut dyn Bus, n: u8, target: Operand8, ctx: &mut Decode) -> u32 {
        let loc = self.resolve8(bus, target, ctx);
        let val = self.read8(bus, loc);
        let xy_source = match loc {
            Loc8::Mem(addr) => bits::hi(addr),
            _ => val,
        };
        let set = bits::bit(val, n);
        let mut f = (self.f & Flag::C as u8) | Flag::H as u8 | (xy_source & (Flag::X as u8 | Flag::Y as u8));
        if !set {
            f |= Flag::Z as u8 | Flag::PV as u8;
        }
        if set && n == 7 {
            f |= Flag::S as u8;
        }
        self.f = f;
        0
    }

    /// RES n / SET n. 8 T register, 15 T (HL), 23 T (IX+d). No flags.
    pub(crate) fn op_res_set(
        &mut self,
        bus: &mut dyn Bus,
        n: u8,
        on: bool,
        target: Operand8,
        copy: Option<Reg8>,
        ctx: &mut Decode,
    ) -> u32 {
        let loc = self.resolve8(bus, target, ctx);
        let result = bits::set_bit(self.read8(bus, loc), n, on);
        self.write8(bus, loc, result);
        if let Some(reg) = copy {
            self.set_reg8(reg, result);
        }
        0
    }

    /// RRD (18 T): rotate the low nibbles of A and (HL) right.
    pub(crate) fn op_rrd(&mut self, bus: &mut dyn Bus) -> u32 {
        let addr = self.get_hl();
        let mem = bus.read(addr);
        bus.write(addr, (self.a << 4) | (mem >> 4));
        self.a = (self.a & 0xF0) | (mem & 0x0F);
        self.f = (self.f & Flag::C as u8) | alu::szp(self.a);
        0
    }

    /// RLD (18 T): rotate the low nibbles of A and (HL) left.
    pub(crate) fn op_rld(&mut self, bus: &mut dyn Bus) -> u32 {
        let addr = self.get_hl();
        let mem = bus.read(addr);
        bus.write(addr, (mem << 4) | (self.a & 0x0F));
        self.a = (self.a & 0xF0) | (mem >> 4);
        self.f = (self.f & Flag::C as u8) | alu::szp(self.a);
        0
    }
}
