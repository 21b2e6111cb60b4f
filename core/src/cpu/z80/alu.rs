use crate::alu;
use crate::core::Bus;
use crate::cpu::z80::tables::{AluOp, Operand8, Reg16};
use crate::cpu::z80::{Decode, Flag, Z80};

const XY: u8 = Flag::X as u8 | Flag::Y as u8;
const SZPV: u8 = Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8;

impl Z80 {
    /// ADD/ADC/SUB/SBC/AND/XOR/OR/CP A, src.
    /// 4 T register, 7 T (HL) or n, 19 T (IX+d).
    pub(crate) fn op_alu(&mut self, bus: &mut dyn Bus, kind: AluOp, src: Operand8, ctx: &mut Decode) -> u32 {
        let loc = self.resolve8(bus, src, ctx);
        let val = self.read8(bus, loc);
        let carry = self.carry();
        let (result, f) = match kind {
            AluOp::Add => alu::add(self.a, val, false),
            AluOp::Adc => alu::add(self.a, val, carry),
            AluOp::Sub => alu::sub(self.a, val, false),
            AluOp::Sbc => alu::sub(self.a, val, carry),
            AluOp::And => alu::and(self.a, val),
            AluOp::Xor => alu::xor(self.a, val),
            AluOp::Or => alu::or(self.a, val),
            AluOp::Cp => (self.a, alu::compare(self.a, val)),
        };
        self.a = result;
        self.f = f;
        0
    }

    /// INC r / INC (HL) / INC (IX+d). C is preserved.
    pub(crate) fn op_inc8(&mut self, bus: &mut dyn Bus, target: Operand8, ctx: &mut Decode) -> u32 {
        let loc = self.resolve8(bus, target, ctx);
        let val = self.read8(bus, loc);
        let (result, f) = alu::inc(val, self.f);
        self.write8(bus, loc, result);
        self.f = f;
        0
    }

    /// DEC r / DEC (HL) / DEC (IX+d). C is preserved.
    pub(crate) fn op_dec8(&mut self, bus: &mut dyn Bus, target: Operand8, ctx: &mut Decode) -> u32 {
        let loc = self.resolve8(bus, target, ctx);
        let val = self.read8(bus, loc);
        let (result, f) = alu::dec(val, self.f);
        self.write8(bus, loc, result);
        self.f = f;
        0
    }

    /// INC rr (6 T). No flags.
    pub(crate) fn op_inc16(&mut self, rr: Reg16) -> u32 {
        self.set_rp(rr, self.get_rp(rr).wrapping_add(1));
        0
    }

    /// DEC rr (6 T). No flags.
    pub(crate) fn op_dec16(&mut self, rr: Reg16) -> u32 {
        self.set_rp(rr, self.get_rp(rr).wrapping_sub(1));
        0
    }

    /// ADD HL,rr / ADD IX,rr (11 T / 15 T)
    pub(crate) fn op_add16(&mut self, dst: Reg16, src: Reg16) -> u32 {
        let (result, f) = alu::add16(self.get_rp(dst), self.get_rp(src), self.f);
        self.set_rp(dst, result);
        self.f = f;
        0
    }

    /// ADC HL,rr (15 T)
    pub(crate) fn op_adc16(&mut self, rr: Reg16) -> u32 {
        let (result, f) = alu::adc16(self.get_hl(), self.get_rp(rr), self.carry());
        self.set_hl(result);
        self.f = f;
        0
    }

    /// SBC HL,rr (15 T)
    pub(crate) fn op_sbc16(&mut self, rr: Reg16) -> u32 {
        let (result, f) = alu::sbc16(self.get_hl(), self.get_rp(rr), self.carry());
        self.set_hl(result);
        self.f = f;
        0
    }

    // Accumulator rotates keep S, Z and PV and clear H and N.

    fn rotate_a(&mut self, (result, f): (u8, u8)) -> u32 {
        self.a = result;
        self.f = (self.f & SZPV) | (result & XY) | (f & Flag::C as u8);
        0
    }

    /// RLCA (4 T)
    pub(crate) fn op_rlca(&mut self) -> u32 {
        self.rotate_a(alu::rlc(self.a))
    }

    /// RRCA (4 T)
    pub(crate) fn op_rrca(&mut self) -> u32 {
        self.rotate_a(alu::rrc(self.a))
    }

    /// RLA (4 T)
    pub(crate) fn op_rla(&mut self) -> u32 {
        self.rotate_a(alu::rl(self.a, self.carry()))
    }

    /// RRA (4 T)
    pub(crate) fn op_rra(&mut self) -> u32 {
        self.rotate_a(alu::rr(self.a, self.carry()))
    }

    /// DAA (4 T)
    pub(crate) fn op_daa(&mut self) -> u32 {
        let (result, f) = alu::daa(self.a, self.f);
        self.a = result;
        self.f = f;
        0
    }

    /// CPL (4 T)
    pub(crate) fn op_cpl(&mut self) -> u32 {
        let (result, f) = alu::not(self.a, self.f);
        self.a = result;
        self.f = f;
        0
    }

    /// SCF (4 T). X/Y from A.
    pub(crate) fn op_scf(&mut self) -> u32 {
        self.f = (self.f & SZPV) | Flag::C as u8 | (self.a & XY);
        0
    }

    /// CCF (4 T). H takes the old carry.
    pub(crate) fn op_ccf(&mut self) -> u32 {
        let old_c = self.carry();
        let mut f = (self.f & SZPV) | (self.a & XY);
        if old_c {
            f |= Flag::H as u8;
        } else {
            f |= Flag::C as u8;
        }
        self.f = f;
        0
    }

    /// NEG (8 T), including the ED duplicates.
    pub(crate) fn op_neg(&mut self) -> u32 {
        let (result, f) = alu::sub(0, self.a, false);
        self.a = result;
        self.f = f;
        0
    }
}
