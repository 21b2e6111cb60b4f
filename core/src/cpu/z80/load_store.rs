use crate::alu;
use crate::core::Bus;
use crate::cpu::z80::tables::{Operand8, Operand16, Reg8, Reg16};
use crate::cpu::z80::{Decode, Flag, Z80};

impl Z80 {
    /// LD dst, src (8-bit). Covers registers, immediates, (rr), (IX+d),
    /// (nn) and LD I,A / LD R,A.
    /// The destination resolves first so `LD (IX+d),n` consumes d before n.
    pub(crate) fn op_ld8(&mut self, bus: &mut dyn Bus, dst: Operand8, src: Operand8, ctx: &mut Decode) -> u32 {
        let dst = self.resolve8(bus, dst, ctx);
        let src = self.resolve8(bus, src, ctx);
        let val = self.read8(bus, src);
        self.write8(bus, dst, val);
        0
    }

    /// LD A,I / LD A,R (9 T). PV reflects IFF2.
    pub(crate) fn op_ld_a_ir(&mut self, src: Operand8) -> u32 {
        let val = match src {
            Operand8::I => self.i,
            _ => self.r,
        };
        self.a = val;
        let mut f = (self.f & Flag::C as u8) | alu::sz(val);
        if self.iff2 {
            f |= Flag::PV as u8;
        }
        self.f = f;
        0
    }

    /// LD dst, src (16-bit): LD rr,nn / LD rr,(nn) / LD (nn),rr / LD SP,HL.
    pub(crate) fn op_ld16(&mut self, bus: &mut dyn Bus, dst: Operand16, src: Operand16) -> u32 {
        let dst = self.resolve16(bus, dst);
        let src = self.resolve16(bus, src);
        let val = self.read16(bus, src);
        self.write16(bus, dst, val);
        0
    }

    /// EX AF,AF' (4 T)
    pub(crate) fn op_ex_af_af(&mut self) -> u32 {
        std::mem::swap(&mut self.a, &mut self.a_prime);
        std::mem::swap(&mut self.f, &mut self.f_prime);
        0
    }

    /// EX DE,HL (4 T). Never affected by an index prefix.
    pub(crate) fn op_ex_de_hl(&mut self) -> u32 {
        std::mem::swap(&mut self.d, &mut self.h);
        std::mem::swap(&mut self.e, &mut self.l);
        0
    }

    /// EXX (4 T)
    pub(crate) fn op_exx(&mut self) -> u32 {
        std::mem::swap(&mut self.b, &mut self.b_prime);
        std::mem::swap(&mut self.c, &mut self.c_prime);
        std::mem::swap(&mut self.d, &mut self.d_prime);
        std::mem::swap(&mut self.e, &mut self.e_prime);
        std::mem::swap(&mut self.h, &mut self.h_prime);
        std::mem::swap(&mut self.l, &mut self.l_prime);
        0
    }

    /// EX (SP),HL (19 T; 23 T for IX/IY)
    pub(crate) fn op_ex_sp(&mut self, bus: &mut dyn Bus, rr: Reg16) -> u32 {
        let stacked = Self::read_word(bus, self.sp);
        let reg = self.get_rp(rr);
        Self::write_word(bus, self.sp, reg);
        self.set_rp(rr, stacked);
        0
    }

    /// IN A,(n) (11 T, flags untouched) and IN r,(C) (12 T, flags from the
    /// value). `IN (C)` only sets flags.
    pub(crate) fn op_in(&mut self, bus: &mut dyn Bus, dst: Option<Reg8>, port: Operand8, ctx: &mut Decode) -> u32 {
        let loc = self.resolve8(bus, port, ctx);
        let val = self.read8(bus, loc);
        if port == Operand8::PortC {
            self.f = (self.f & Flag::C as u8) | alu::szp(val);
        }
        if let Some(reg) = dst {
            self.set_reg8(reg, val);
        }
        0
    }

    /// OUT (n),A (11 T) and OUT (C),r (12 T). `OUT (C),0` writes zero.
    pub(crate) fn op_out(&mut self, bus: &mut dyn Bus, port: Operand8, src: Option<Reg8>, ctx: &mut Decode) -> u32 {
        let loc = self.resolve8(bus, port, ctx);
        let val = src.map_or(0, |reg| self.get_reg8(reg));
        self.write8(bus, loc, val);
        0
    }
}
