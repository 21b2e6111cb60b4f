use crate::bits;
use crate::core::Bus;
use crate::cpu::z80::Z80;
use crate::cpu::z80::tables::{Cond, Reg16};

impl Z80 {
    /// JP nn / JP cc,nn (10 T whether or not taken)
    pub(crate) fn op_jp(&mut self, bus: &mut dyn Bus, cond: Option<Cond>) -> u32 {
        let target = self.fetch_word(bus);
        if cond.is_none_or(|cc| self.condition(cc)) {
            self.pc = target;
        }
        0
    }

    /// JP (HL) / JP (IX) / JP (IY). Loads PC from the register, no memory read.
    pub(crate) fn op_jp_ind(&mut self, rr: Reg16) -> u32 {
        self.pc = self.get_rp(rr);
        0
    }

    /// JR e (12 T) / JR cc,e (7 T, 12 T taken)
    pub(crate) fn op_jr(&mut self, bus: &mut dyn Bus, cond: Option<Cond>) -> u32 {
        let e = self.fetch(bus);
        match cond {
            None => {
                self.pc = bits::displace(self.pc, e);
                0
            }
            Some(cc) if self.condition(cc) => {
                self.pc = bits::displace(self.pc, e);
                5
            }
            Some(_) => 0,
        }
    }

    /// DJNZ e (8 T, 13 T taken)
    pub(crate) fn op_djnz(&mut self, bus: &mut dyn Bus) -> u32 {
        let e = self.fetch(bus);
        self.b = self.b.wrapping_sub(1);
        if self.b != 0 {
            self.pc = bits::displace(self.pc, e);
            5
        } else {
            0
        }
    }

    /// CALL nn (17 T) / CALL cc,nn (10 T, 17 T taken)
    pub(crate) fn op_call(&mut self, bus: &mut dyn Bus, cond: Option<Cond>) -> u32 {
        let target = self.fetch_word(bus);
        match cond {
            Some(cc) if !self.condition(cc) => 0,
            _ => {
                self.push(bus, self.pc);
                self.pc = target;
                if cond.is_some() { 7 } else { 0 }
            }
        }
    }

    /// RET (10 T) / RET cc (5 T, 11 T taken)
    pub(crate) fn op_ret(&mut self, bus: &mut dyn Bus, cond: Option<Cond>) -> u32 {
        match cond {
            None => {
                self.pc = self.pop(bus);
                0
            }
            Some(cc) if self.condition(cc) => {
                self.pc = self.pop(bus);
                6
            }
            Some(_) => 0,
        }
    }

    /// RETN / RETI (14 T): return and copy IFF2 back into IFF1.
    pub(crate) fn op_retn(&mut self, bus: &mut dyn Bus) -> u32 {
        self.pc = self.pop(bus);
        self.iff1 = self.iff2;
        0
    }

    /// RST p (11 T)
    pub(crate) fn op_rst(&mut self, bus: &mut dyn Bus, p: u8) -> u32 {
        self.push(bus, self.pc);
        self.pc = p as u16;
        0
    }

    /// DI (4 T)
    pub(crate) fn op_di(&mut self) -> u32 {
        self.iff1 = false;
        self.iff2 = false;
        0
    }

    /// EI (4 T). The step loop skips interrupt acceptance for this instruction.
    pub(crate) fn op_ei(&mut self) -> u32 {
        self.iff1 = true;
        self.iff2 = true;
        0
    }

    /// IM 0/1/2 (8 T)
    pub(crate) fn op_im(&mut self, mode: u8) -> u32 {
        self.im = mode;
        0
    }
}
