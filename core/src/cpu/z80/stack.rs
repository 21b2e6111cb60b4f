use crate::bits;
use crate::core::Bus;
use crate::cpu::z80::Z80;
use crate::cpu::z80::tables::Reg16;

impl Z80 {
    /// Push a word, high byte first (SP pre-decrements).
    pub(crate) fn push(&mut self, bus: &mut dyn Bus, val: u16) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, bits::hi(val));
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, bits::lo(val));
    }

    pub(crate) fn pop(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = bus.read(self.sp);
        self.sp = self.sp.wrapping_add(1);
        let hi = bus.read(self.sp);
        self.sp = self.sp.wrapping_add(1);
        bits::join(hi, lo)
    }

    /// PUSH rr (11 T; 15 T for IX/IY)
    pub(crate) fn op_push(&mut self, bus: &mut dyn Bus, rr: Reg16) -> u32 {
        let val = self.get_rp(rr);
        self.push(bus, val);
        0
    }

    /// POP rr (10 T; 14 T for IX/IY)
    pub(crate) fn op_pop(&mut self, bus: &mut dyn Bus, rr: Reg16) -> u32 {
        let val = self.pop(bus);
        self.set_rp(rr, val);
        0
    }
}
