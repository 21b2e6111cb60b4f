use crate::alu;
use crate::bits;
use crate::core::Bus;
use crate::cpu::z80::tables::BlockKind;
use crate::cpu::z80::{Flag, Z80};

const S: u8 = Flag::S as u8;
const Z: u8 = Flag::Z as u8;
const Y: u8 = Flag::Y as u8;
const H: u8 = Flag::H as u8;
const X: u8 = Flag::X as u8;
const PV: u8 = Flag::PV as u8;
const N: u8 = Flag::N as u8;
const C: u8 = Flag::C as u8;

impl Z80 {
    /// Block transfer, compare and I/O: LDI/LDD/CPI/CPD/INI/IND/OUTI/OUTD
    /// (16 T) and their repeating forms (21 T while repeating, 16 T on the
    /// last iteration). A repeating instruction rewinds PC onto itself so
    /// interrupts are serviced between iterations.
    pub(crate) fn op_block(&mut self, bus: &mut dyn Bus, kind: BlockKind, decrement: bool, repeat: bool) -> u32 {
        let again = match kind {
            BlockKind::Ld => self.block_ld(bus, decrement),
            BlockKind::Cp => self.block_cp(bus, decrement),
            BlockKind::In => self.block_in(bus, decrement),
            BlockKind::Out => self.block_out(bus, decrement),
        };
        if repeat && again {
            self.pc = self.pc.wrapping_sub(2);
            5
        } else {
            0
        }
    }

    fn step_hl(&mut self, decrement: bool) {
        let hl = self.get_hl();
        self.set_hl(if decrement { hl.wrapping_sub(1) } else { hl.wrapping_add(1) });
    }

    /// LDI/LDD. Returns true while BC is non-zero.
    fn block_ld(&mut self, bus: &mut dyn Bus, decrement: bool) -> bool {
        let val = bus.read(self.get_hl());
        let de = self.get_de();
        bus.write(de, val);
        self.step_hl(decrement);
        self.set_de(if decrement { de.wrapping_sub(1) } else { de.wrapping_add(1) });
        let bc = self.get_bc().wrapping_sub(1);
        self.set_bc(bc);

        let n = val.wrapping_add(self.a);
        let mut f = (self.f & (S | Z | C)) | (n & X) | ((n << 4) & Y);
        if bc != 0 {
            f |= PV;
        }
        self.f = f;
        bc != 0
    }

    /// CPI/CPD. Returns true while BC is non-zero and no match was found.
    fn block_cp(&mut self, bus: &mut dyn Bus, decrement: bool) -> bool {
        let val = bus.read(self.get_hl());
        let result = self.a.wrapping_sub(val);
        self.step_hl(decrement);
        let bc = self.get_bc().wrapping_sub(1);
        self.set_bc(bc);

        let half = (self.a & 0x0F) < (val & 0x0F);
        let n = result.wrapping_sub(half as u8);
        let mut f = (self.f & C) | N | (alu::sz(result) & (S | Z)) | (n & X) | ((n << 4) & Y);
        if half {
            f |= H;
        }
        if bc != 0 {
            f |= PV;
        }
        self.f = f;
        bc != 0 && result != 0
    }

    /// Flags shared by the block I/O group. `k` is the transferred byte plus
    /// the low byte of the adjusted address register.
    fn block_io_flags(&mut self, val: u8, k: u16) {
        let mut f = alu::sz(self.b);
        if val & 0x80 != 0 {
            f |= N;
        }
        if k > 0xFF {
            f |= H | C;
        }
        if bits::parity((k as u8 & 0x07) ^ self.b) {
            f |= PV;
        }
        self.f = f;
    }

    /// INI/IND. Returns true while B is non-zero.
    fn block_in(&mut self, bus: &mut dyn Bus, decrement: bool) -> bool {
        let val = bus.io_read(self.get_bc());
        bus.write(self.get_hl(), val);
        self.step_hl(decrement);
        self.b = self.b.wrapping_sub(1);
        let c = if decrement { self.c.wrapping_sub(1) } else { self.c.wrapping_add(1) };
        self.block_io_flags(val, val as u16 + c as u16);
        self.b != 0
    }

    /// OUTI/OUTD. B is decremented before the port address goes out.
    fn block_out(&mut self, bus: &mut dyn Bus, decrement: bool) -> bool {
        let val = bus.read(self.get_hl());
        self.b = self.b.wrapping_sub(1);
        bus.io_write(self.get_bc(), val);
        self.step_hl(decrement);
        self.block_io_flags(val, val as u16 + self.l as u16);
        self.b != 0
    }
}
