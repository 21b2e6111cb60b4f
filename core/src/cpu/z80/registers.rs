//! Named register table for debuggers, tracing and snapshots.
//!
//! Order is fixed: snapshots persist the entries up to and including `R`;
//! the remaining names are pair and half views over those.

use super::Z80;
use crate::bits;

pub struct RegisterDef {
    pub name: &'static str,
    pub get: fn(&Z80) -> u16,
    pub set: fn(&mut Z80, u16),
}

/// Number of leading entries written to a snapshot.
pub const PERSISTED: usize = 22;

pub const NAMES: [&str; 30] = [
    "A", "F", "B", "C", "D", "E", "H", "L", "A'", "F'", "B'", "C'", "D'", "E'", "H'", "L'", "IX",
    "IY", "SP", "PC", "I", "R", "AF", "BC", "DE", "HL", "IXH", "IXL", "IYH", "IYL",
];

macro_rules! reg8 {
    ($name:literal, $field:ident) => {
        RegisterDef {
            name: $name,
            get: |z| z.$field as u16,
            set: |z, v| z.$field = v as u8,
        }
    };
}

pub static TABLE: [RegisterDef; 30] = [
    reg8!("A", a),
    reg8!("F", f),
    reg8!("B", b),
    reg8!("C", c),
    reg8!("D", d),
    reg8!("E", e),
    reg8!("H", h),
    reg8!("L", l),
    reg8!("A'", a_prime),
    reg8!("F'", f_prime),
    reg8!("B'", b_prime),
    reg8!("C'", c_prime),
    reg8!("D'", d_prime),
    reg8!("E'", e_prime),
    reg8!("H'", h_prime),
    reg8!("L'", l_prime),
    RegisterDef { name: "IX", get: |z| z.ix, set: |z, v| z.ix = v },
    RegisterDef { name: "IY", get: |z| z.iy, set: |z, v| z.iy = v },
    RegisterDef { name: "SP", get: |z| z.sp, set: |z, v| z.sp = v },
    RegisterDef { name: "PC", get: |z| z.pc, set: |z, v| z.pc = v },
    reg8!("I", i),
    reg8!("R", r),
    RegisterDef { name: "AF", get: |z| z.get_af(), set: |z, v| z.set_af(v) },
    RegisterDef { name: "BC", get: |z| z.get_bc(), set: |z, v| z.set_bc(v) },
    RegisterDef { name: "DE", get: |z| z.get_de(), set: |z, v| z.set_de(v) },
    RegisterDef { name: "HL", get: |z| z.get_hl(), set: |z, v| z.set_hl(v) },
    RegisterDef {
        name: "IXH",
        get: |z| bits::hi(z.ix) as u16,
        set: |z, v| z.ix = bits::join(v as u8, bits::lo(z.ix)),
    },
    RegisterDef {
        name: "IXL",
        get: |z| bits::lo(z.ix) as u16,
        set: |z, v| z.ix = bits::join(bits::hi(z.ix), v as u8),
    },
    RegisterDef {
        name: "IYH",
        get: |z| bits::hi(z.iy) as u16,
        set: |z, v| z.iy = bits::join(v as u8, bits::lo(z.iy)),
    },
    RegisterDef {
        name: "IYL",
        get: |z| bits::lo(z.iy) as u16,
        set: |z, v| z.iy = bits::join(bits::hi(z.iy), v as u8),
    },
];

/// Case-insensitive lookup.
pub fn find(name: &str) -> Option<&'static RegisterDef> {
    TABLE.iter().find(|reg| reg.name.eq_ignore_ascii_case(name))
}
