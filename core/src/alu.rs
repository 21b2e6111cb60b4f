//! 8-bit arithmetic/logic unit with precomputed flag tables.
//!
//! Add and subtract flags come from four 64K tables indexed by
//! `(operand0 << 8) | operand1`, one per carry-in variant. Logical, rotate
//! and shift results take sign/zero/parity from a 256-entry table. All
//! tables are built on first use and shared for the life of the process.
//!
//! The carry/borrow input is passed explicitly; the executor feeds it from
//! the C bit of its flag register.

use std::sync::LazyLock;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Unused (copy of bit 3)
    H = 0x10,  // Half Carry
    Y = 0x20,  // Unused (copy of bit 5)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

const S: u8 = Flag::S as u8;
const Z: u8 = Flag::Z as u8;
const Y: u8 = Flag::Y as u8;
const H: u8 = Flag::H as u8;
const X: u8 = Flag::X as u8;
const PV: u8 = Flag::PV as u8;
const N: u8 = Flag::N as u8;
const C: u8 = Flag::C as u8;
const XY: u8 = X | Y;

struct FlagTables {
    add: Box<[u8]>,
    adc: Box<[u8]>,
    sub: Box<[u8]>,
    sbc: Box<[u8]>,
    szp: [u8; 256],
}

static TABLES: LazyLock<FlagTables> = LazyLock::new(FlagTables::build);

impl FlagTables {
    fn build() -> Self {
        let mut szp = [0u8; 256];
        for (v, entry) in szp.iter_mut().enumerate() {
            let v = v as u8;
            let mut f = v & (S | XY);
            if v == 0 { f |= Z; }
            if crate::bits::parity(v) { f |= PV; }
            *entry = f;
        }

        let mut add = vec![0u8; 0x10000].into_boxed_slice();
        let mut adc = vec![0u8; 0x10000].into_boxed_slice();
        let mut sub = vec![0u8; 0x10000].into_boxed_slice();
        let mut sbc = vec![0u8; 0x10000].into_boxed_slice();

        for a in 0..=255u8 {
            for b in 0..=255u8 {
                let idx = ((a as usize) << 8) | b as usize;
                add[idx] = Self::add_flags(a, b, 0);
                adc[idx] = Self::add_flags(a, b, 1);
                sub[idx] = Self::sub_flags(a, b, 0);
                sbc[idx] = Self::sub_flags(a, b, 1);
            }
        }

        Self { add, adc, sub, sbc, szp }
    }

    fn add_flags(a: u8, b: u8, carry: u8) -> u8 {
        let wide = a as u16 + b as u16 + carry as u16;
        let result = wide as u8;
        let mut f = result & (S | XY);
        if result == 0 { f |= Z; }
        if (a & 0xF) + (b & 0xF) + carry > 0xF { f |= H; }
        if (a ^ result) & (b ^ result) & 0x80 != 0 { f |= PV; }
        if wide > 0xFF { f |= C; }
        f
    }

    fn sub_flags(a: u8, b: u8, borrow: u8) -> u8 {
        let result = a.wrapping_sub(b).wrapping_sub(borrow);
        let mut f = N | (result & (S | XY));
        if result == 0 { f |= Z; }
        if (a & 0xF) < (b & 0xF) + borrow { f |= H; }
        if (a ^ b) & (a ^ result) & 0x80 != 0 { f |= PV; }
        if (a as u16) < b as u16 + borrow as u16 { f |= C; }
        f
    }
}

#[inline]
fn index(a: u8, b: u8) -> usize {
    ((a as usize) << 8) | b as usize
}

/// Sign, zero, even-parity and X/Y flags for a result byte.
#[inline]
pub fn szp(value: u8) -> u8 {
    TABLES.szp[value as usize]
}

/// Sign, zero and X/Y flags without parity.
#[inline]
pub fn sz(value: u8) -> u8 {
    TABLES.szp[value as usize] & !PV
}

/// `a + b (+ carry)`.
#[inline]
pub fn add(a: u8, b: u8, carry: bool) -> (u8, u8) {
    let result = a.wrapping_add(b).wrapping_add(carry as u8);
    let table = if carry { &TABLES.adc } else { &TABLES.add };
    (result, table[index(a, b)])
}

/// `a - b (- borrow)`.
#[inline]
pub fn sub(a: u8, b: u8, borrow: bool) -> (u8, u8) {
    let result = a.wrapping_sub(b).wrapping_sub(borrow as u8);
    let table = if borrow { &TABLES.sbc } else { &TABLES.sub };
    (result, table[index(a, b)])
}

/// Flags of `a - b` with the undocumented X/Y bits taken from the operand.
#[inline]
pub fn compare(a: u8, b: u8) -> u8 {
    (TABLES.sub[index(a, b)] & !XY) | (b & XY)
}

#[inline]
pub fn and(a: u8, b: u8) -> (u8, u8) {
    let result = a & b;
    (result, szp(result) | H)
}

#[inline]
pub fn or(a: u8, b: u8) -> (u8, u8) {
    let result = a | b;
    (result, szp(result))
}

#[inline]
pub fn xor(a: u8, b: u8) -> (u8, u8) {
    let result = a ^ b;
    (result, szp(result))
}

/// One's complement (CPL). S, Z, PV and C carry over from `flags`.
#[inline]
pub fn not(a: u8, flags: u8) -> (u8, u8) {
    let result = !a;
    (result, (flags & (S | Z | PV | C)) | H | N | (result & XY))
}

/// 8-bit increment. C carries over from `flags`.
pub fn inc(value: u8, flags: u8) -> (u8, u8) {
    let result = value.wrapping_add(1);
    let mut f = (flags & C) | sz(result);
    if value & 0xF == 0xF { f |= H; }
    if value == 0x7F { f |= PV; }
    (result, f)
}

/// 8-bit decrement. C carries over from `flags`.
pub fn dec(value: u8, flags: u8) -> (u8, u8) {
    let result = value.wrapping_sub(1);
    let mut f = (flags & C) | N | sz(result);
    if value & 0xF == 0 { f |= H; }
    if value == 0x80 { f |= PV; }
    (result, f)
}

// --- Rotates and shifts (CB page semantics: full SZP flags, H = N = 0) ---

#[inline]
fn shifted(result: u8, carry_out: bool) -> (u8, u8) {
    (result, szp(result) | carry_out as u8)
}

/// Rotate left circular: bit 7 to carry and bit 0.
pub fn rlc(value: u8) -> (u8, u8) {
    shifted(value.rotate_left(1), value & 0x80 != 0)
}

/// Rotate right circular: bit 0 to carry and bit 7.
pub fn rrc(value: u8) -> (u8, u8) {
    shifted(value.rotate_right(1), value & 0x01 != 0)
}

/// Rotate left through carry.
pub fn rl(value: u8, carry: bool) -> (u8, u8) {
    shifted((value << 1) | carry as u8, value & 0x80 != 0)
}

/// Rotate right through carry.
pub fn rr(value: u8, carry: bool) -> (u8, u8) {
    shifted((value >> 1) | ((carry as u8) << 7), value & 0x01 != 0)
}

/// Arithmetic shift left.
pub fn sla(value: u8) -> (u8, u8) {
    shifted(value << 1, value & 0x80 != 0)
}

/// Arithmetic shift right; the sign bit is preserved.
pub fn sra(value: u8) -> (u8, u8) {
    shifted((value >> 1) | (value & 0x80), value & 0x01 != 0)
}

/// Undocumented shift left that feeds a 1 into bit 0.
pub fn sll(value: u8) -> (u8, u8) {
    shifted((value << 1) | 1, value & 0x80 != 0)
}

/// Logical shift right.
pub fn srl(value: u8) -> (u8, u8) {
    shifted(value >> 1, value & 0x01 != 0)
}

/// Decimal adjust after a BCD add or subtract.
pub fn daa(a: u8, flags: u8) -> (u8, u8) {
    let n = flags & N != 0;
    let old_h = flags & H != 0;
    let old_c = flags & C != 0;

    let mut correction = 0u8;
    let mut new_c = old_c;
    if old_h || (a & 0x0F) > 9 {
        correction |= 0x06;
    }
    if old_c || a > 0x99 {
        correction |= 0x60;
        new_c = true;
    }

    let result = if n { a.wrapping_sub(correction) } else { a.wrapping_add(correction) };
    let new_h = if n { old_h && (a & 0x0F) < 6 } else { (a & 0x0F) > 9 };

    let mut f = szp(result) | (flags & N);
    if new_c { f |= C; }
    if new_h { f |= H; }
    (result, f)
}

// --- 16-bit arithmetic ---

/// `ADD rr,rr`: S, Z and PV carry over from `flags`; H from bit 11.
pub fn add16(a: u16, b: u16, flags: u8) -> (u16, u8) {
    let wide = a as u32 + b as u32;
    let result = wide as u16;
    let mut f = flags & (S | Z | PV);
    if (a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF { f |= H; }
    if wide > 0xFFFF { f |= C; }
    f |= ((result >> 8) as u8) & XY;
    (result, f)
}

/// `ADC HL,rr`.
pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = carry as u32;
    let wide = a as u32 + b as u32 + c;
    let result = wide as u16;
    let mut f = ((result >> 8) as u8) & (S | XY);
    if result == 0 { f |= Z; }
    if (a as u32 & 0x0FFF) + (b as u32 & 0x0FFF) + c > 0x0FFF { f |= H; }
    if (a ^ result) & (b ^ result) & 0x8000 != 0 { f |= PV; }
    if wide > 0xFFFF { f |= C; }
    (result, f)
}

/// `SBC HL,rr`.
pub fn sbc16(a: u16, b: u16, borrow: bool) -> (u16, u8) {
    let c = borrow as u32;
    let result = a.wrapping_sub(b).wrapping_sub(c as u16);
    let mut f = N | (((result >> 8) as u8) & (S | XY));
    if result == 0 { f |= Z; }
    if (a as u32 & 0x0FFF) < (b as u32 & 0x0FFF) + c { f |= H; }
    if (a ^ b) & (a ^ result) & 0x8000 != 0 { f |= PV; }
    if (a as u32) < b as u32 + c { f |= C; }
    (result, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_sub_is_identity() {
        for a in 0..=255u8 {
            for b in 0..=255u8 {
                for carry in [false, true] {
                    let (sum, f) = add(a, b, carry);
                    assert_eq!(sum, a.wrapping_add(b).wrapping_add(carry as u8));
                    let (back, _) = sub(sum, b, carry);
                    assert_eq!(back, a, "a={a:02X} b={b:02X} carry={carry}");
                    // Carry out matches an unsigned overflow
                    let wide = a as u16 + b as u16 + carry as u16;
                    assert_eq!(f & C != 0, wide > 0xFF);
                }
            }
        }
    }

    #[test]
    fn carry_in_comes_only_from_the_argument() {
        // A carry out of one call must not leak into the next.
        assert_ne!(add(0xFF, 0x01, false).1 & C, 0);
        assert_eq!(add(0x10, 0x20, false).0, 0x30);
        assert_eq!(add(0x10, 0x20, true).0, 0x31);
        assert_eq!(rl(0x80, false).0, 0x00);
        assert_eq!(rl(0x00, false).0, 0x00);
        assert_eq!(rl(0x00, true).0, 0x01);
        assert_eq!(adc16(0xFFFF, 0x0001, false).0, 0x0000);
        assert_eq!(adc16(0x1000, 0x0001, false).0, 0x1001);
    }

    #[test]
    fn half_carry_is_nibble_carry() {
        assert_eq!(add(0x0F, 0x01, false).1 & H, H);
        assert_eq!(add(0x0E, 0x01, false).1 & H, 0);
        assert_eq!(add(0x0E, 0x01, true).1 & H, H);
        assert_eq!(sub(0x10, 0x01, false).1 & H, H);
        assert_eq!(sub(0x11, 0x01, false).1 & H, 0);
    }

    #[test]
    fn overflow_is_signed_not_unsigned() {
        // 0x7F + 1 overflows signed range but not unsigned
        let (r, f) = add(0x7F, 0x01, false);
        assert_eq!(r, 0x80);
        assert_eq!(f & PV, PV);
        assert_eq!(f & C, 0);
        assert_eq!(f & S, S);
        // 0xFF + 1 carries but does not overflow
        let (r, f) = add(0xFF, 0x01, false);
        assert_eq!(r, 0x00);
        assert_eq!(f & PV, 0);
        assert_eq!(f & (C | Z), C | Z);
        // 0x80 - 1 overflows
        let (_, f) = sub(0x80, 0x01, false);
        assert_eq!(f & (PV | N), PV | N);
    }

    #[test]
    fn parity_table() {
        assert_eq!(szp(0x00) & PV, PV);
        assert_eq!(szp(0x01) & PV, 0);
        assert_eq!(szp(0xFF) & PV, PV);
        for v in 0..=255u8 {
            assert_eq!(szp(v) & PV != 0, v.count_ones() % 2 == 0);
        }
    }

    #[test]
    fn compare_takes_xy_from_operand() {
        let f = compare(0x00, 0x28);
        assert_eq!(f & XY, 0x28);
        assert_eq!(f & N, N);
        assert_eq!(compare(0x42, 0x42) & Z, Z);
    }

    #[test]
    fn logic_flags() {
        assert_eq!(and(0xF0, 0x0F), (0x00, Z | PV | H));
        assert_eq!(or(0x80, 0x01).1 & (S | PV), S);
        assert_eq!(xor(0xFF, 0xFF), (0x00, Z | PV));
        let (r, f) = not(0x0F, C);
        assert_eq!(r, 0xF0);
        assert_eq!(f & (H | N | C), H | N | C);
    }

    #[test]
    fn inc_dec_edges() {
        let (r, f) = inc(0x7F, C);
        assert_eq!(r, 0x80);
        assert_eq!(f & (PV | H | C | S), PV | H | C | S);
        let (r, f) = dec(0x80, 0);
        assert_eq!(r, 0x7F);
        assert_eq!(f & (PV | H | N), PV | H | N);
        let (r, f) = dec(0x01, 0);
        assert_eq!(r, 0);
        assert_eq!(f & Z, Z);
    }

    #[test]
    fn rotates_and_shifts() {
        assert_eq!(rlc(0x81), (0x03, szp(0x03) | C));
        assert_eq!(rrc(0x01), (0x80, szp(0x80) | C));
        assert_eq!(rl(0x80, true), (0x01, szp(0x01) | C));
        assert_eq!(rr(0x01, false), (0x00, szp(0x00) | C));
        assert_eq!(sla(0x40).0, 0x80);
        assert_eq!(sra(0x81), (0xC0, szp(0xC0) | C));
        assert_eq!(sll(0x00).0, 0x01);
        assert_eq!(srl(0x80), (0x40, szp(0x40)));
    }

    #[test]
    fn daa_adjusts_bcd_add() {
        // 0x15 + 0x27 = 0x3C -> 0x42
        let (sum, f) = add(0x15, 0x27, false);
        assert_eq!(daa(sum, f).0, 0x42);
        // 0x99 + 0x01 = 0x9A -> 0x00 with carry
        let (sum, f) = add(0x99, 0x01, false);
        let (r, f) = daa(sum, f);
        assert_eq!(r, 0x00);
        assert_eq!(f & (C | Z), C | Z);
        // 0x42 - 0x15 = 0x2D -> 0x27
        let (diff, f) = sub(0x42, 0x15, false);
        assert_eq!(daa(diff, f).0, 0x27);
    }

    #[test]
    fn sixteen_bit_arithmetic() {
        let (r, f) = add16(0x0FFF, 0x0001, S | Z);
        assert_eq!(r, 0x1000);
        assert_eq!(f & (H | S | Z), H | S | Z);
        let (r, f) = adc16(0xFFFF, 0x0000, true);
        assert_eq!(r, 0);
        assert_eq!(f & (Z | C), Z | C);
        let (r, f) = sbc16(0x8000, 0x0001, false);
        assert_eq!(r, 0x7FFF);
        assert_eq!(f & (PV | N), PV | N);
        let (r, f) = sbc16(0x0000, 0x0000, true);
        assert_eq!(r, 0xFFFF);
        assert_eq!(f & (C | S), C | S);
    }
}
