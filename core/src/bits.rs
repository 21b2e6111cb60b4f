//! Small integer helpers shared by the executor, the disassembler and the
//! memory wiring code.

/// High byte of a 16-bit word.
#[inline]
pub fn hi(word: u16) -> u8 {
    (word >> 8) as u8
}

/// Low byte of a 16-bit word.
#[inline]
pub fn lo(word: u16) -> u8 {
    word as u8
}

/// Join a high and a low byte into a 16-bit word.
#[inline]
pub fn join(hi: u8, lo: u8) -> u16 {
    ((hi as u16) << 8) | lo as u16
}

/// Test bit `n` (0 = least significant).
#[inline]
pub fn bit(value: u8, n: u8) -> bool {
    value & (1 << n) != 0
}

/// Return `value` with bit `n` forced on or off.
#[inline]
pub fn set_bit(value: u8, n: u8, on: bool) -> u8 {
    if on { value | (1 << n) } else { value & !(1 << n) }
}

/// Apply a signed 8-bit displacement to an address, wrapping at 64K.
#[inline]
pub fn displace(address: u16, displacement: u8) -> u16 {
    address.wrapping_add(displacement as i8 as i16 as u16)
}

/// Even parity: true when `value` has an even number of set bits.
#[inline]
pub fn parity(value: u8) -> bool {
    value.count_ones() % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join() {
        assert_eq!(hi(0x1234), 0x12);
        assert_eq!(lo(0x1234), 0x34);
        assert_eq!(join(0xAB, 0xCD), 0xABCD);
    }

    #[test]
    fn bit_get_set() {
        assert!(bit(0x80, 7));
        assert!(!bit(0x80, 6));
        assert_eq!(set_bit(0x00, 3, true), 0x08);
        assert_eq!(set_bit(0xFF, 0, false), 0xFE);
    }

    #[test]
    fn displacement_is_signed() {
        assert_eq!(displace(0x1000, 0x05), 0x1005);
        assert_eq!(displace(0x1000, 0xFB), 0x0FFB); // -5
        assert_eq!(displace(0xFFFF, 0x01), 0x0000);
        assert_eq!(displace(0x0000, 0x80), 0xFF80); // -128
    }

    #[test]
    fn parity_counts_set_bits() {
        assert!(parity(0x00));
        assert!(!parity(0x01));
        assert!(parity(0xFF));
        assert!(parity(0x03));
        assert!(!parity(0x07));
    }
}
