use cabinet_core::cpu::z80::Z80;
mod common;
use common::{TestBus, run_instruction};

// ============================================================
// Rotates and shifts (CB page)
// ============================================================

#[test]
fn test_rlc_r() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 0x80;
    bus.load(0, &[0xCB, 0x00]); // RLC B

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 8);
    assert_eq!(cpu.b, 0x01);
    assert_ne!(cpu.f & 0x01, 0, "bit 7 into carry");
    assert_eq!(cpu.f & 0x12, 0, "H and N clear");
}

#[test]
fn test_rr_through_carry() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.c = 0x01;
    cpu.f = 0x00;
    bus.load(0, &[0xCB, 0x19]); // RR C

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.c, 0x00);
    assert_eq!(cpu.f, 0x45, "Z, PV and carry out");
}

#[test]
fn test_sra_keeps_sign() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.d = 0x81;
    bus.load(0, &[0xCB, 0x2A]); // SRA D

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.d, 0xC0);
    assert_ne!(cpu.f & 0x01, 0);
    assert_ne!(cpu.f & 0x80, 0);
}

#[test]
fn test_sll_feeds_one() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.e = 0x00;
    bus.load(0, &[0xCB, 0x33]); // SLL E (undocumented)

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.e, 0x01);
    assert_eq!(cpu.f & 0x01, 0);
}

#[test]
fn test_srl_hl_indirect() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x2000);
    bus.memory[0x2000] = 0x03;
    bus.load(0, &[0xCB, 0x3E]); // SRL (HL)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 15);
    assert_eq!(bus.memory[0x2000], 0x01);
    assert_ne!(cpu.f & 0x01, 0);
}

// ============================================================
// BIT / RES / SET
// ============================================================

#[test]
fn test_bit_7_set() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x80;
    cpu.f = 0x01;
    bus.load(0, &[0xCB, 0x7F]); // BIT 7,A

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.f & 0x40, 0, "Z clear: bit is set");
    assert_ne!(cpu.f & 0x80, 0, "S mirrors a set bit 7");
    assert_ne!(cpu.f & 0x10, 0, "H always set");
    assert_ne!(cpu.f & 0x01, 0, "C preserved");
}

#[test]
fn test_bit_clear_sets_zero_and_parity() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 0xFE;
    bus.load(0, &[0xCB, 0x40]); // BIT 0,B

    run_instruction(&mut cpu, &mut bus);
    assert_ne!(cpu.f & 0x40, 0);
    assert_ne!(cpu.f & 0x04, 0);
}

#[test]
fn test_bit_hl_takes_xy_from_address() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x2800);
    bus.memory[0x2800] = 0x00;
    bus.load(0, &[0xCB, 0x46]); // BIT 0,(HL)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 12);
    assert_ne!(cpu.f & 0x40, 0);
    assert_eq!(cpu.f & 0x28, 0x28, "X/Y from the high address byte");
}

#[test]
fn test_set_and_res_hl_indirect() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x3000);
    bus.memory[0x3000] = 0x01;
    bus.load(0, &[0xCB, 0xDE, 0xCB, 0x86]); // SET 3,(HL) ; RES 0,(HL)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 15);
    assert_eq!(bus.memory[0x3000], 0x09);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 15);
    assert_eq!(bus.memory[0x3000], 0x08);
}

#[test]
fn test_res_register_leaves_flags() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.c = 0xFF;
    cpu.f = 0x5A;
    bus.load(0, &[0xCB, 0xB9]); // RES 7,C

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.c, 0x7F);
    assert_eq!(cpu.f, 0x5A);
}

// ============================================================
// RRD / RLD
// ============================================================

#[test]
fn test_rrd() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x12;
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0x34;
    bus.load(0, &[0xED, 0x67]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 18);
    assert_eq!(cpu.a, 0x14);
    assert_eq!(bus.memory[0x4000], 0x23);
}

#[test]
fn test_rld() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x12;
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0x34;
    bus.load(0, &[0xED, 0x6F]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 18);
    assert_eq!(cpu.a, 0x13);
    assert_eq!(bus.memory[0x4000], 0x42);
}
