use cabinet_core::cpu::z80::Z80;
use cabinet_core::cpu::{Cpu, CpuFault};
mod common;
use common::{TestBus, run_instruction};

// ============================================================
// EI delay
// ============================================================

#[test]
fn test_ei_defers_acceptance_by_one_instruction() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.im = 1;
    bus.load(0, &[0xFB, 0x00, 0x00]); // EI ; NOP ; NOP
    cpu.raise_interrupt(0xFF);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.pc, 0x0001, "no interrupt straight after EI");
    assert!(cpu.iff1);

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 4 + 13, "NOP then the IM 1 response");
    assert_eq!(cpu.pc, 0x0038);
    assert_eq!(bus.memory[0x7FFE], 0x02, "return past the NOP");
    assert!(!cpu.iff1);
    assert!(!cpu.iff2);
}

#[test]
fn test_request_waits_while_disabled() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.im = 1;
    bus.load(0, &[0x00, 0x00, 0xFB, 0x00]); // NOP ; NOP ; EI ; NOP
    cpu.raise_interrupt(0xFF);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0002, "still pending with interrupts disabled");
    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0038);
}

#[test]
fn test_di_blocks_interrupts() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iff1 = true;
    cpu.iff2 = true;
    cpu.im = 1;
    bus.load(0, &[0xF3, 0x00]); // DI ; NOP
    cpu.raise_interrupt(0xFF);

    run_instruction(&mut cpu, &mut bus);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0002);
}

// ============================================================
// NMI
// ============================================================

#[test]
fn test_nmi_basic() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.iff2 = true;
    bus.load(0x0100, &[0x00]);

    cpu.raise_nmi();
    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 4 + 11, "NMI response should be 11 T-states");
    assert_eq!(cpu.pc, 0x0066, "PC should jump to NMI vector");
    assert_eq!(cpu.sp, 0x0FFE);
    assert_eq!(bus.memory[0x0FFF], 0x01, "Return address high byte");
    assert_eq!(bus.memory[0x0FFE], 0x01, "Return address low byte");
    assert!(!cpu.iff1, "IFF1 should be cleared");
    assert!(cpu.iff2, "IFF2 should be preserved");
}

#[test]
fn test_retn_restores_iff1() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.iff2 = true;
    bus.load(0, &[0x00]);
    bus.load(0x0066, &[0xED, 0x45]); // RETN

    cpu.raise_nmi();
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0066);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(cpu.pc, 0x0001);
    assert!(cpu.iff1, "RETN copies IFF2 back");
}

#[test]
fn test_nmi_takes_priority_over_irq() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x1000;
    cpu.iff1 = true;
    cpu.im = 1;
    bus.load(0, &[0x00]);

    cpu.raise_interrupt(0xFF);
    cpu.raise_nmi();
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0066);
}

// ============================================================
// Maskable interrupt modes
// ============================================================

#[test]
fn test_im2_vector_table() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.iff1 = true;
    cpu.im = 2;
    cpu.i = 0x40;
    bus.load(0x4010, &[0x34, 0x12]);
    bus.load(0, &[0x00]);

    cpu.raise_interrupt(0x10);
    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 4 + 19);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn test_latest_vector_wins() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.iff1 = true;
    cpu.im = 2;
    cpu.i = 0x40;
    bus.load(0x4010, &[0x00, 0x10]);
    bus.load(0x4020, &[0x00, 0x20]);
    bus.load(0, &[0x00]);

    cpu.raise_interrupt(0x10);
    cpu.raise_interrupt(0x20);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x2000);
}

#[test]
fn test_im_instructions() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xED, 0x56, 0xED, 0x5E, 0xED, 0x46]); // IM 1 ; IM 2 ; IM 0

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.im, 1);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.im, 2);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.im, 0);
}

#[test]
fn test_im0_is_a_fault() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iff1 = true;
    cpu.im = 0;
    bus.load(0, &[0x00]);

    cpu.raise_interrupt(0xFF);
    let result = cpu.step(&mut bus);
    assert_eq!(result, Err(CpuFault::UnsupportedInterruptMode(0)));
}

// ============================================================
// HALT
// ============================================================

#[test]
fn test_halt_idles_until_interrupt() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.iff1 = true;
    cpu.im = 1;
    cpu.r = 0;
    bus.load(0, &[0x76]); // HALT

    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert!(cpu.halted);
    assert!(!cpu.is_ready());
    assert_eq!(cpu.pc, 0x0001, "PC stays past the HALT");

    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.pc, 0x0001);
    assert_eq!(cpu.r, 3, "refresh keeps running while halted");

    cpu.raise_interrupt(0xFF);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4 + 13);
    assert!(!cpu.halted);
    assert_eq!(cpu.pc, 0x0038);
    assert_eq!(bus.memory[0x7FFE], 0x01, "returns to the instruction after HALT");
}
