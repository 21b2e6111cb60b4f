use cabinet_core::core::{Snapshot, SnapshotReader, SnapshotWriter};
use cabinet_core::cpu::z80::Z80;
use cabinet_core::cpu::Cpu;
mod common;
use common::{TestBus, run_instruction};

// ============================================================
// Refresh register
// ============================================================

#[test]
fn test_r_increments_per_opcode_fetch() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.r = 0;
    bus.load(0, &[0x00, 0xCB, 0x00, 0xED, 0x44]); // NOP ; RLC B ; NEG

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.r, 1);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.r, 3, "prefix byte counts");
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.r, 5);
}

#[test]
fn test_r_keeps_bit_7() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.r = 0xFF;
    bus.load(0, &[0x00]);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.r, 0x80);
}

// ============================================================
// ED page oddities
// ============================================================

#[test]
fn test_undefined_ed_is_an_eight_cycle_nop() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_af(0x1234);
    bus.load(0, &[0xED, 0x00, 0xED, 0xFF]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.pc, 0x0004);
    assert_eq!(cpu.get_af(), 0x1234);
}

#[test]
fn test_reti_returns() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x7FFE;
    bus.load(0x7FFE, &[0x00, 0x20]);
    bus.load(0, &[0xED, 0x4D]);

    assert_eq!(run_instruction(&mut cpu, &mut bus), 14);
    assert_eq!(cpu.pc, 0x2000);
}

// ============================================================
// I/O
// ============================================================

#[test]
fn test_in_a_n_puts_a_on_the_high_lines() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x12;
    cpu.f = 0x00;
    bus.ports[0x34] = 0x00;
    bus.load(0, &[0xDB, 0x34]); // IN A,($34)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 11);
    assert_eq!(bus.io_reads, vec![0x1234]);
    assert_eq!(cpu.a, 0x00);
    assert_eq!(cpu.f, 0x00, "IN A,(n) leaves flags alone");
}

#[test]
fn test_in_r_c_sets_flags() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0510);
    cpu.f = 0x01;
    bus.ports[0x10] = 0x00;
    bus.load(0, &[0xED, 0x50]); // IN D,(C)

    assert_eq!(run_instruction(&mut cpu, &mut bus), 12);
    assert_eq!(cpu.d, 0x00);
    assert_eq!(cpu.f, 0x45, "Z and PV from the value, C kept");
    assert_eq!(bus.io_reads, vec![0x0510]);
}

#[test]
fn test_in_c_discards_value() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x0010);
    cpu.set_hl(0xAAAA);
    bus.ports[0x10] = 0x80;
    bus.load(0, &[0xED, 0x70]); // IN (C)

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_hl(), 0xAAAA);
    assert_ne!(cpu.f & 0x80, 0);
}

#[test]
fn test_out_n_a_and_out_c_zero() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x77;
    cpu.set_bc(0x0120);
    bus.load(0, &[0xD3, 0x10, 0xED, 0x71, 0xED, 0x79]); // OUT ($10),A ; OUT (C),0 ; OUT (C),A

    assert_eq!(run_instruction(&mut cpu, &mut bus), 11);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 12);
    assert_eq!(run_instruction(&mut cpu, &mut bus), 12);
    assert_eq!(bus.io_writes, vec![(0x7710, 0x77), (0x0120, 0x00), (0x0120, 0x77)]);
}

// ============================================================
// Register table
// ============================================================

#[test]
fn test_named_registers() {
    let mut cpu = Z80::new();
    cpu.set_af(0x1234);
    assert_eq!(cpu.register("AF"), Some(0x1234));
    assert_eq!(cpu.register("a"), Some(0x12));

    assert!(cpu.set_register("IYH", 0x56));
    assert_eq!(cpu.iy & 0xFF00, 0x5600);
    assert!(cpu.set_register("PC", 0x4000));
    assert_eq!(cpu.program_counter(), 0x4000);

    assert!(!cpu.set_register("MEMPTR", 0));
    assert_eq!(cpu.register("XYZ"), None);
    assert_eq!(cpu.register_names()[0], "A");
    assert_eq!(cpu.register_names().len(), 30);
}

#[test]
fn test_reset_clears_interrupt_state() {
    let mut cpu = Z80::new();
    cpu.pc = 0x1234;
    cpu.iff1 = true;
    cpu.im = 2;
    cpu.halted = true;
    cpu.raise_interrupt(0x10);

    cpu.reset();
    assert_eq!(cpu.pc, 0);
    assert!(!cpu.iff1);
    assert_eq!(cpu.im, 0);
    assert!(cpu.is_ready());

    // Nothing left pending: a NOP runs without a fault in IM 0.
    let mut bus = TestBus::new();
    cpu.iff1 = true;
    assert_eq!(run_instruction(&mut cpu, &mut bus), 4);
}

#[test]
fn test_register_snapshot_round_trip() {
    let mut cpu = Z80::new();
    cpu.set_bc(0x1122);
    cpu.a_prime = 0x33;
    cpu.ix = 0x4455;
    cpu.i = 0x66;
    cpu.r = 0x87;
    cpu.iff1 = true;
    cpu.im = 2;
    cpu.raise_interrupt(0x9A);

    let mut out = SnapshotWriter::new();
    cpu.save(&mut out);
    let bytes = out.into_bytes();
    assert_eq!(bytes.len(), 2 + 22 * 2 + 7);

    let mut copy = Z80::new();
    let mut input = SnapshotReader::new(&bytes);
    copy.restore(&mut input).unwrap();
    input.finish().unwrap();

    for name in copy.register_names() {
        assert_eq!(copy.register(name), cpu.register(name), "register {name}");
    }
    assert!(copy.iff1);
    assert_eq!(copy.im, 2);

    // The pending request came across too.
    let mut bus = TestBus::new();
    copy.sp = 0x8000;
    bus.load(0x669A, &[0x00, 0x30]);
    bus.load(0x1122, &[0x00]);
    copy.pc = 0x1122;
    run_instruction(&mut copy, &mut bus);
    assert_eq!(copy.pc, 0x3000);
}

#[test]
fn test_snapshot_rejects_bad_interrupt_mode() {
    let cpu = Z80::new();
    let mut out = SnapshotWriter::new();
    cpu.save(&mut out);
    let mut bytes = out.into_bytes();
    let im_offset = 2 + 22 * 2 + 2;
    bytes[im_offset] = 3;

    let mut copy = Z80::new();
    assert!(copy.restore(&mut SnapshotReader::new(&bytes)).is_err());
}
