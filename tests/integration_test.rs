// End-to-end scenarios on hand-assembled ROM images.

use garnet::cpu::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z};
use garnet::{Emulator, IoReg};

/// 32 KiB ROM-only image with a program at the entry point.
fn rom_with_program(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    rom
}

fn emulator_with_program(program: &[u8]) -> Emulator {
    Emulator::new(&rom_with_program(program)).unwrap()
}

fn flags(emulator: &Emulator) -> u8 {
    emulator.cpu.registers().1
}

#[test]
fn mbc1_bank_switch_redirects_the_switchable_window() {
    // 128 KiB MBC1 image; bank 5 carries a marker at its first byte.
    let mut rom = vec![0u8; 0x20000];
    rom[0x0147] = 0x01; // MBC1
    rom[0x0148] = 0x02; // 128 KiB
    let program: &[u8] = &[
        0x3E, 0x05, // LD A, 0x05
        0xEA, 0x00, 0x21, // LD (0x2100), A
        0x76, // HALT
    ];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    rom[0x05 * 0x4000] = 0x99;

    let mut emulator = Emulator::new(&rom).unwrap();
    assert!(emulator.run_until_halt(1_000).unwrap());
    assert_eq!(emulator.bus.read_byte(0x4000), rom[0x05 * 0x4000]);
}

#[test]
fn daa_corrects_a_bcd_add() {
    // 0x15 + 0x27 in BCD should come out as 0x42.
    let mut emulator = emulator_with_program(&[
        0x3E, 0x15, // LD A, 0x15
        0x06, 0x27, // LD B, 0x27
        0x80, // ADD A, B
        0x27, // DAA
        0x76, // HALT
    ]);

    emulator.run_steps(3).unwrap();
    assert_eq!(emulator.cpu.registers().0, 0x3C);

    emulator.run_steps(1).unwrap();
    assert_eq!(emulator.cpu.registers().0, 0x42);
    assert_eq!(flags(&emulator) & FLAG_Z, 0);
    assert_eq!(flags(&emulator) & FLAG_C, 0);
}

#[test]
fn inc_reports_half_carry_and_preserves_carry() {
    let mut emulator = emulator_with_program(&[
        0x37, // SCF (so we can see C preserved)
        0x3E, 0x0F, // LD A, 0x0F
        0x3C, // INC A
        0x76, // HALT
    ]);

    emulator.run_steps(3).unwrap();
    assert_eq!(emulator.cpu.registers().0, 0x10);
    assert_eq!(flags(&emulator) & FLAG_Z, 0);
    assert_eq!(flags(&emulator) & FLAG_N, 0);
    assert_ne!(flags(&emulator) & FLAG_H, 0);
    assert_ne!(flags(&emulator) & FLAG_C, 0); // untouched by INC
}

#[test]
fn add_sp_flags_come_from_the_low_byte() {
    let mut emulator = emulator_with_program(&[
        0x31, 0xF8, 0xFF, // LD SP, 0xFFF8
        0xE8, 0x02, // ADD SP, 0x02
        0x31, 0x0F, 0x00, // LD SP, 0x000F
        0xE8, 0x01, // ADD SP, 0x01
        0x76, // HALT
    ]);

    emulator.run_steps(1).unwrap();
    let add_cost = emulator.step().unwrap();
    assert_eq!(add_cost, 4); // 16 T-cycles
    assert_eq!(emulator.cpu.sp(), 0xFFFA);
    assert_eq!(flags(&emulator) & (FLAG_Z | FLAG_N | FLAG_H | FLAG_C), 0);

    emulator.run_steps(2).unwrap();
    assert_eq!(emulator.cpu.sp(), 0x0010);
    assert_ne!(flags(&emulator) & FLAG_H, 0);
    assert_eq!(flags(&emulator) & FLAG_C, 0);
}

#[test]
fn interrupt_dispatch_pushes_pc_and_jumps_to_the_vector() {
    let mut rom = rom_with_program(&[]);
    rom[0x1233] = 0x76; // HALT
    let mut emulator = Emulator::new(&rom).unwrap();

    emulator.cpu.set_pc(0x1233);
    emulator.step().unwrap();
    assert!(emulator.cpu.halted());
    assert_eq!(emulator.cpu.pc(), 0x1234);

    emulator.bus.write_reg(IoReg::Ie, 0x01);
    emulator.bus.write_reg(IoReg::If, 0x01);
    emulator.cpu.set_ime(true);

    let m_cycles = emulator.step().unwrap();
    assert_eq!(m_cycles, 4); // 1 idle + 3 for the dispatch
    assert_eq!(emulator.bus.read_byte(0xFFFD), 0x12);
    assert_eq!(emulator.bus.read_byte(0xFFFC), 0x34);
    assert_eq!(emulator.cpu.sp(), 0xFFFC);
    assert_eq!(emulator.cpu.pc(), 0x0040);
    assert!(!emulator.cpu.ime());
    assert_eq!(emulator.bus.read_reg(IoReg::If), 0x00);
}

#[test]
fn pending_interrupt_lifts_halt_without_dispatch_when_ime_is_off() {
    let mut rom = rom_with_program(&[]);
    rom[0x1233] = 0x76; // HALT
    let mut emulator = Emulator::new(&rom).unwrap();

    emulator.cpu.set_pc(0x1233);
    emulator.step().unwrap();
    assert!(emulator.cpu.halted());

    emulator.bus.write_reg(IoReg::Ie, 0x04);
    emulator.bus.write_reg(IoReg::If, 0x04);

    emulator.step().unwrap();
    assert!(!emulator.cpu.halted());
    assert_eq!(emulator.cpu.pc(), 0x1234); // no vector taken
    assert_eq!(emulator.cpu.sp(), 0xFFFE); // nothing pushed
    assert_eq!(emulator.bus.read_reg(IoReg::If), 0x04); // request still pending
}

#[test]
fn push_pop_round_trips_through_the_stack() {
    let mut emulator = emulator_with_program(&[
        0x01, 0xCD, 0xAB, // LD BC, 0xABCD
        0xC5, // PUSH BC
        0xD1, // POP DE
        0x76, // HALT
    ]);

    emulator.run_steps(3).unwrap();
    let (_, _, b, c, d, e, _, _) = emulator.cpu.registers();
    assert_eq!(u16::from_le_bytes([c, b]), 0xABCD);
    assert_eq!(u16::from_le_bytes([e, d]), 0xABCD);
    assert_eq!(emulator.cpu.sp(), 0xFFFE);
}

#[test]
fn pop_af_clears_the_low_nibble_of_f() {
    let mut emulator = emulator_with_program(&[
        0x01, 0xFF, 0x12, // LD BC, 0x12FF
        0xC5, // PUSH BC
        0xF1, // POP AF
        0x76, // HALT
    ]);

    emulator.run_steps(3).unwrap();
    let (a, f, ..) = emulator.cpu.registers();
    assert_eq!(a, 0x12);
    assert_eq!(f, 0xF0);
    assert_eq!(emulator.cpu.sp(), 0xFFFE);
}

#[test]
fn flag_low_nibble_is_clear_after_every_instruction() {
    // A mixed program: arithmetic, rotates, loads, stack traffic.
    let mut emulator = emulator_with_program(&[
        0x3E, 0x0F, // LD A, 0x0F
        0x3C, // INC A
        0x07, // RLCA
        0xC6, 0xFF, // ADD A, 0xFF
        0x01, 0x34, 0x12, // LD BC, 0x1234
        0xC5, // PUSH BC
        0xF1, // POP AF
        0x2F, // CPL
        0x76, // HALT
    ]);

    while !emulator.cpu.halted() {
        emulator.step().unwrap();
        assert_eq!(flags(&emulator) & 0x0F, 0);
    }
}

#[test]
fn writing_zero_to_the_bank_register_selects_bank_one() {
    let mut rom = vec![0u8; 0x20000];
    rom[0x0147] = 0x01; // MBC1
    rom[0x0148] = 0x02; // 128 KiB
    let program: &[u8] = &[
        0x3E, 0x00, // LD A, 0x00
        0xEA, 0x00, 0x21, // LD (0x2100), A
        0x76, // HALT
    ];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    rom[0x4000] = 0x11; // bank 1 marker

    let mut emulator = Emulator::new(&rom).unwrap();
    assert!(emulator.run_until_halt(1_000).unwrap());
    assert_eq!(emulator.bus.read_byte(0x4000), 0x11);
}

#[test]
fn external_ram_enable_is_gated_on_0x0a() {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0147] = 0x02; // MBC1+RAM
    rom[0x0149] = 0x02; // 8 KiB
    let program: &[u8] = &[
        0x3E, 0x0A, // LD A, 0x0A
        0xEA, 0x00, 0x00, // LD (0x0000), A      - enable
        0x3E, 0x55, // LD A, 0x55
        0xEA, 0x00, 0xA0, // LD (0xA000), A      - sticks
        0x3E, 0x01, // LD A, 0x01
        0xEA, 0x00, 0x00, // LD (0x0000), A      - disable
        0xFA, 0x00, 0xA0, // LD A, (0xA000)      - open bus
        0x76, // HALT
    ];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);

    let mut emulator = Emulator::new(&rom).unwrap();
    assert!(emulator.run_until_halt(1_000).unwrap());
    assert_eq!(emulator.cpu.registers().0, 0xFF);

    // Re-enabling brings the stored byte back.
    emulator.bus.write_byte(0x0000, 0x0A);
    assert_eq!(emulator.bus.read_byte(0xA000), 0x55);
}

#[test]
fn div_increments_once_per_64_m_cycles() {
    let mut emulator = emulator_with_program(&[0x00; 0x100]);
    let before = emulator.bus.read_reg(IoReg::Div);

    emulator.run_steps(63).unwrap();
    assert_eq!(emulator.bus.read_reg(IoReg::Div), before);

    emulator.run_steps(1).unwrap();
    assert_eq!(emulator.bus.read_reg(IoReg::Div), before.wrapping_add(1));
}

#[test]
fn tima_overflow_raises_the_timer_interrupt() {
    let mut emulator = emulator_with_program(&[0x00; 0x100]);
    emulator.bus.write_reg(IoReg::If, 0x00);
    emulator.bus.write_reg(IoReg::Tma, 0x80);
    emulator.bus.write_reg(IoReg::Tima, 0xFF);
    emulator.bus.write_reg(IoReg::Tac, 0x05); // enabled, every 16 T-cycles

    emulator.run_steps(4).unwrap(); // 16 T-cycles
    assert_eq!(emulator.bus.read_reg(IoReg::Tima), 0x80);
    assert_eq!(emulator.bus.read_reg(IoReg::If) & 0x04, 0x04);
}

#[test]
fn call_and_ret_cycle_costs() {
    let mut rom = rom_with_program(&[
        0xCD, 0x10, 0x01, // CALL 0x0110
        0x76, // HALT
    ]);
    rom[0x0110] = 0xC9; // RET

    let mut emulator = Emulator::new(&rom).unwrap();
    assert_eq!(emulator.step().unwrap(), 6); // CALL: 24 T-cycles
    assert_eq!(emulator.cpu.pc(), 0x0110);
    assert_eq!(emulator.step().unwrap(), 4); // RET: 16 T-cycles
    assert_eq!(emulator.cpu.pc(), 0x0103);
    assert_eq!(emulator.cpu.sp(), 0xFFFE);
}

#[test]
fn conditional_ret_costs_more_when_taken() {
    // Z is set at power-up, so RET Z takes and RET NZ does not.
    let mut rom = rom_with_program(&[
        0xCD, 0x10, 0x01, // CALL 0x0110
        0x76, // HALT
    ]);
    rom[0x0110] = 0xC0; // RET NZ - not taken
    rom[0x0111] = 0xC8; // RET Z  - taken

    let mut emulator = Emulator::new(&rom).unwrap();
    emulator.step().unwrap();
    assert_eq!(emulator.step().unwrap(), 2); // RET NZ: 8 T-cycles
    assert_eq!(emulator.step().unwrap(), 5); // RET Z: 20 T-cycles
    assert_eq!(emulator.cpu.pc(), 0x0103);
}

#[test]
fn oam_dma_copies_from_wram() {
    let mut emulator = emulator_with_program(&[
        0x3E, 0x5A, // LD A, 0x5A
        0xEA, 0x07, 0xC0, // LD (0xC007), A
        0x3E, 0xC0, // LD A, 0xC0
        0xE0, 0x46, // LDH (DMA), A
        0x76, // HALT
    ]);
    assert!(emulator.run_until_halt(1_000).unwrap());
    assert_eq!(emulator.bus.read_byte(0xFE07), 0x5A);
    assert_eq!(emulator.bus.read_reg(IoReg::Dma), 0xC0);
}

#[test]
fn ld_hl_sp_r8_writes_flags_but_not_sp() {
    let mut emulator = emulator_with_program(&[
        0x31, 0xF8, 0xFF, // LD SP, 0xFFF8
        0xF8, 0x08, // LD HL, SP+0x08
        0x76, // HALT
    ]);
    emulator.run_steps(1).unwrap();
    assert_eq!(emulator.step().unwrap(), 3); // 12 T-cycles
    let (_, _, _, _, _, _, h, l) = emulator.cpu.registers();
    assert_eq!(u16::from_le_bytes([l, h]), 0x0000);
    assert_eq!(emulator.cpu.sp(), 0xFFF8);
    assert_ne!(flags(&emulator) & FLAG_C, 0); // 0xF8 + 0x08 carries
    assert_ne!(flags(&emulator) & FLAG_H, 0);
}
