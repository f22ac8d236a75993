use super::Cpu;
use crate::cpu::{Condition, Operand};
use crate::error::{CoreError, CoreResult};
use crate::memory_bus::MemoryBus;
use lazy_static::lazy_static;

/// Static description of a primary-table opcode, used by the trace sink and
/// the disassembler. Execution lives in `Cpu::execute` below.
#[derive(Clone)]
pub struct Instruction {
    pub mnemonic: &'static str,
    pub length: u8,
}

impl Instruction {
    pub const fn new(mnemonic: &'static str, length: u8) -> Self {
        Instruction { mnemonic, length }
    }

    pub const fn invalid() -> Self {
        Instruction {
            mnemonic: "INVALID",
            length: 1,
        }
    }
}

macro_rules! instr {
    ($mne:expr, $len:expr) => {
        Instruction::new($mne, $len)
    };
}
macro_rules! invalid {
    () => {
        Instruction::invalid()
    };
}

lazy_static! {
    // Main instruction table (0x00 - 0xFF)
    pub static ref INSTRUCTIONS: [Instruction; 256] = [
        // --- 0x00 ---
        instr!("NOP", 1),
        instr!("LD BC, d16", 3),
        instr!("LD (BC), A", 1),
        instr!("INC BC", 1),
        instr!("INC B", 1),
        instr!("DEC B", 1),
        instr!("LD B, d8", 2),
        instr!("RLCA", 1),
        instr!("LD (a16), SP", 3),
        instr!("ADD HL, BC", 1),
        instr!("LD A, (BC)", 1),
        instr!("DEC BC", 1),
        instr!("INC C", 1),
        instr!("DEC C", 1),
        instr!("LD C, d8", 2),
        instr!("RRCA", 1),
        // --- 0x10 ---
        instr!("STOP", 2),
        instr!("LD DE, d16", 3),
        instr!("LD (DE), A", 1),
        instr!("INC DE", 1),
        instr!("INC D", 1),
        instr!("DEC D", 1),
        instr!("LD D, d8", 2),
        instr!("RLA", 1),
        instr!("JR r8", 2),
        instr!("ADD HL, DE", 1),
        instr!("LD A, (DE)", 1),
        instr!("DEC DE", 1),
        instr!("INC E", 1),
        instr!("DEC E", 1),
        instr!("LD E, d8", 2),
        instr!("RRA", 1),
        // --- 0x20 ---
        instr!("JR NZ, r8", 2),
        instr!("LD HL, d16", 3),
        instr!("LD (HL+), A", 1),
        instr!("INC HL", 1),
        instr!("INC H", 1),
        instr!("DEC H", 1),
        instr!("LD H, d8", 2),
        instr!("DAA", 1),
        instr!("JR Z, r8", 2),
        instr!("ADD HL, HL", 1),
        instr!("LD A, (HL+)", 1),
        instr!("DEC HL", 1),
        instr!("INC L", 1),
        instr!("DEC L", 1),
        instr!("LD L, d8", 2),
        instr!("CPL", 1),
        // --- 0x30 ---
        instr!("JR NC, r8", 2),
        instr!("LD SP, d16", 3),
        instr!("LD (HL-), A", 1),
        instr!("INC SP", 1),
        instr!("INC (HL)", 1),
        instr!("DEC (HL)", 1),
        instr!("LD (HL), d8", 2),
        instr!("SCF", 1),
        instr!("JR C, r8", 2),
        instr!("ADD HL, SP", 1),
        instr!("LD A, (HL-)", 1),
        instr!("DEC SP", 1),
        instr!("INC A", 1),
        instr!("DEC A", 1),
        instr!("LD A, d8", 2),
        instr!("CCF", 1),
        // --- 0x40 ---
        instr!("LD B, B", 1),
        instr!("LD B, C", 1),
        instr!("LD B, D", 1),
        instr!("LD B, E", 1),
        instr!("LD B, H", 1),
        instr!("LD B, L", 1),
        instr!("LD B, (HL)", 1),
        instr!("LD B, A", 1),
        instr!("LD C, B", 1),
        instr!("LD C, C", 1),
        instr!("LD C, D", 1),
        instr!("LD C, E", 1),
        instr!("LD C, H", 1),
        instr!("LD C, L", 1),
        instr!("LD C, (HL)", 1),
        instr!("LD C, A", 1),
        // --- 0x50 ---
        instr!("LD D, B", 1),
        instr!("LD D, C", 1),
        instr!("LD D, D", 1),
        instr!("LD D, E", 1),
        instr!("LD D, H", 1),
        instr!("LD D, L", 1),
        instr!("LD D, (HL)", 1),
        instr!("LD D, A", 1),
        instr!("LD E, B", 1),
        instr!("LD E, C", 1),
        instr!("LD E, D", 1),
        instr!("LD E, E", 1),
        instr!("LD E, H", 1),
        instr!("LD E, L", 1),
        instr!("LD E, (HL)", 1),
        instr!("LD E, A", 1),
        // --- 0x60 ---
        instr!("LD H, B", 1),
        instr!("LD H, C", 1),
        instr!("LD H, D", 1),
        instr!("LD H, E", 1),
        instr!("LD H, H", 1),
        instr!("LD H, L", 1),
        instr!("LD H, (HL)", 1),
        instr!("LD H, A", 1),
        instr!("LD L, B", 1),
        instr!("LD L, C", 1),
        instr!("LD L, D", 1),
        instr!("LD L, E", 1),
        instr!("LD L, H", 1),
        instr!("LD L, L", 1),
        instr!("LD L, (HL)", 1),
        instr!("LD L, A", 1),
        // --- 0x70 ---
        instr!("LD (HL), B", 1),
        instr!("LD (HL), C", 1),
        instr!("LD (HL), D", 1),
        instr!("LD (HL), E", 1),
        instr!("LD (HL), H", 1),
        instr!("LD (HL), L", 1),
        instr!("HALT", 1),
        instr!("LD (HL), A", 1),
        instr!("LD A, B", 1),
        instr!("LD A, C", 1),
        instr!("LD A, D", 1),
        instr!("LD A, E", 1),
        instr!("LD A, H", 1),
        instr!("LD A, L", 1),
        instr!("LD A, (HL)", 1),
        instr!("LD A, A", 1),
        // --- 0x80 ---
        instr!("ADD A, B", 1),
        instr!("ADD A, C", 1),
        instr!("ADD A, D", 1),
        instr!("ADD A, E", 1),
        instr!("ADD A, H", 1),
        instr!("ADD A, L", 1),
        instr!("ADD A, (HL)", 1),
        instr!("ADD A, A", 1),
        instr!("ADC A, B", 1),
        instr!("ADC A, C", 1),
        instr!("ADC A, D", 1),
        instr!("ADC A, E", 1),
        instr!("ADC A, H", 1),
        instr!("ADC A, L", 1),
        instr!("ADC A, (HL)", 1),
        instr!("ADC A, A", 1),
        // --- 0x90 ---
        instr!("SUB A, B", 1),
        instr!("SUB A, C", 1),
        instr!("SUB A, D", 1),
        instr!("SUB A, E", 1),
        instr!("SUB A, H", 1),
        instr!("SUB A, L", 1),
        instr!("SUB A, (HL)", 1),
        instr!("SUB A, A", 1),
        instr!("SBC A, B", 1),
        instr!("SBC A, C", 1),
        instr!("SBC A, D", 1),
        instr!("SBC A, E", 1),
        instr!("SBC A, H", 1),
        instr!("SBC A, L", 1),
        instr!("SBC A, (HL)", 1),
        instr!("SBC A, A", 1),
        // --- 0xA0 ---
        instr!("AND A, B", 1),
        instr!("AND A, C", 1),
        instr!("AND A, D", 1),
        instr!("AND A, E", 1),
        instr!("AND A, H", 1),
        instr!("AND A, L", 1),
        instr!("AND A, (HL)", 1),
        instr!("AND A, A", 1),
        instr!("XOR A, B", 1),
        instr!("XOR A, C", 1),
        instr!("XOR A, D", 1),
        instr!("XOR A, E", 1),
        instr!("XOR A, H", 1),
        instr!("XOR A, L", 1),
        instr!("XOR A, (HL)", 1),
        instr!("XOR A, A", 1),
        // --- 0xB0 ---
        instr!("OR A, B", 1),
        instr!("OR A, C", 1),
        instr!("OR A, D", 1),
        instr!("OR A, E", 1),
        instr!("OR A, H", 1),
        instr!("OR A, L", 1),
        instr!("OR A, (HL)", 1),
        instr!("OR A, A", 1),
        instr!("CP A, B", 1),
        instr!("CP A, C", 1),
        instr!("CP A, D", 1),
        instr!("CP A, E", 1),
        instr!("CP A, H", 1),
        instr!("CP A, L", 1),
        instr!("CP A, (HL)", 1),
        instr!("CP A, A", 1),
        // --- 0xC0 ---
        instr!("RET NZ", 1),
        instr!("POP BC", 1),
        instr!("JP NZ, a16", 3),
        instr!("JP a16", 3),
        instr!("CALL NZ, a16", 3),
        instr!("PUSH BC", 1),
        instr!("ADD A, d8", 2),
        instr!("RST 00H", 1),
        instr!("RET Z", 1),
        instr!("RET", 1),
        instr!("JP Z, a16", 3),
        instr!("PREFIX CB", 2),
        instr!("CALL Z, a16", 3),
        instr!("CALL a16", 3),
        instr!("ADC A, d8", 2),
        instr!("RST 08H", 1),
        // --- 0xD0 ---
        instr!("RET NC", 1),
        instr!("POP DE", 1),
        instr!("JP NC, a16", 3),
        invalid!(),
        instr!("CALL NC, a16", 3),
        instr!("PUSH DE", 1),
        instr!("SUB A, d8", 2),
        instr!("RST 10H", 1),
        instr!("RET C", 1),
        instr!("RETI", 1),
        instr!("JP C, a16", 3),
        invalid!(),
        instr!("CALL C, a16", 3),
        invalid!(),
        instr!("SBC A, d8", 2),
        instr!("RST 18H", 1),
        // --- 0xE0 ---
        instr!("LDH (a8), A", 2),
        instr!("POP HL", 1),
        instr!("LD (C), A", 1),
        invalid!(),
        invalid!(),
        instr!("PUSH HL", 1),
        instr!("AND A, d8", 2),
        instr!("RST 20H", 1),
        instr!("ADD SP, r8", 2),
        instr!("JP HL", 1),
        instr!("LD (a16), A", 3),
        invalid!(),
        invalid!(),
        invalid!(),
        instr!("XOR A, d8", 2),
        instr!("RST 28H", 1),
        // --- 0xF0 ---
        instr!("LDH A, (a8)", 2),
        instr!("POP AF", 1),
        instr!("LD A, (C)", 1),
        instr!("DI", 1),
        invalid!(),
        instr!("PUSH AF", 1),
        instr!("OR A, d8", 2),
        instr!("RST 30H", 1),
        instr!("LD HL, SP+r8", 2),
        instr!("LD SP, HL", 1),
        instr!("LD A, (a16)", 3),
        instr!("EI", 1),
        invalid!(),
        invalid!(),
        instr!("CP A, d8", 2),
        instr!("RST 38H", 1),
    ];
}

// Operand slots shared by the whole CB page (and the primary LD/ALU grids).
const SLOTS: [Operand; 8] = [
    Operand::B,
    Operand::C,
    Operand::D,
    Operand::E,
    Operand::H,
    Operand::L,
    Operand::HLInd,
    Operand::A,
];

const SLOT_NAMES: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];

/// Mnemonic for a CB-page opcode; the page is regular enough to compose.
pub fn cb_mnemonic(opcode: u8) -> String {
    const SHIFTS: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SWAP", "SRL"];
    let slot = SLOT_NAMES[(opcode & 0x07) as usize];
    let n = (opcode >> 3) & 0x07;
    match opcode >> 6 {
        0b00 => format!("{} {}", SHIFTS[n as usize], slot),
        0b01 => format!("BIT {n}, {slot}"),
        0b10 => format!("RES {n}, {slot}"),
        _ => format!("SET {n}, {slot}"),
    }
}

/// Renders the instruction at `address` with its immediate operands filled
/// in. Returns the text and the instruction length in bytes.
pub fn disassemble(bus: &MemoryBus, address: u16) -> (String, u8) {
    let opcode = bus.read_byte(address);
    if opcode == 0xCB {
        let cb_opcode = bus.read_byte(address.wrapping_add(1));
        return (cb_mnemonic(cb_opcode), 2);
    }

    let instr = &INSTRUCTIONS[opcode as usize];
    let operand_str = match instr.length {
        2 => {
            let d8 = bus.read_byte(address.wrapping_add(1));
            if instr.mnemonic.contains("r8") {
                format!("{:+}", d8 as i8)
            } else {
                format!("${d8:02X}")
            }
        }
        3 => {
            let lo = bus.read_byte(address.wrapping_add(1));
            let hi = bus.read_byte(address.wrapping_add(2));
            format!("${:04X}", u16::from_le_bytes([lo, hi]))
        }
        _ => String::new(),
    };
    let text = instr
        .mnemonic
        .replace("d16", &operand_str)
        .replace("a16", &operand_str)
        .replace("SP+r8", &format!("SP{operand_str}"))
        .replace("d8", &operand_str)
        .replace("r8", &operand_str)
        .replace("a8", &operand_str);
    (text, instr.length)
}

// --- Opcode dispatch ---
//
// One arm per primary opcode; each resolves to a handler call with the
// operands baked in. Cycle costs fall out of the handlers' memory traffic.
impl Cpu {
    pub(crate) fn execute(&mut self, bus: &mut MemoryBus, opcode: u8) -> CoreResult<()> {
        use Condition as Cond;
        use Operand::*;
        match opcode {
            0x00 => Ok(()), // NOP
            0x01 => self.ld16(bus, BC, NN),
            0x02 => self.ld8(bus, BCInd, A),
            0x03 => self.inc16(bus, BC),
            0x04 => self.inc8(bus, B),
            0x05 => self.dec8(bus, B),
            0x06 => self.ld8(bus, B, N),
            0x07 => self.rlc(bus, AVirt),
            0x08 => self.ld16(bus, NNInd, SP),
            0x09 => self.add_hl(bus, BC),
            0x0A => self.ld8(bus, A, BCInd),
            0x0B => self.dec16(bus, BC),
            0x0C => self.inc8(bus, C),
            0x0D => self.dec8(bus, C),
            0x0E => self.ld8(bus, C, N),
            0x0F => self.rrc(bus, AVirt),

            0x10 => self.stop(bus),
            0x11 => self.ld16(bus, DE, NN),
            0x12 => self.ld8(bus, DEInd, A),
            0x13 => self.inc16(bus, DE),
            0x14 => self.inc8(bus, D),
            0x15 => self.dec8(bus, D),
            0x16 => self.ld8(bus, D, N),
            0x17 => self.rl(bus, AVirt),
            0x18 => self.jr(bus, Cond::Always),
            0x19 => self.add_hl(bus, DE),
            0x1A => self.ld8(bus, A, DEInd),
            0x1B => self.dec16(bus, DE),
            0x1C => self.inc8(bus, E),
            0x1D => self.dec8(bus, E),
            0x1E => self.ld8(bus, E, N),
            0x1F => self.rr(bus, AVirt),

            0x20 => self.jr(bus, Cond::NZ),
            0x21 => self.ld16(bus, HL, NN),
            0x22 => self.ld8(bus, HLIncInd, A),
            0x23 => self.inc16(bus, HL),
            0x24 => self.inc8(bus, H),
            0x25 => self.dec8(bus, H),
            0x26 => self.ld8(bus, H, N),
            0x27 => {
                self.daa();
                Ok(())
            }
            0x28 => self.jr(bus, Cond::Z),
            0x29 => self.add_hl(bus, HL),
            0x2A => self.ld8(bus, A, HLIncInd),
            0x2B => self.dec16(bus, HL),
            0x2C => self.inc8(bus, L),
            0x2D => self.dec8(bus, L),
            0x2E => self.ld8(bus, L, N),
            0x2F => {
                self.cpl();
                Ok(())
            }

            0x30 => self.jr(bus, Cond::NC),
            0x31 => self.ld16(bus, SP, NN),
            0x32 => self.ld8(bus, HLDecInd, A),
            0x33 => self.inc16(bus, SP),
            0x34 => self.inc8(bus, HLInd),
            0x35 => self.dec8(bus, HLInd),
            0x36 => self.ld8(bus, HLInd, N),
            0x37 => {
                self.scf();
                Ok(())
            }
            0x38 => self.jr(bus, Cond::C),
            0x39 => self.add_hl(bus, SP),
            0x3A => self.ld8(bus, A, HLDecInd),
            0x3B => self.dec16(bus, SP),
            0x3C => self.inc8(bus, A),
            0x3D => self.dec8(bus, A),
            0x3E => self.ld8(bus, A, N),
            0x3F => {
                self.ccf();
                Ok(())
            }

            // LD r,r' grid; 0x76 is HALT, the hole where LD (HL),(HL) would be.
            0x76 => {
                self.halt();
                Ok(())
            }
            0x40..=0x7F => {
                let dst = SLOTS[((opcode - 0x40) >> 3) as usize];
                let src = SLOTS[(opcode & 0x07) as usize];
                self.ld8(bus, dst, src)
            }

            // ALU grid over the same eight slots.
            0x80..=0x87 => self.add_a(bus, SLOTS[(opcode & 0x07) as usize], false),
            0x88..=0x8F => self.add_a(bus, SLOTS[(opcode & 0x07) as usize], true),
            0x90..=0x97 => self.sub_a(bus, SLOTS[(opcode & 0x07) as usize], false),
            0x98..=0x9F => self.sub_a(bus, SLOTS[(opcode & 0x07) as usize], true),
            0xA0..=0xA7 => self.and_a(bus, SLOTS[(opcode & 0x07) as usize]),
            0xA8..=0xAF => self.xor_a(bus, SLOTS[(opcode & 0x07) as usize]),
            0xB0..=0xB7 => self.or_a(bus, SLOTS[(opcode & 0x07) as usize]),
            0xB8..=0xBF => self.cp_a(bus, SLOTS[(opcode & 0x07) as usize]),

            0xC0 => self.ret(bus, Cond::NZ),
            0xC1 => self.pop_op(bus, BC),
            0xC2 => self.jp(bus, Cond::NZ),
            0xC3 => self.jp(bus, Cond::Always),
            0xC4 => self.call(bus, Cond::NZ),
            0xC5 => self.push_op(bus, BC),
            0xC6 => self.add_a(bus, N, false),
            0xC7 => {
                self.rst(bus, 0x0000);
                Ok(())
            }
            0xC8 => self.ret(bus, Cond::Z),
            0xC9 => self.ret(bus, Cond::Always),
            0xCA => self.jp(bus, Cond::Z),
            0xCB => {
                let cb_opcode = self.fetch8(bus);
                self.execute_cb(bus, cb_opcode)
            }
            0xCC => self.call(bus, Cond::Z),
            0xCD => self.call(bus, Cond::Always),
            0xCE => self.add_a(bus, N, true),
            0xCF => {
                self.rst(bus, 0x0008);
                Ok(())
            }

            0xD0 => self.ret(bus, Cond::NC),
            0xD1 => self.pop_op(bus, DE),
            0xD2 => self.jp(bus, Cond::NC),
            0xD4 => self.call(bus, Cond::NC),
            0xD5 => self.push_op(bus, DE),
            0xD6 => self.sub_a(bus, N, false),
            0xD7 => {
                self.rst(bus, 0x0010);
                Ok(())
            }
            0xD8 => self.ret(bus, Cond::C),
            0xD9 => self.reti(bus),
            0xDA => self.jp(bus, Cond::C),
            0xDC => self.call(bus, Cond::C),
            0xDE => self.sub_a(bus, N, true),
            0xDF => {
                self.rst(bus, 0x0018);
                Ok(())
            }

            0xE0 => self.ld8(bus, HighN, A),
            0xE1 => self.pop_op(bus, HL),
            0xE2 => self.ld8(bus, HighC, A),
            0xE5 => self.push_op(bus, HL),
            0xE6 => self.and_a(bus, N),
            0xE7 => {
                self.rst(bus, 0x0020);
                Ok(())
            }
            0xE8 => self.add_sp(bus),
            0xE9 => {
                self.jp_hl();
                Ok(())
            }
            0xEA => self.ld8(bus, NNInd, A),
            0xEE => self.xor_a(bus, N),
            0xEF => {
                self.rst(bus, 0x0028);
                Ok(())
            }

            0xF0 => self.ld8(bus, A, HighN),
            0xF1 => self.pop_op(bus, AF),
            0xF2 => self.ld8(bus, A, HighC),
            0xF3 => {
                self.di();
                Ok(())
            }
            0xF5 => self.push_op(bus, AF),
            0xF6 => self.or_a(bus, N),
            0xF7 => {
                self.rst(bus, 0x0030);
                Ok(())
            }
            0xF8 => self.ld_hl_sp_r8(bus),
            0xF9 => {
                self.ld_sp_hl();
                Ok(())
            }
            0xFA => self.ld8(bus, A, NNInd),
            0xFB => {
                self.ei();
                Ok(())
            }
            0xFE => self.cp_a(bus, N),
            0xFF => {
                self.rst(bus, 0x0038);
                Ok(())
            }

            // The eleven holes in the primary table.
            0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
                Err(CoreError::IllegalOpcode {
                    opcode,
                    pc: self.pc.wrapping_sub(1),
                })
            }
        }
    }

    /// CB-prefixed page: shifts/rotates/SWAP in the top quarter, then
    /// BIT/RES/SET over bit `n` of the same eight slots.
    pub(crate) fn execute_cb(&mut self, bus: &mut MemoryBus, opcode: u8) -> CoreResult<()> {
        let op = SLOTS[(opcode & 0x07) as usize];
        let n = (opcode >> 3) & 0x07;
        match opcode >> 6 {
            0b00 => match n {
                0 => self.rlc(bus, op),
                1 => self.rrc(bus, op),
                2 => self.rl(bus, op),
                3 => self.rr(bus, op),
                4 => self.sla(bus, op),
                5 => self.sra(bus, op),
                6 => self.swap(bus, op),
                _ => self.srl(bus, op),
            },
            0b01 => self.bit(bus, n, op),
            0b10 => self.res(bus, n, op),
            _ => self.set(bus, n, op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_all_primary_opcodes() {
        assert_eq!(INSTRUCTIONS.len(), 256);
        let invalid = INSTRUCTIONS
            .iter()
            .filter(|i| i.mnemonic == "INVALID")
            .count();
        assert_eq!(invalid, 11);
    }

    #[test]
    fn cb_mnemonics_compose() {
        assert_eq!(cb_mnemonic(0x00), "RLC B");
        assert_eq!(cb_mnemonic(0x37), "SWAP A");
        assert_eq!(cb_mnemonic(0x46), "BIT 0, (HL)");
        assert_eq!(cb_mnemonic(0xBE), "RES 7, (HL)");
        assert_eq!(cb_mnemonic(0xFF), "SET 7, A");
    }
}
