// Operand addressing
//
// Every instruction names its sources and destinations with `Operand`; the
// load/store routines below resolve them, consuming one M-cycle per
// immediate fetch and per indirect memory access. Width mismatches (an 8-bit
// load of a register pair and the like) are programmer errors in the
// dispatch tables and surface as `OperandWidth`.

use super::Cpu;
use crate::error::{CoreError, CoreResult};
use crate::memory_bus::MemoryBus;

/// A source or destination an opcode can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    // 8-bit registers
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    /// The accumulator as named by RLCA/RRCA/RLA/RRA, which force Z clear
    /// where the CB-prefixed rotates set it from the result.
    AVirt,
    // 16-bit pairs
    AF,
    BC,
    DE,
    HL,
    SP,
    /// 8-bit immediate
    N,
    /// 16-bit immediate
    NN,
    // Indirect pointers
    BCInd,
    DEInd,
    HLInd,
    /// `(a16)`: pointer named by a 16-bit immediate
    NNInd,
    /// `(HL+)`: HL increments after the access
    HLIncInd,
    /// `(HL-)`: HL decrements after the access
    HLDecInd,
    /// `(FF00+n)`: high page indexed by an 8-bit immediate
    HighN,
    /// `(FF00+C)`: high page indexed by register C
    HighC,
}

/// Branch condition of the conditional jumps/calls/returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    Z,
    NZ,
    C,
    NC,
}

impl Cpu {
    /// Resolves an 8-bit read of `op`, ticking for every bus access.
    pub(crate) fn load8(&mut self, bus: &mut MemoryBus, op: Operand) -> CoreResult<u8> {
        match op {
            Operand::A | Operand::AVirt => Ok(self.a),
            Operand::F => Ok(self.f),
            Operand::B => Ok(self.b),
            Operand::C => Ok(self.c),
            Operand::D => Ok(self.d),
            Operand::E => Ok(self.e),
            Operand::H => Ok(self.h),
            Operand::L => Ok(self.l),
            Operand::N => Ok(self.fetch8(bus)),
            Operand::BCInd => Ok(self.read8(bus, self.get_bc())),
            Operand::DEInd => Ok(self.read8(bus, self.get_de())),
            Operand::HLInd => Ok(self.read8(bus, self.get_hl())),
            Operand::NNInd => {
                let addr = self.fetch16(bus);
                Ok(self.read8(bus, addr))
            }
            Operand::HLIncInd => {
                let addr = self.get_hl();
                let value = self.read8(bus, addr);
                self.set_hl(addr.wrapping_add(1));
                Ok(value)
            }
            Operand::HLDecInd => {
                let addr = self.get_hl();
                let value = self.read8(bus, addr);
                self.set_hl(addr.wrapping_sub(1));
                Ok(value)
            }
            Operand::HighN => {
                let offset = self.fetch8(bus);
                Ok(self.read8(bus, 0xFF00 | offset as u16))
            }
            Operand::HighC => Ok(self.read8(bus, 0xFF00 | self.c as u16)),
            Operand::AF | Operand::BC | Operand::DE | Operand::HL | Operand::SP | Operand::NN => {
                Err(CoreError::OperandWidth {
                    op,
                    expected: "an 8-bit source",
                })
            }
        }
    }

    /// Resolves an 8-bit write of `value` to `op`.
    pub(crate) fn store8(&mut self, bus: &mut MemoryBus, op: Operand, value: u8) -> CoreResult<()> {
        match op {
            Operand::A | Operand::AVirt => self.a = value,
            Operand::F => self.f = value & 0xF0,
            Operand::B => self.b = value,
            Operand::C => self.c = value,
            Operand::D => self.d = value,
            Operand::E => self.e = value,
            Operand::H => self.h = value,
            Operand::L => self.l = value,
            Operand::BCInd => self.write8(bus, self.get_bc(), value),
            Operand::DEInd => self.write8(bus, self.get_de(), value),
            Operand::HLInd => self.write8(bus, self.get_hl(), value),
            Operand::NNInd => {
                let addr = self.fetch16(bus);
                self.write8(bus, addr, value);
            }
            Operand::HLIncInd => {
                let addr = self.get_hl();
                self.write8(bus, addr, value);
                self.set_hl(addr.wrapping_add(1));
            }
            Operand::HLDecInd => {
                let addr = self.get_hl();
                self.write8(bus, addr, value);
                self.set_hl(addr.wrapping_sub(1));
            }
            Operand::HighN => {
                let offset = self.fetch8(bus);
                self.write8(bus, 0xFF00 | offset as u16, value);
            }
            Operand::HighC => self.write8(bus, 0xFF00 | self.c as u16, value),
            Operand::AF
            | Operand::BC
            | Operand::DE
            | Operand::HL
            | Operand::SP
            | Operand::N
            | Operand::NN => {
                return Err(CoreError::OperandWidth {
                    op,
                    expected: "an 8-bit destination",
                });
            }
        }
        Ok(())
    }

    /// Resolves a 16-bit read of `op`.
    pub(crate) fn load16(&mut self, bus: &mut MemoryBus, op: Operand) -> CoreResult<u16> {
        match op {
            Operand::AF => Ok(self.get_af()),
            Operand::BC => Ok(self.get_bc()),
            Operand::DE => Ok(self.get_de()),
            Operand::HL => Ok(self.get_hl()),
            Operand::SP => Ok(self.sp),
            Operand::NN => Ok(self.fetch16(bus)),
            _ => Err(CoreError::OperandWidth {
                op,
                expected: "a 16-bit source",
            }),
        }
    }

    /// Resolves a 16-bit write of `value` to `op`. `NNInd` is the
    /// LD (a16),SP case: the pointed-to word, little endian.
    pub(crate) fn store16(
        &mut self,
        bus: &mut MemoryBus,
        op: Operand,
        value: u16,
    ) -> CoreResult<()> {
        match op {
            Operand::AF => self.set_af(value),
            Operand::BC => self.set_bc(value),
            Operand::DE => self.set_de(value),
            Operand::HL => self.set_hl(value),
            Operand::SP => self.sp = value,
            Operand::NNInd => {
                let addr = self.fetch16(bus);
                self.write8(bus, addr, (value & 0xFF) as u8);
                self.write8(bus, addr.wrapping_add(1), (value >> 8) as u8);
            }
            _ => {
                return Err(CoreError::OperandWidth {
                    op,
                    expected: "a 16-bit destination",
                });
            }
        }
        Ok(())
    }

    pub(crate) fn condition_met(&self, condition: Condition) -> bool {
        match condition {
            Condition::Always => true,
            Condition::Z => self.get_flag(super::constants::FLAG_Z),
            Condition::NZ => !self.get_flag(super::constants::FLAG_Z),
            Condition::C => self.get_flag(super::constants::FLAG_C),
            Condition::NC => !self.get_flag(super::constants::FLAG_C),
        }
    }
}
