use super::{Cpu, alu, constants::*};
use crate::cpu::Operand;
use crate::error::CoreResult;
use crate::memory_bus::MemoryBus;

// --- Load / store / stack instruction bodies ---
impl Cpu {
    /// The whole LD family in one body: cycle cost falls out of the operand
    /// resolution (immediates and pointers tick, registers don't).
    pub(crate) fn ld8(&mut self, bus: &mut MemoryBus, dst: Operand, src: Operand) -> CoreResult<()> {
        let value = self.load8(bus, src)?;
        self.store8(bus, dst, value)
    }

    /// LD rr,d16 and LD (a16),SP.
    pub(crate) fn ld16(
        &mut self,
        bus: &mut MemoryBus,
        dst: Operand,
        src: Operand,
    ) -> CoreResult<()> {
        let value = self.load16(bus, src)?;
        self.store16(bus, dst, value)
    }

    /// LD SP,HL: register copy plus one internal cycle.
    pub(crate) fn ld_sp_hl(&mut self) {
        self.sp = self.get_hl();
        self.tick();
    }

    /// LD HL,SP+r8: flags from the low-byte add, Z forced clear, one
    /// internal cycle.
    pub(crate) fn ld_hl_sp_r8(&mut self, bus: &mut MemoryBus) -> CoreResult<()> {
        let offset = self.fetch8(bus);
        let (result, carry, half) = alu::add16_signed8(self.sp, offset);
        self.set_hl(result);
        self.set_flag(FLAG_Z, false);
        self.set_flag(FLAG_N, false);
        self.set_flag(FLAG_H, half);
        self.set_flag(FLAG_C, carry);
        self.tick();
        Ok(())
    }

    /// PUSH rr: one internal cycle before the two stack writes.
    pub(crate) fn push_op(&mut self, bus: &mut MemoryBus, src: Operand) -> CoreResult<()> {
        let value = self.load16(bus, src)?;
        self.tick();
        self.push16(bus, value);
        Ok(())
    }

    /// POP rr. Popping into AF clears the low nibble of F on the way in.
    pub(crate) fn pop_op(&mut self, bus: &mut MemoryBus, dst: Operand) -> CoreResult<()> {
        let value = self.pop16(bus);
        self.store16(bus, dst, value)
    }
}
