use super::{Cpu, alu, constants::*};
use crate::cpu::Operand;
use crate::error::CoreResult;
use crate::memory_bus::MemoryBus;

// --- Arithmetic / logic instruction bodies ---
impl Cpu {
    /// ADD A,src / ADC A,src. ADC runs as two chained 8-bit adds; carry and
    /// half are the OR of both stages.
    pub(crate) fn add_a(
        &mut self,
        bus: &mut MemoryBus,
        src: Operand,
        with_carry: bool,
    ) -> CoreResult<()> {
        let value = self.load8(bus, src)?;
        let carry_in = (with_carry && self.get_flag(FLAG_C)) as u8;
        let (partial, c1, h1) = alu::add8(self.a, value);
        let (result, c2, h2) = alu::add8(partial, carry_in);
        self.a = result;
        self.set_flag(FLAG_Z, result == 0);
        self.set_flag(FLAG_N, false);
        self.set_flag(FLAG_H, h1 || h2);
        self.set_flag(FLAG_C, c1 || c2);
        Ok(())
    }

    /// SUB A,src / SBC A,src, same two-stage shape as `add_a`.
    pub(crate) fn sub_a(
        &mut self,
        bus: &mut MemoryBus,
        src: Operand,
        with_carry: bool,
    ) -> CoreResult<()> {
        let value = self.load8(bus, src)?;
        self.a = self.sub_core(value, with_carry);
        Ok(())
    }

    /// CP A,src: SUB flags without the writeback.
    pub(crate) fn cp_a(&mut self, bus: &mut MemoryBus, src: Operand) -> CoreResult<()> {
        let value = self.load8(bus, src)?;
        self.sub_core(value, false);
        Ok(())
    }

    fn sub_core(&mut self, value: u8, with_carry: bool) -> u8 {
        let carry_in = (with_carry && self.get_flag(FLAG_C)) as u8;
        let (partial, c1, h1) = alu::sub8(self.a, value);
        let (result, c2, h2) = alu::sub8(partial, carry_in);
        self.set_flag(FLAG_Z, result == 0);
        self.set_flag(FLAG_N, true);
        self.set_flag(FLAG_H, h1 || h2);
        self.set_flag(FLAG_C, c1 || c2);
        result
    }

    pub(crate) fn and_a(&mut self, bus: &mut MemoryBus, src: Operand) -> CoreResult<()> {
        self.a &= self.load8(bus, src)?;
        self.set_flag(FLAG_Z, self.a == 0);
        self.set_flag(FLAG_N, false);
        self.set_flag(FLAG_H, true);
        self.set_flag(FLAG_C, false);
        Ok(())
    }

    pub(crate) fn xor_a(&mut self, bus: &mut MemoryBus, src: Operand) -> CoreResult<()> {
        self.a ^= self.load8(bus, src)?;
        self.set_flag(FLAG_Z, self.a == 0);
        self.set_flag(FLAG_N | FLAG_H | FLAG_C, false);
        Ok(())
    }

    pub(crate) fn or_a(&mut self, bus: &mut MemoryBus, src: Operand) -> CoreResult<()> {
        self.a |= self.load8(bus, src)?;
        self.set_flag(FLAG_Z, self.a == 0);
        self.set_flag(FLAG_N | FLAG_H | FLAG_C, false);
        Ok(())
    }

    /// INC op8: C is untouched.
    pub(crate) fn inc8(&mut self, bus: &mut MemoryBus, op: Operand) -> CoreResult<()> {
        let value = self.load8(bus, op)?;
        let (result, _, half) = alu::add8(value, 1);
        self.set_flag(FLAG_Z, result == 0);
        self.set_flag(FLAG_N, false);
        self.set_flag(FLAG_H, half);
        self.store8(bus, op, result)
    }

    /// DEC op8: C is untouched.
    pub(crate) fn dec8(&mut self, bus: &mut MemoryBus, op: Operand) -> CoreResult<()> {
        let value = self.load8(bus, op)?;
        let (result, _, half) = alu::sub8(value, 1);
        self.set_flag(FLAG_Z, result == 0);
        self.set_flag(FLAG_N, true);
        self.set_flag(FLAG_H, half);
        self.store8(bus, op, result)
    }

    /// INC op16: no flags, one internal cycle.
    pub(crate) fn inc16(&mut self, bus: &mut MemoryBus, op: Operand) -> CoreResult<()> {
        let value = self.load16(bus, op)?;
        self.store16(bus, op, value.wrapping_add(1))?;
        self.tick();
        Ok(())
    }

    /// DEC op16: no flags, one internal cycle.
    pub(crate) fn dec16(&mut self, bus: &mut MemoryBus, op: Operand) -> CoreResult<()> {
        let value = self.load16(bus, op)?;
        self.store16(bus, op, value.wrapping_sub(1))?;
        self.tick();
        Ok(())
    }

    /// ADD HL,op16: Z untouched, H/C from bits 11/15, one internal cycle.
    pub(crate) fn add_hl(&mut self, bus: &mut MemoryBus, op: Operand) -> CoreResult<()> {
        let value = self.load16(bus, op)?;
        let (result, carry, half) = alu::add16(self.get_hl(), value);
        self.set_hl(result);
        self.set_flag(FLAG_N, false);
        self.set_flag(FLAG_H, half);
        self.set_flag(FLAG_C, carry);
        self.tick();
        Ok(())
    }

    /// ADD SP,r8: flags from the low-byte add, two internal cycles.
    pub(crate) fn add_sp(&mut self, bus: &mut MemoryBus) -> CoreResult<()> {
        let offset = self.fetch8(bus);
        let (result, carry, half) = alu::add16_signed8(self.sp, offset);
        self.sp = result;
        self.set_flag(FLAG_Z, false);
        self.set_flag(FLAG_N, false);
        self.set_flag(FLAG_H, half);
        self.set_flag(FLAG_C, carry);
        self.tick();
        self.tick();
        Ok(())
    }

    /// DAA: decimal-adjust A after a BCD add or subtract.
    pub(crate) fn daa(&mut self) {
        let mut adjustment = 0u8;
        let mut set_carry = false;
        if !self.get_flag(FLAG_N) {
            if self.get_flag(FLAG_C) || self.a > 0x99 {
                adjustment |= 0x60;
                set_carry = true;
            }
            if self.get_flag(FLAG_H) || (self.a & 0x0F) > 0x09 {
                adjustment |= 0x06;
            }
            self.a = self.a.wrapping_add(adjustment);
        } else {
            if self.get_flag(FLAG_C) {
                adjustment |= 0x60;
                set_carry = true;
            }
            if self.get_flag(FLAG_H) {
                adjustment |= 0x06;
            }
            self.a = self.a.wrapping_sub(adjustment);
        }
        self.set_flag(FLAG_Z, self.a == 0);
        self.set_flag(FLAG_H, false);
        self.set_flag(FLAG_C, set_carry);
    }

    pub(crate) fn cpl(&mut self) {
        self.a = !self.a;
        self.set_flag(FLAG_N | FLAG_H, true);
    }

    pub(crate) fn scf(&mut self) {
        self.set_flag(FLAG_N | FLAG_H, false);
        self.set_flag(FLAG_C, true);
    }

    pub(crate) fn ccf(&mut self) {
        let carry = self.get_flag(FLAG_C);
        self.set_flag(FLAG_N | FLAG_H, false);
        self.set_flag(FLAG_C, !carry);
    }
}
