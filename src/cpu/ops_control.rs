use super::Cpu;
use crate::cpu::Condition;
use crate::error::CoreResult;
use crate::memory_bus::MemoryBus;

// --- Control flow / machine control instruction bodies ---
impl Cpu {
    /// JP cc,a16. Taking the branch costs one internal cycle.
    pub(crate) fn jp(&mut self, bus: &mut MemoryBus, condition: Condition) -> CoreResult<()> {
        let addr = self.fetch16(bus);
        if self.condition_met(condition) {
            self.pc = addr;
            self.tick();
        }
        Ok(())
    }

    /// JP HL: no memory access beyond the opcode fetch.
    pub(crate) fn jp_hl(&mut self) {
        self.pc = self.get_hl();
    }

    /// JR cc,r8.
    pub(crate) fn jr(&mut self, bus: &mut MemoryBus, condition: Condition) -> CoreResult<()> {
        let offset = self.fetch8(bus) as i8;
        if self.condition_met(condition) {
            self.pc = self.pc.wrapping_add(offset as i16 as u16);
            self.tick();
        }
        Ok(())
    }

    /// CALL cc,a16. Taking the branch costs the push setup cycle plus the
    /// two stack writes.
    pub(crate) fn call(&mut self, bus: &mut MemoryBus, condition: Condition) -> CoreResult<()> {
        let addr = self.fetch16(bus);
        if self.condition_met(condition) {
            self.tick();
            self.push16(bus, self.pc);
            self.pc = addr;
        }
        Ok(())
    }

    /// RET / RET cc. The conditional forms spend an extra cycle on the
    /// condition check; any taken return spends one on loading PC.
    pub(crate) fn ret(&mut self, bus: &mut MemoryBus, condition: Condition) -> CoreResult<()> {
        if condition != Condition::Always {
            self.tick();
        }
        if self.condition_met(condition) {
            self.pc = self.pop16(bus);
            self.tick();
        }
        Ok(())
    }

    /// RETI: RET, then IME on.
    pub(crate) fn reti(&mut self, bus: &mut MemoryBus) -> CoreResult<()> {
        self.pc = self.pop16(bus);
        self.tick();
        self.ime = true;
        Ok(())
    }

    /// RST n: push PC, jump to the fixed vector.
    pub(crate) fn rst(&mut self, bus: &mut MemoryBus, vector: u16) {
        self.tick();
        self.push16(bus, self.pc);
        self.pc = vector;
    }

    pub(crate) fn di(&mut self) {
        self.ime = false;
    }

    pub(crate) fn ei(&mut self) {
        self.ime = true;
    }

    /// HALT: stop fetching until an enabled interrupt is requested.
    pub(crate) fn halt(&mut self) {
        self.halted = true;
    }

    /// STOP is encoded as 0x10 0x00; the pair is consumed and nothing else
    /// happens.
    pub(crate) fn stop(&mut self, bus: &mut MemoryBus) -> CoreResult<()> {
        let _ = self.fetch8(bus);
        log::warn!(
            "STOP executed at PC={:#06X}; low-power mode is not modeled",
            self.pc.wrapping_sub(2)
        );
        Ok(())
    }
}
