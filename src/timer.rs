// Timer (DIV/TIMA/TMA/TAC)
//
// DIV  (0xFF04): increments every 256 T-cycles.
// TIMA (0xFF05): increments at the TAC-selected rate while TAC bit 2 is set;
//                on overflow it reloads from TMA and requests the timer
//                interrupt.
// TMA  (0xFF06): reload value.
// TAC  (0xFF07): bit 2 enable, bits 1:0 clock select.
//
// Rates are applied as divisors of the system T-cycle counter; the hardware's
// falling-edge counter model (and the DIV-write reset quirk) is not emulated.

use crate::memory_bus::{IoReg, MemoryBus};
use crate::memory_map::TIMER_INTERRUPT_BIT;

const DIV_PERIOD: u16 = 256;

// T-cycle periods indexed by TAC bits 1:0.
const TIMA_PERIODS: [u16; 4] = [1024, 16, 64, 256];

impl MemoryBus {
    /// Advances the timer by one T-cycle.
    pub fn tick_timer(&mut self, sys_counter: u16) {
        if sys_counter % DIV_PERIOD == 0 {
            let div = self.read_reg(IoReg::Div);
            self.write_reg(IoReg::Div, div.wrapping_add(1));
        }

        let tac = self.read_reg(IoReg::Tac);
        if tac & 0x04 == 0 {
            return;
        }
        let period = TIMA_PERIODS[(tac & 0x03) as usize];
        if sys_counter % period != 0 {
            return;
        }

        let (tima, overflow) = self.read_reg(IoReg::Tima).overflowing_add(1);
        if overflow {
            let tma = self.read_reg(IoReg::Tma);
            self.write_reg(IoReg::Tima, tma);
            self.request_interrupt(TIMER_INTERRUPT_BIT);
        } else {
            self.write_reg(IoReg::Tima, tima);
        }
    }
}
