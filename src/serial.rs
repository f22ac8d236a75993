// Serial port (SB/SC)
//
// A transfer is armed by setting SC bit 7. Once the selected clock divides
// the system counter, the byte in SB is captured into the output ring, SC
// bit 7 drops and the serial interrupt is requested. There is no link-cable
// peer; the ring is what hosts (and test ROMs) read back.

use crate::memory_bus::{IoReg, MemoryBus};
use crate::memory_map::SERIAL_INTERRUPT_BIT;

pub const SERIAL_RING_SIZE: usize = 255;

// T-cycle periods indexed by SC bits 1:0. Bit 0 really selects the internal
// vs external clock on hardware; treating both bits as a rate select is a
// knowing simplification.
const SERIAL_PERIODS: [u16; 4] = [512, 256, 16, 8];

/// Fixed-size ring of bytes captured by completed transfers.
#[derive(Debug, Clone)]
pub struct SerialRing {
    buffer: [u8; SERIAL_RING_SIZE],
    pos: u8,
    written: usize,
}

impl SerialRing {
    pub fn new() -> Self {
        SerialRing {
            buffer: [0; SERIAL_RING_SIZE],
            pos: 0,
            written: 0,
        }
    }

    pub fn push(&mut self, byte: u8) {
        self.buffer[self.pos as usize] = byte;
        self.pos = if self.pos as usize + 1 == SERIAL_RING_SIZE {
            0
        } else {
            self.pos + 1
        };
        self.written = self.written.saturating_add(1);
    }

    /// The captured bytes, oldest first until the ring wraps.
    pub fn contents(&self) -> &[u8] {
        &self.buffer[..self.written.min(SERIAL_RING_SIZE)]
    }
}

impl Default for SerialRing {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    /// Advances the serial port by one T-cycle.
    pub fn tick_serial(&mut self, sys_counter: u16) {
        let sc = self.read_reg(IoReg::Sc);
        if sc & 0x80 == 0 {
            return;
        }
        let period = SERIAL_PERIODS[(sc & 0x03) as usize];
        if sys_counter % period != 0 {
            return;
        }

        let sb = self.read_reg(IoReg::Sb);
        self.serial.push(sb);
        self.write_reg(IoReg::Sc, sc & 0x7F);
        self.request_interrupt(SERIAL_INTERRUPT_BIT);
    }
}
