// Emulator facade
//
// Ties the CPU and the bus together and offers the run helpers hosts use.
// The step loop is driven externally; nothing here owns a clock.

use crate::cartridge::Header;
use crate::cpu::Cpu;
use crate::error::CoreResult;
use crate::memory_bus::MemoryBus;
use crate::trace::TraceSink;

pub struct Emulator {
    pub cpu: Cpu,
    pub bus: MemoryBus,
    pub header: Header,
    /// Total M-cycles executed
    pub cycles: u64,
}

impl Emulator {
    /// Builds an emulator from a raw ROM image.
    pub fn new(rom: &[u8]) -> CoreResult<Self> {
        let header = Header::parse(rom)?;
        let bus = MemoryBus::new(&header, rom)?;
        Ok(Emulator {
            cpu: Cpu::new(),
            bus,
            header,
            cycles: 0,
        })
    }

    /// Executes one instruction; returns its M-cycle cost.
    pub fn step(&mut self) -> CoreResult<u16> {
        let m_cycles = self.cpu.step(&mut self.bus)?;
        self.cycles += m_cycles as u64;
        Ok(m_cycles)
    }

    /// Executes a fixed number of instructions.
    pub fn run_steps(&mut self, steps: u64) -> CoreResult<()> {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    /// Runs until the CPU halts or the M-cycle budget runs out. Returns
    /// whether the CPU is halted.
    pub fn run_until_halt(&mut self, max_m_cycles: u64) -> CoreResult<bool> {
        while !self.cpu.halted() && self.cycles < max_m_cycles {
            self.step()?;
        }
        Ok(self.cpu.halted())
    }

    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.cpu.set_trace_sink(sink);
    }

    /// Text captured from completed serial transfers.
    pub fn serial_output(&self) -> String {
        self.bus.serial_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_program(program: &[u8]) -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
        rom
    }

    #[test]
    fn fresh_emulator_is_at_the_entry_point() {
        let rom = rom_with_program(&[]);
        let emulator = Emulator::new(&rom).unwrap();
        assert_eq!(emulator.cpu.pc(), 0x0100);
        assert_eq!(emulator.cpu.sp(), 0xFFFE);
        assert_eq!(emulator.cycles, 0);
    }

    #[test]
    fn halt_stops_the_run_helper() {
        let rom = rom_with_program(&[0x00, 0x00, 0x76]);
        let mut emulator = Emulator::new(&rom).unwrap();
        assert!(emulator.run_until_halt(10_000).unwrap());
        assert_eq!(emulator.cpu.pc(), 0x0103);
    }

    #[test]
    fn serial_bytes_surface_as_text() {
        // Send 'H' then 'i' over the link port, spinning on SC bit 7
        // between the transfers, then halt.
        let send = |byte: u8| {
            [
                0x3E, byte, // LD A, byte
                0xE0, 0x01, // LDH (SB), A
                0x3E, 0x81, // LD A, 0x81
                0xE0, 0x02, // LDH (SC), A
                // wait: LDH A,(SC); BIT 7,A; JR NZ, wait
                0xF0, 0x02, 0xCB, 0x7F, 0x20, 0xFA,
            ]
        };
        let mut program = Vec::new();
        program.extend_from_slice(&send(b'H'));
        program.extend_from_slice(&send(b'i'));
        program.push(0x76); // HALT

        let rom = rom_with_program(&program);
        let mut emulator = Emulator::new(&rom).unwrap();
        assert!(emulator.run_until_halt(100_000).unwrap());
        assert_eq!(emulator.serial_output(), "Hi");
    }
}
