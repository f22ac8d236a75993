// Garnet - a Game Boy (DMG) emulator core
//
// The SM83 interpreter, the memory bus with an MBC1 cartridge mapper, and
// the timer/serial/interrupt plumbing driven off the CPU clock. Rendering,
// audio and input are out of scope: their registers exist as plain bytes.

pub mod cartridge;
pub mod cpu;
pub mod emulator;
pub mod error;
pub mod mbc;
pub mod memory_bus;
pub mod memory_map;
pub mod serial;
pub mod timer;
pub mod trace;

pub use cartridge::{CartridgeType, Header};
pub use cpu::Cpu;
pub use emulator::Emulator;
pub use error::{CoreError, CoreResult};
pub use mbc::Mapper;
pub use memory_bus::{IoReg, MemoryBus};
pub use trace::TraceSink;
