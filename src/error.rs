use thiserror::Error;

use crate::cpu::Operand;

// Type alias for fallible core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Fatal conditions raised by the emulator core.
///
/// Trace-sink I/O failures are deliberately absent: they are swallowed at the
/// call site so tracing can never perturb execution.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One of the eleven undefined primary opcodes was fetched.
    #[error("illegal opcode {opcode:#04X} at PC={pc:#06X}")]
    IllegalOpcode { opcode: u8, pc: u16 },

    /// A pair-only operand reached an 8-bit load/store or vice versa.
    /// This is a programmer error in the dispatch tables, not a ROM error.
    #[error("operand {op:?} cannot be resolved as {expected}")]
    OperandWidth {
        op: Operand,
        expected: &'static str,
    },

    /// The cartridge type byte names a mapper this core does not implement.
    #[error("unsupported cartridge type {code:#04X}")]
    UnsupportedCartridge { code: u8 },

    /// A header field holds a value outside its decode table.
    #[error("bad header field {field}: {value:#04X}")]
    BadHeader { field: &'static str, value: u8 },

    /// The ROM image ends before the header does.
    #[error("ROM image too small for a cartridge header: {len} bytes")]
    RomTooSmall { len: usize },
}
