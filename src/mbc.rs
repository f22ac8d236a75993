// Cartridge mapper
//
// Held by value inside the bus and dispatched with an exhaustive match, so
// the hot read path stays free of v-table indirection. MBC2/3/5 would slot
// in as further variants.

use crate::cartridge::{CartridgeType, Header};
use crate::error::{CoreError, CoreResult};
use crate::memory_map::{EXT_RAM_START, ROM_BANK_N_START};

/// MBC1 register file plus the offsets derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mbc1 {
    /// Lower 5 bits of the ROM bank number. Never 0: writes of 0 select 1.
    rom_bank_lo: u8,
    /// Upper 2 bits of the ROM bank number (or the RAM bank in mode 1).
    rom_bank_hi: u8,
    /// Byte offset of the switchable ROM window, derived from the bank bits.
    rom_offset: usize,
    /// Byte offset of the external RAM window. Non-zero only in mode 1.
    ram_offset: usize,
    ram_enabled: bool,
    banking_mode: bool,
}

impl Mbc1 {
    fn new() -> Self {
        let mut mbc = Mbc1 {
            rom_bank_lo: 1,
            rom_bank_hi: 0,
            rom_offset: 0,
            ram_offset: 0,
            ram_enabled: false,
            banking_mode: false,
        };
        mbc.update_offsets();
        mbc
    }

    fn update_offsets(&mut self) {
        self.rom_offset =
            ((self.rom_bank_hi as usize) << 19) | ((self.rom_bank_lo as usize) << 14);
        self.ram_offset = if self.banking_mode {
            (self.rom_bank_hi as usize) << 13
        } else {
            0
        };
    }
}

/// The mapper sitting between the bus and the cartridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapper {
    /// Plain 32 KiB ROM, optionally with un-banked RAM (types 0x00/0x08/0x09).
    None,
    Mbc1(Mbc1),
}

impl Mapper {
    /// Selects the mapper for a parsed header.
    pub fn from_header(header: &Header) -> CoreResult<Mapper> {
        match header.cartridge_type {
            CartridgeType::RomOnly | CartridgeType::RomRam | CartridgeType::RomRamBattery => {
                Ok(Mapper::None)
            }
            CartridgeType::Mbc1 | CartridgeType::Mbc1Ram | CartridgeType::Mbc1RamBattery => {
                Ok(Mapper::Mbc1(Mbc1::new()))
            }
            other => Err(CoreError::UnsupportedCartridge { code: other.code() }),
        }
    }

    /// Read from the cartridge ROM area (0x0000-0x7FFF).
    pub fn read_rom(&self, rom: &[u8], addr: u16) -> u8 {
        let index = match self {
            Mapper::None => addr as usize,
            Mapper::Mbc1(mbc) => {
                if addr < ROM_BANK_N_START {
                    addr as usize
                } else {
                    mbc.rom_offset | (addr - ROM_BANK_N_START) as usize
                }
            }
        };
        // Banks past the end of the image read as open bus.
        rom.get(index).copied().unwrap_or(0xFF)
    }

    /// Read from the external RAM window (0xA000-0xBFFF).
    pub fn read_ram(&self, ram: &[u8], addr: u16) -> u8 {
        match self {
            Mapper::None => ram.get((addr - EXT_RAM_START) as usize).copied().unwrap_or(0xFF),
            Mapper::Mbc1(mbc) => {
                if !mbc.ram_enabled {
                    return 0xFF;
                }
                let index = mbc.ram_offset | (addr - EXT_RAM_START) as usize;
                ram.get(index).copied().unwrap_or(0xFF)
            }
        }
    }

    /// Write to the external RAM window (0xA000-0xBFFF).
    pub fn write_ram(&self, ram: &mut [u8], addr: u16, value: u8) {
        match self {
            Mapper::None => {
                let index = (addr - EXT_RAM_START) as usize;
                if let Some(slot) = ram.get_mut(index) {
                    *slot = value;
                }
            }
            Mapper::Mbc1(mbc) => {
                if !mbc.ram_enabled {
                    return;
                }
                let index = mbc.ram_offset | (addr - EXT_RAM_START) as usize;
                if let Some(slot) = ram.get_mut(index) {
                    *slot = value;
                }
            }
        }
    }

    /// Write to the mapper control area (0x0000-0x7FFF).
    pub fn write_control(&mut self, addr: u16, value: u8) {
        let Mapper::Mbc1(mbc) = self else {
            return;
        };
        match addr {
            0x0000..=0x1FFF => {
                mbc.ram_enabled = (value & 0x0F) == 0x0A;
            }
            0x2000..=0x3FFF => {
                let bank_lo = value & 0x1F;
                mbc.rom_bank_lo = if bank_lo == 0 { 1 } else { bank_lo };
                mbc.update_offsets();
            }
            0x4000..=0x5FFF => {
                mbc.rom_bank_hi = value & 0x03;
                mbc.update_offsets();
            }
            0x6000..=0x7FFF => {
                mbc.banking_mode = value != 0;
                mbc.update_offsets();
            }
            _ => unreachable!("mapper control write outside ROM area: {addr:#06X}"),
        }
    }
}
