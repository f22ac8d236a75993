// Cartridge header
//
// The header occupies 0x0100-0x014F of the ROM image:
//
// 0x0100-0x0103: Entry point (usually NOP + JP)
// 0x0104-0x0133: Nintendo logo
// 0x0134-0x0143: Title (uppercase ASCII)
// 0x013F-0x0142: Manufacturer code (newer carts, carved out of the title)
// 0x0143: CGB flag
// 0x0144-0x0145: New licensee code
// 0x0146: SGB flag
// 0x0147: Cartridge type (MBC type)
// 0x0148: ROM size
// 0x0149: RAM size
// 0x014A: Destination code
// 0x014B: Old licensee code
// 0x014C: Mask ROM version
// 0x014D: Header checksum
// 0x014E-0x014F: Global checksum (big-endian)

use crate::error::{CoreError, CoreResult};

/// Cartridge types (MBC - Memory Bank Controller)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeType {
    RomOnly,
    Mbc1,
    Mbc1Ram,
    Mbc1RamBattery,
    Mbc2,
    Mbc2Battery,
    RomRam,
    RomRamBattery,
    Mbc3TimerBattery,
    Mbc3TimerRamBattery,
    Mbc3,
    Mbc3Ram,
    Mbc3RamBattery,
    Mbc5,
    Mbc5Ram,
    Mbc5RamBattery,
    Unknown(u8),
}

impl From<u8> for CartridgeType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => CartridgeType::RomOnly,
            0x01 => CartridgeType::Mbc1,
            0x02 => CartridgeType::Mbc1Ram,
            0x03 => CartridgeType::Mbc1RamBattery,
            0x05 => CartridgeType::Mbc2,
            0x06 => CartridgeType::Mbc2Battery,
            0x08 => CartridgeType::RomRam,
            0x09 => CartridgeType::RomRamBattery,
            0x0F => CartridgeType::Mbc3TimerBattery,
            0x10 => CartridgeType::Mbc3TimerRamBattery,
            0x11 => CartridgeType::Mbc3,
            0x12 => CartridgeType::Mbc3Ram,
            0x13 => CartridgeType::Mbc3RamBattery,
            0x19 => CartridgeType::Mbc5,
            0x1A => CartridgeType::Mbc5Ram,
            0x1B => CartridgeType::Mbc5RamBattery,
            _ => CartridgeType::Unknown(value),
        }
    }
}

impl CartridgeType {
    /// Raw header byte this variant decodes from.
    pub fn code(&self) -> u8 {
        match self {
            CartridgeType::RomOnly => 0x00,
            CartridgeType::Mbc1 => 0x01,
            CartridgeType::Mbc1Ram => 0x02,
            CartridgeType::Mbc1RamBattery => 0x03,
            CartridgeType::Mbc2 => 0x05,
            CartridgeType::Mbc2Battery => 0x06,
            CartridgeType::RomRam => 0x08,
            CartridgeType::RomRamBattery => 0x09,
            CartridgeType::Mbc3TimerBattery => 0x0F,
            CartridgeType::Mbc3TimerRamBattery => 0x10,
            CartridgeType::Mbc3 => 0x11,
            CartridgeType::Mbc3Ram => 0x12,
            CartridgeType::Mbc3RamBattery => 0x13,
            CartridgeType::Mbc5 => 0x19,
            CartridgeType::Mbc5Ram => 0x1A,
            CartridgeType::Mbc5RamBattery => 0x1B,
            CartridgeType::Unknown(code) => *code,
        }
    }

    pub fn has_ram(&self) -> bool {
        matches!(
            self,
            CartridgeType::Mbc1Ram
                | CartridgeType::Mbc1RamBattery
                | CartridgeType::RomRam
                | CartridgeType::RomRamBattery
                | CartridgeType::Mbc3TimerRamBattery
                | CartridgeType::Mbc3Ram
                | CartridgeType::Mbc3RamBattery
                | CartridgeType::Mbc5Ram
                | CartridgeType::Mbc5RamBattery
        )
    }

    pub fn has_battery(&self) -> bool {
        matches!(
            self,
            CartridgeType::Mbc1RamBattery
                | CartridgeType::Mbc2Battery
                | CartridgeType::RomRamBattery
                | CartridgeType::Mbc3TimerBattery
                | CartridgeType::Mbc3TimerRamBattery
                | CartridgeType::Mbc3RamBattery
                | CartridgeType::Mbc5RamBattery
        )
    }
}

/// Typed view of the cartridge header bytes.
#[derive(Debug, Clone)]
pub struct Header {
    pub title: String,
    pub manufacturer: String,
    pub cgb_flag: u8,
    pub new_licensee: [u8; 2],
    pub sgb_flag: u8,
    pub cartridge_type: CartridgeType,
    /// Decoded ROM size in bytes (32 KiB << n).
    pub rom_size: usize,
    /// Decoded external RAM size in bytes.
    pub ram_size: usize,
    pub destination: u8,
    pub old_licensee: u8,
    pub version: u8,
    pub header_checksum: u8,
    pub checksum_valid: bool,
    pub global_checksum: u16,
}

impl Header {
    /// Decodes the header out of a ROM image.
    pub fn parse(rom: &[u8]) -> CoreResult<Header> {
        if rom.len() < 0x150 {
            return Err(CoreError::RomTooSmall { len: rom.len() });
        }

        let title = rom[0x0134..=0x0143]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect::<String>();
        let manufacturer = rom[0x013F..=0x0142]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect::<String>();

        let cartridge_type = CartridgeType::from(rom[0x0147]);

        let rom_size = match rom[0x0148] {
            n @ 0x00..=0x08 => (32 * 1024) << n,
            value => {
                return Err(CoreError::BadHeader {
                    field: "ROM size",
                    value,
                });
            }
        };

        let ram_size = match rom[0x0149] {
            0x00 | 0x01 => 0,
            0x02 => 8 * 1024,
            0x03 => 32 * 1024,
            0x04 => 128 * 1024,
            0x05 => 64 * 1024,
            value => {
                return Err(CoreError::BadHeader {
                    field: "RAM size",
                    value,
                });
            }
        };

        // x = 0; for i in 0x0134..=0x014C: x = x - rom[i] - 1
        let mut checksum: u8 = 0;
        for &byte in &rom[0x0134..=0x014C] {
            checksum = checksum.wrapping_sub(byte).wrapping_sub(1);
        }
        let header_checksum = rom[0x014D];
        let checksum_valid = checksum == header_checksum;

        let header = Header {
            title,
            manufacturer,
            cgb_flag: rom[0x0143],
            new_licensee: [rom[0x0144], rom[0x0145]],
            sgb_flag: rom[0x0146],
            cartridge_type,
            rom_size,
            ram_size,
            destination: rom[0x014A],
            old_licensee: rom[0x014B],
            version: rom[0x014C],
            header_checksum,
            checksum_valid,
            global_checksum: u16::from_be_bytes([rom[0x014E], rom[0x014F]]),
        };

        log::info!(
            "Cartridge: \"{}\" type {:?} ({:#04X}), ROM {} KiB, RAM {} KiB, checksum {}",
            header.title,
            header.cartridge_type,
            header.cartridge_type.code(),
            header.rom_size / 1024,
            header.ram_size / 1024,
            if header.checksum_valid { "ok" } else { "BAD" },
        );

        Ok(header)
    }
}
