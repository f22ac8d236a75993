use crate::cartridge::Header;
use crate::error::CoreResult;
use crate::mbc::Mapper;
use crate::memory_map::*;
use crate::serial::SerialRing;
use std::fmt;

/// The Game Boy's 16-bit address space: internal regions plus the cartridge
/// mapper for ROM (0x0000-0x7FFF) and external RAM (0xA000-0xBFFF).
#[derive(Clone)]
pub struct MemoryBus {
    // Core Memory Areas
    vram: Box<[u8; VRAM_SIZE]>,
    wram_bank_0: Box<[u8; WRAM_BANK_0_SIZE]>,
    wram_bank_n: Box<[u8; WRAM_BANK_N_SIZE]>, // Always Bank 1 on DMG
    oam: Box<[u8; OAM_SIZE]>,
    io_registers: Box<[u8; IO_REGISTERS_SIZE]>,
    hram: Box<[u8; HRAM_SIZE]>,
    interrupt_enable: u8, // FFFF (IE Register)

    // Cartridge Data & State
    rom: Vec<u8>,
    ext_ram: Vec<u8>,
    mapper: Mapper,

    // Serial peripheral output ring
    pub(crate) serial: SerialRing,
}

impl MemoryBus {
    /// Builds the bus for a parsed header, copying in the ROM image and
    /// sizing external RAM from the header's RAM-size code.
    pub fn new(header: &Header, rom: &[u8]) -> CoreResult<Self> {
        // I/O register state after the boot ROM finishes (Pandocs power-up
        // sequence); the PPU/APU registers are plain bytes here.
        let mut io_regs = [0u8; IO_REGISTERS_SIZE];
        let mut set = |addr: u16, value: u8| io_regs[(addr - IO_REGISTERS_START) as usize] = value;
        set(SB_ADDR, 0x00);
        set(SC_ADDR, 0x7E);
        set(DIV_ADDR, 0xAC);
        set(TIMA_ADDR, 0x00);
        set(TMA_ADDR, 0x00);
        set(TAC_ADDR, 0x00);
        set(IF_ADDR, 0xE1);
        set(NR10_ADDR, 0x80);
        set(NR11_ADDR, 0xBF);
        set(NR12_ADDR, 0xF3);
        set(NR14_ADDR, 0xBF);
        set(NR21_ADDR, 0x3F);
        set(NR24_ADDR, 0xBF);
        set(NR30_ADDR, 0x7F);
        set(NR31_ADDR, 0xFF);
        set(NR32_ADDR, 0x9F);
        set(NR34_ADDR, 0xBF);
        set(NR41_ADDR, 0xFF);
        set(NR44_ADDR, 0xBF);
        set(NR50_ADDR, 0x77);
        set(NR51_ADDR, 0xF3);
        set(NR52_ADDR, 0xF1);
        set(LCDC_ADDR, 0x91);
        set(STAT_ADDR, 0x85);
        set(DMA_ADDR, 0xFF);
        set(BGP_ADDR, 0xFC);
        set(OBP0_ADDR, 0xFF);
        set(OBP1_ADDR, 0xFF);

        Ok(MemoryBus {
            vram: Box::new([0; VRAM_SIZE]),
            wram_bank_0: Box::new([0; WRAM_BANK_0_SIZE]),
            wram_bank_n: Box::new([0; WRAM_BANK_N_SIZE]),
            oam: Box::new([0; OAM_SIZE]),
            io_registers: Box::new(io_regs),
            hram: Box::new([0; HRAM_SIZE]),
            interrupt_enable: 0x00,

            rom: rom.to_vec(),
            ext_ram: vec![0u8; header.ram_size],
            mapper: Mapper::from_header(header)?,

            serial: SerialRing::new(),
        })
    }

    /// Sets the corresponding interrupt request bit (0-4) in IF (0xFF0F).
    pub fn request_interrupt(&mut self, bit: u8) {
        if bit < 5 {
            let offset = (IF_ADDR - IO_REGISTERS_START) as usize;
            self.io_registers[offset] |= 1 << bit;
        }
    }

    // --- Read/Write ---

    pub fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            // Cartridge ROM (fixed bank + switchable bank)
            ROM_BANK_0_START..=ROM_BANK_N_END => self.mapper.read_rom(&self.rom, addr),
            // Video RAM
            VRAM_START..=VRAM_END => self.vram[(addr - VRAM_START) as usize],
            // External RAM, gated and windowed by the mapper
            EXT_RAM_START..=EXT_RAM_END => self.mapper.read_ram(&self.ext_ram, addr),
            // Work RAM
            WRAM_BANK_0_START..=WRAM_BANK_0_END => {
                self.wram_bank_0[(addr - WRAM_BANK_0_START) as usize]
            }
            WRAM_BANK_N_START..=WRAM_BANK_N_END => {
                self.wram_bank_n[(addr - WRAM_BANK_N_START) as usize]
            }
            // Echo RAM mirrors C000-DDFF
            ECHO_RAM_START..=ECHO_RAM_END => self.read_byte(addr - 0x2000),
            OAM_START..=OAM_END => self.oam[(addr - OAM_START) as usize],
            NOT_USABLE_START..=NOT_USABLE_END => 0xFF,
            IO_REGISTERS_START..=IO_REGISTERS_END => {
                self.io_registers[(addr - IO_REGISTERS_START) as usize]
            }
            HRAM_START..=HRAM_END => self.hram[(addr - HRAM_START) as usize],
            INTERRUPT_ENABLE_REGISTER => self.interrupt_enable,
        }
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) {
        match addr {
            // Mapper control registers live under the ROM area
            ROM_BANK_0_START..=ROM_BANK_N_END => self.mapper.write_control(addr, value),
            VRAM_START..=VRAM_END => self.vram[(addr - VRAM_START) as usize] = value,
            EXT_RAM_START..=EXT_RAM_END => {
                self.mapper.write_ram(&mut self.ext_ram, addr, value);
            }
            WRAM_BANK_0_START..=WRAM_BANK_0_END => {
                self.wram_bank_0[(addr - WRAM_BANK_0_START) as usize] = value;
            }
            WRAM_BANK_N_START..=WRAM_BANK_N_END => {
                self.wram_bank_n[(addr - WRAM_BANK_N_START) as usize] = value;
            }
            ECHO_RAM_START..=ECHO_RAM_END => self.write_byte(addr - 0x2000, value),
            OAM_START..=OAM_END => self.oam[(addr - OAM_START) as usize] = value,
            NOT_USABLE_START..=NOT_USABLE_END => { /* Write Ignored */ }
            IO_REGISTERS_START..=IO_REGISTERS_END => {
                self.io_registers[(addr - IO_REGISTERS_START) as usize] = value;
                if addr == DMA_ADDR {
                    self.perform_dma_transfer(value);
                }
            }
            HRAM_START..=HRAM_END => self.hram[(addr - HRAM_START) as usize] = value,
            INTERRUPT_ENABLE_REGISTER => self.interrupt_enable = value,
        }
    }

    /// Reads a 16-bit word (Little Endian).
    pub fn read_word(&self, addr: u16) -> u16 {
        let low = self.read_byte(addr) as u16;
        let high = self.read_byte(addr.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    /// Writes a 16-bit word (Little Endian).
    pub fn write_word(&mut self, addr: u16, value: u16) {
        self.write_byte(addr, (value & 0xFF) as u8);
        self.write_byte(addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// Performs an OAM DMA transfer: copies 160 bytes from `page << 8` into
    /// OAM. The copy is instantaneous; the 160 M-cycle bus lockout is not
    /// modeled yet (a `dma_active_until` counter would slot in here).
    fn perform_dma_transfer(&mut self, page: u8) {
        let source = (page as u16) << 8;
        if source >= OAM_START {
            log::warn!("OAM DMA requested from restricted area {source:#06X}, ignored");
            return;
        }
        for i in 0..OAM_SIZE as u16 {
            let byte = self.read_byte(source + i);
            self.oam[i as usize] = byte;
        }
    }

    /// Bytes captured by completed serial transfers, as lossy text.
    pub fn serial_text(&self) -> String {
        String::from_utf8_lossy(self.serial.contents()).to_string()
    }
}

/// Named handles for the fixed I/O addresses; sugar over `read_byte` /
/// `write_byte` so callers don't sprinkle raw addresses around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoReg {
    Joyp,
    Sb,
    Sc,
    Div,
    Tima,
    Tma,
    Tac,
    If,
    Lcdc,
    Stat,
    Scy,
    Scx,
    Ly,
    Lyc,
    Dma,
    Bgp,
    Obp0,
    Obp1,
    Wy,
    Wx,
    Ie,
}

impl IoReg {
    pub fn addr(self) -> u16 {
        match self {
            IoReg::Joyp => P1_JOYP_ADDR,
            IoReg::Sb => SB_ADDR,
            IoReg::Sc => SC_ADDR,
            IoReg::Div => DIV_ADDR,
            IoReg::Tima => TIMA_ADDR,
            IoReg::Tma => TMA_ADDR,
            IoReg::Tac => TAC_ADDR,
            IoReg::If => IF_ADDR,
            IoReg::Lcdc => LCDC_ADDR,
            IoReg::Stat => STAT_ADDR,
            IoReg::Scy => SCY_ADDR,
            IoReg::Scx => SCX_ADDR,
            IoReg::Ly => LY_ADDR,
            IoReg::Lyc => LYC_ADDR,
            IoReg::Dma => DMA_ADDR,
            IoReg::Bgp => BGP_ADDR,
            IoReg::Obp0 => OBP0_ADDR,
            IoReg::Obp1 => OBP1_ADDR,
            IoReg::Wy => WY_ADDR,
            IoReg::Wx => WX_ADDR,
            IoReg::Ie => INTERRUPT_ENABLE_REGISTER,
        }
    }
}

impl MemoryBus {
    #[inline(always)]
    pub fn read_reg(&self, reg: IoReg) -> u8 {
        self.read_byte(reg.addr())
    }

    #[inline(always)]
    pub fn write_reg(&mut self, reg: IoReg, value: u8) {
        self.write_byte(reg.addr(), value);
    }
}

impl fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBus")
            .field("mapper", &self.mapper)
            .field("rom_len", &self.rom.len())
            .field("ext_ram_len", &self.ext_ram.len())
            .field("IE", &format_args!("{:#04X}", self.interrupt_enable))
            .field("IF", &format_args!("{:#04X}", self.read_reg(IoReg::If)))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Header;

    fn test_rom(cartridge_type: u8, rom_size_code: u8, ram_size_code: u8) -> Vec<u8> {
        let mut rom = vec![0u8; (32 * 1024) << rom_size_code as usize];
        rom[0x0147] = cartridge_type;
        rom[0x0148] = rom_size_code;
        rom[0x0149] = ram_size_code;
        rom
    }

    fn bus_for(rom: &[u8]) -> MemoryBus {
        let header = Header::parse(rom).unwrap();
        MemoryBus::new(&header, rom).unwrap()
    }

    #[test]
    fn wram_read_write() {
        let rom = test_rom(0x00, 0x00, 0x00);
        let mut bus = bus_for(&rom);

        bus.write_byte(0xC000, 0x42);
        bus.write_byte(0xDFFF, 0x69);
        assert_eq!(bus.read_byte(0xC000), 0x42);
        assert_eq!(bus.read_byte(0xDFFF), 0x69);
    }

    #[test]
    fn echo_ram_mirrors_wram() {
        let rom = test_rom(0x00, 0x00, 0x00);
        let mut bus = bus_for(&rom);

        bus.write_byte(0xC000, 0xAB);
        assert_eq!(bus.read_byte(0xE000), 0xAB);

        bus.write_byte(0xE100, 0xCD);
        assert_eq!(bus.read_byte(0xC100), 0xCD);
    }

    #[test]
    fn unusable_area_reads_open_bus() {
        let rom = test_rom(0x00, 0x00, 0x00);
        let bus = bus_for(&rom);
        assert_eq!(bus.read_byte(0xFEA0), 0xFF);
        assert_eq!(bus.read_byte(0xFEFF), 0xFF);
    }

    #[test]
    fn word_access_is_little_endian() {
        let rom = test_rom(0x00, 0x00, 0x00);
        let mut bus = bus_for(&rom);

        bus.write_word(0xC000, 0x1234);
        assert_eq!(bus.read_byte(0xC000), 0x34);
        assert_eq!(bus.read_byte(0xC001), 0x12);
        assert_eq!(bus.read_word(0xC000), 0x1234);
    }

    #[test]
    fn rom_writes_reach_the_mapper_not_the_rom() {
        let mut rom = test_rom(0x01, 0x02, 0x00); // MBC1, 128 KiB
        rom[0x4000] = 0x01; // bank 1 marker
        rom[5 * 0x4000] = 0x05; // bank 5 marker
        let mut bus = bus_for(&rom);

        assert_eq!(bus.read_byte(0x4000), 0x01);
        bus.write_byte(0x2100, 0x05);
        assert_eq!(bus.read_byte(0x4000), 0x05);
        assert_eq!(bus.read_byte(0x0000), rom[0]); // fixed bank untouched
    }

    #[test]
    fn ext_ram_honors_enable_gate() {
        let rom = test_rom(0x02, 0x00, 0x02); // MBC1+RAM, 8 KiB RAM
        let mut bus = bus_for(&rom);

        bus.write_byte(0xA000, 0x77);
        assert_eq!(bus.read_byte(0xA000), 0xFF);

        bus.write_byte(0x0000, 0x0A);
        bus.write_byte(0xA000, 0x77);
        assert_eq!(bus.read_byte(0xA000), 0x77);

        bus.write_byte(0x0000, 0x00);
        assert_eq!(bus.read_byte(0xA000), 0xFF);
    }

    #[test]
    fn dma_copies_a_page_into_oam() {
        let rom = test_rom(0x00, 0x00, 0x00);
        let mut bus = bus_for(&rom);

        for i in 0..OAM_SIZE as u16 {
            bus.write_byte(0xC000 + i, i as u8);
        }
        bus.write_byte(0xFF46, 0xC0);

        assert_eq!(bus.read_byte(0xFE00), 0x00);
        assert_eq!(bus.read_byte(0xFE9F), (OAM_SIZE - 1) as u8);
        assert_eq!(bus.read_byte(0xFF46), 0xC0);
    }

    #[test]
    fn dma_from_oam_area_is_ignored() {
        let rom = test_rom(0x00, 0x00, 0x00);
        let mut bus = bus_for(&rom);

        bus.write_byte(0xFE00, 0x5A);
        bus.write_byte(0xFF46, 0xFE);
        assert_eq!(bus.read_byte(0xFE00), 0x5A);
    }

    #[test]
    fn io_reg_sugar_matches_raw_addresses() {
        let rom = test_rom(0x00, 0x00, 0x00);
        let mut bus = bus_for(&rom);

        bus.write_reg(IoReg::Tac, 0x05);
        assert_eq!(bus.read_byte(0xFF07), 0x05);

        bus.write_byte(0xFFFF, 0x1F);
        assert_eq!(bus.read_reg(IoReg::Ie), 0x1F);
    }

    #[test]
    fn interrupt_request_sets_if_bit() {
        let rom = test_rom(0x00, 0x00, 0x00);
        let mut bus = bus_for(&rom);

        bus.write_reg(IoReg::If, 0x00);
        bus.request_interrupt(TIMER_INTERRUPT_BIT);
        assert_eq!(bus.read_reg(IoReg::If), 0x04);
    }
}
