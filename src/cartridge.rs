use crate::mbc::MbcType;
use crate::memory_map::ROM_BANK_N_SIZE;

/// RAM size code (header byte 0x0149) to size in KiB.
const RAM_SIZE_KIB: [usize; 6] = [0, 0, 8, 32, 128, 64];

const HEADER_END: usize = 0x0150;

/// An immutable, checksum-verified ROM image plus the header fields the
/// rest of the machine consumes. Loaded once, then only read.
pub struct Cartridge {
    rom: Vec<u8>,
    title: String,
    cgb_flag: u8,
    sgb_flag: u8,
    cart_type: u8,
    mbc_type: MbcType,
    has_ram: bool,
    has_battery: bool,
    rom_bank_count: usize,
    ram_size_bytes: usize,
}

impl Cartridge {
    /// Parses and validates a raw ROM image.
    pub fn from_bytes(rom: Vec<u8>) -> Result<Self, String> {
        if rom.len() < HEADER_END {
            return Err(format!(
                "ROM too small to contain a header: {} bytes",
                rom.len()
            ));
        }

        let computed = Self::header_checksum(&rom);
        let stored = rom[0x014D];
        if computed != stored {
            return Err(format!(
                "Header checksum mismatch: computed {:02X}, header says {:02X}",
                computed, stored
            ));
        }

        let title: String = rom[0x0134..0x0144]
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();

        let cart_type = rom[0x0147];
        let (mbc_type, has_ram, has_battery) = MbcType::from_header(cart_type)?;

        let rom_size_code = rom[0x0148];
        if rom_size_code > 0x08 {
            return Err(format!("Unsupported ROM size code: {:02X}", rom_size_code));
        }
        let rom_bank_count = 2usize << rom_size_code;

        let ram_size_code = rom[0x0149] as usize;
        if ram_size_code >= RAM_SIZE_KIB.len() {
            return Err(format!("Unsupported RAM size code: {:02X}", ram_size_code));
        }
        let ram_size_bytes = RAM_SIZE_KIB[ram_size_code] * 1024;

        let expected = rom_bank_count * ROM_BANK_N_SIZE;
        if rom.len() < expected {
            log::warn!(
                "ROM file is {} bytes, header expects {} ({} banks)",
                rom.len(),
                expected,
                rom_bank_count
            );
        }

        let cart = Cartridge {
            title,
            cgb_flag: rom[0x0143],
            sgb_flag: rom[0x0146],
            cart_type,
            mbc_type,
            has_ram,
            has_battery,
            rom_bank_count,
            ram_size_bytes,
            rom,
        };

        log::info!(
            "Cartridge '{}': type {:02X} ({:?}), {} ROM banks, {} KiB RAM, battery: {}",
            cart.title,
            cart.cart_type,
            cart.mbc_type,
            cart.rom_bank_count,
            cart.ram_size_bytes / 1024,
            cart.has_battery
        );
        if cart.cgb_flag == 0xC0 {
            log::warn!("CGB-only cartridge; running in DMG mode anyway");
        }
        if cart.sgb_flag == 0x03 {
            log::info!("Cartridge advertises SGB features (ignored)");
        }

        Ok(cart)
    }

    /// Header checksum over 0x0134..=0x014C: x = x - byte - 1 for each byte.
    fn header_checksum(rom: &[u8]) -> u8 {
        let mut checksum: u8 = 0;
        for &b in &rom[0x0134..=0x014C] {
            checksum = checksum.wrapping_sub(b).wrapping_sub(1);
        }
        checksum
    }

    /// Reads a ROM byte at an absolute image offset; past-the-end reads the
    /// open bus value 0xFF (images smaller than the header bank count).
    #[inline(always)]
    pub fn read(&self, offset: usize) -> u8 {
        self.rom.get(offset).copied().unwrap_or(0xFF)
    }

    pub fn rom_len(&self) -> usize {
        self.rom.len()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mbc_type(&self) -> MbcType {
        self.mbc_type
    }

    pub fn has_ram(&self) -> bool {
        self.has_ram
    }

    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    pub fn rom_bank_count(&self) -> usize {
        self.rom_bank_count
    }

    pub fn ram_size_bytes(&self) -> usize {
        self.ram_size_bytes
    }
}
