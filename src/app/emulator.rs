use crate::constants;
use dotmatrix::apu::Apu;
use dotmatrix::cartridge::Cartridge;
use dotmatrix::cpu::Cpu;
use dotmatrix::memory_bus::MemoryBus;
use dotmatrix::ppu::Ppu;
use std::fs;
use std::path::Path;

/// The composed machine: one bus, one of each device, created together and
/// torn down together.
pub struct Emulator {
    pub cpu: Cpu,
    pub ppu: Ppu,
    pub apu: Apu,
    pub bus: MemoryBus,
}

impl Emulator {
    pub fn new(rom_path: &Path) -> Result<Self, String> {
        let rom = fs::read(rom_path)
            .map_err(|e| format!("Failed to read ROM '{}': {}", rom_path.display(), e))?;
        let cart = Cartridge::from_bytes(rom)?;

        let boot_rom = load_boot_rom();
        let skip_boot_rom = boot_rom.is_none();
        let bus = MemoryBus::new(cart, boot_rom)?;
        let cpu = Cpu::new(skip_boot_rom);
        let ppu = Ppu::new();
        let apu = Apu::new(&bus);

        Ok(Emulator { cpu, ppu, apu, bus })
    }

    /// Runs the machine for up to one frame's worth of cycles, stopping
    /// early at frame completion. Returns whether a frame was produced.
    pub fn run_frame(&mut self) -> Result<bool, String> {
        let mut frame_cycles: u32 = 0;
        while frame_cycles < constants::CYCLES_PER_FRAME {
            let cycles = self.cpu.step(&mut self.bus)?;
            self.bus.tick(cycles);
            self.ppu.step(cycles, &mut self.bus);
            self.apu.step(cycles, &mut self.bus);
            frame_cycles += cycles;

            if self.ppu.take_frame_ready() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Diagnostic dump for fatal errors (illegal opcode, corrupt state).
    pub fn dump_state(&self) {
        log::error!("CPU state: {:#?}", self.cpu);
        log::error!("Bus state: {:#?}", self.bus);
    }
}

/// Optional boot-ROM override: a 256-byte image named by DOTMATRIX_BOOTROM.
fn load_boot_rom() -> Option<Vec<u8>> {
    let path = std::env::var("DOTMATRIX_BOOTROM").ok()?;
    if path.is_empty() {
        return None;
    }
    match fs::read(&path) {
        Ok(image) if image.len() == 0x100 => {
            log::info!("Boot ROM loaded from '{}'", path);
            Some(image)
        }
        Ok(image) => {
            log::warn!(
                "Boot ROM '{}' is {} bytes, expected 256; ignoring",
                path,
                image.len()
            );
            None
        }
        Err(e) => {
            log::warn!("Cannot read boot ROM '{}': {}; ignoring", path, e);
            None
        }
    }
}
