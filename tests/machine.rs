//! End-to-end exercises of the composed machine: CPU, bus, timer, PPU, and
//! APU stepped together the way the frontend drives them.

use dotmatrix::apu::Apu;
use dotmatrix::cartridge::Cartridge;
use dotmatrix::cpu::Cpu;
use dotmatrix::memory_bus::MemoryBus;
use dotmatrix::ppu::Ppu;

const CYCLES_PER_FRAME: u32 = 70_224;

/// Builds a 32 KiB no-MBC ROM with a valid header and the given code placed
/// at the entry point 0x0100.
fn rom_with_program(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 2 * 0x4000];
    rom[0x0134..0x0139].copy_from_slice(b"EXEC\0");
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);

    let mut checksum: u8 = 0;
    for addr in 0x0134..=0x014C {
        checksum = checksum.wrapping_sub(rom[addr]).wrapping_sub(1);
    }
    rom[0x014D] = checksum;
    rom
}

struct Machine {
    cpu: Cpu,
    ppu: Ppu,
    apu: Apu,
    bus: MemoryBus,
}

impl Machine {
    fn boot(program: &[u8]) -> Machine {
        let cart = Cartridge::from_bytes(rom_with_program(program)).unwrap();
        let bus = MemoryBus::new(cart, None).unwrap();
        let apu = Apu::new(&bus);
        Machine {
            cpu: Cpu::new(true),
            ppu: Ppu::new(),
            apu,
            bus,
        }
    }

    fn step(&mut self) -> u32 {
        let cycles = self.cpu.step(&mut self.bus).expect("CPU fault");
        self.bus.tick(cycles);
        self.ppu.step(cycles, &mut self.bus);
        self.apu.step(cycles, &mut self.bus);
        cycles
    }

    fn run_cycles(&mut self, total: u32) {
        let mut done = 0;
        while done < total {
            done += self.step();
        }
    }
}

#[test]
fn post_boot_state_matches_documented_values() {
    let machine = Machine::boot(&[]);
    assert_eq!(machine.cpu.a, 0x01);
    assert_eq!(machine.cpu.f, 0xB0);
    assert_eq!(machine.cpu.get_bc(), 0x0013);
    assert_eq!(machine.cpu.get_de(), 0x00D8);
    assert_eq!(machine.cpu.get_hl(), 0x014D);
    assert_eq!(machine.cpu.sp, 0xFFFE);
    assert_eq!(machine.cpu.pc, 0x0100);
    assert_eq!(machine.bus.read_byte(0xFF40), 0x91);
    assert_eq!(machine.bus.read_byte(0xFF47), 0xFC);
}

#[test]
fn program_reports_over_serial() {
    // Compute 2 + 3 and transmit the ASCII digit over the link port.
    let machine_code = [
        0x3E, 0x32, // LD A, '2'
        0xC6, 0x03, // ADD A, 3
        0xE0, 0x01, // LDH (SB), A
        0x3E, 0x81, // LD A, 0x81
        0xE0, 0x02, // LDH (SC), A
        0x76, // HALT
    ];
    let mut machine = Machine::boot(&machine_code);
    machine.run_cycles(200);

    assert_eq!(machine.bus.take_serial(), vec![b'5']);
    // Serial IRQ pending, completion bit cleared.
    assert_ne!(machine.bus.read_byte(0xFF0F) & 0x08, 0);
    assert_eq!(machine.bus.read_byte(0xFF02), 0x01);
}

#[test]
fn timer_interrupt_reaches_its_vector() {
    // Enable the timer interrupt, set the fastest rate, and spin; the
    // handler at 0x50 stores a marker in WRAM and loops.
    let machine_code = [
        0x3E, 0xFE, // LD A, 0xFE
        0xE0, 0x05, // LDH (TIMA), A
        0x3E, 0x05, // LD A, 0x05
        0xE0, 0x07, // LDH (TAC), A
        0x3E, 0x04, // LD A, 0x04 (timer)
        0xE0, 0xFF, // LDH (IE), A
        0xFB, // EI
        0x18, 0xFE, // JR -2 (spin)
    ];
    let mut rom = rom_with_program(&machine_code);
    // Handler at 0x0050: LD A, 0x42; LD (0xC000), A; JR -2.
    let handler = [0x3E, 0x42, 0xEA, 0x00, 0xC0, 0x18, 0xFE];
    rom[0x0050..0x0050 + handler.len()].copy_from_slice(&handler);
    // Checksum region unchanged by the handler bytes (outside 0x134..).

    let cart = Cartridge::from_bytes(rom).unwrap();
    let bus = MemoryBus::new(cart, None).unwrap();
    let apu = Apu::new(&bus);
    let mut machine = Machine {
        cpu: Cpu::new(true),
        ppu: Ppu::new(),
        apu,
        bus,
    };

    machine.run_cycles(2000);
    assert_eq!(machine.bus.read_byte(0xC000), 0x42);
}

#[test]
fn vblank_paces_frames() {
    let mut machine = Machine::boot(&[0x18, 0xFE]); // spin
    let mut frames = 0;
    let mut cycles = 0;
    while cycles < CYCLES_PER_FRAME * 3 + 400 {
        cycles += machine.step();
        if machine.ppu.take_frame_ready() {
            frames += 1;
        }
    }
    assert_eq!(frames, 3);
    // VBlank was requested along the way.
    assert_ne!(machine.bus.read_byte(0xFF0F) & 0x01, 0);
}

#[test]
fn audio_samples_accumulate_at_host_rate() {
    let mut machine = Machine::boot(&[0x18, 0xFE]);
    machine.run_cycles(CYCLES_PER_FRAME);
    let pairs = machine.apu.take_samples().len() / 2;
    // One frame is ~1/59.7 s: ~803 stereo pairs at 48 kHz.
    assert!((795..=812).contains(&pairs), "pairs = {}", pairs);
}

#[test]
fn halted_cpu_still_advances_devices() {
    let mut machine = Machine::boot(&[0x76]); // HALT, no interrupts enabled
    machine.run_cycles(CYCLES_PER_FRAME);
    // The PPU kept scanning out lines while the CPU idled.
    assert!(machine.ppu.take_frame_ready());
    assert!(machine.cpu.halted);
    assert_ne!(machine.bus.read_byte(0xFF44), 0xFF);
}

#[test]
fn cycle_aggregation_is_consistent_across_step_sizes() {
    // Drive bus+PPU+APU with the same total cycle count in different chunk
    // sizes and compare the visible state.
    let build = || {
        let cart = Cartridge::from_bytes(rom_with_program(&[])).unwrap();
        let mut bus = MemoryBus::new(cart, None).unwrap();
        bus.write_byte(0xFF07, 0x05); // timer on, 262144 Hz
        let apu = Apu::new(&bus);
        (bus, Ppu::new(), apu)
    };

    let (mut bus_a, mut ppu_a, mut apu_a) = build();
    let (mut bus_b, mut ppu_b, mut apu_b) = build();

    let total = 456 * 10 + 36;
    for _ in 0..total / 4 {
        bus_a.tick(4);
        ppu_a.step(4, &mut bus_a);
        apu_a.step(4, &mut bus_a);
    }
    let mut left = total;
    for chunk in [300u32, 456, 1000, 2000].iter().cycle() {
        if left == 0 {
            break;
        }
        let c = (*chunk).min(left);
        bus_b.tick(c);
        ppu_b.step(c, &mut bus_b);
        apu_b.step(c, &mut bus_b);
        left -= c;
    }

    assert_eq!(bus_a.read_byte(0xFF04), bus_b.read_byte(0xFF04)); // DIV
    assert_eq!(bus_a.read_byte(0xFF05), bus_b.read_byte(0xFF05)); // TIMA
    assert_eq!(ppu_a.ly(), ppu_b.ly());
}
