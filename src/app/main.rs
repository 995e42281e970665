use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::{env, fs, process, thread};
use std::time::{Duration, Instant};

use sdl2::pixels::PixelFormatEnum;

mod audio;
mod constants;
mod drawing;
mod emulator;
mod input;
mod sdl_setup;

use emulator::Emulator;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <rom.gb>", args[0]);
        process::exit(1);
    }

    if let Err(e) = run(Path::new(&args[1])) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging() {
    let mut builder = env_logger::Builder::from_default_env();
    if let Ok(path) = env::var("DOTMATRIX_LOG_FILE") {
        if !path.is_empty() {
            match fs::File::create(&path) {
                Ok(file) => {
                    builder.target(env_logger::Target::Pipe(Box::new(file)));
                }
                Err(e) => eprintln!("Cannot open log file '{}': {}", path, e),
            }
        }
    }
    builder.init();
}

fn run(rom_path: &Path) -> Result<(), String> {
    let rom_filename = rom_path.file_name().unwrap_or_default().to_string_lossy();
    let window_title = format!("dotmatrix - {}", rom_filename);

    let mut emulator = Emulator::new(rom_path)?;

    // Battery-backed carts restore their RAM from the sidecar save file.
    let save_path = sidecar_save_path(rom_path);
    if emulator.bus.has_battery() {
        if let Ok(data) = fs::read(&save_path) {
            emulator.bus.load_external_ram(&data);
            log::info!("Loaded save RAM from '{}'", save_path.display());
        }
    }

    let mut sdl_context = sdl_setup::init_sdl(&window_title)?;

    // Audio failure is a warning, not a startup error: keep emulating.
    let audio_out = match audio::AudioOutput::open(&sdl_context.sdl) {
        Ok(out) => Some(out),
        Err(e) => {
            log::warn!("Audio init failed ({}); continuing without sound", e);
            None
        }
    };

    let mut texture = sdl_context
        .texture_creator
        .create_texture_streaming(
            PixelFormatEnum::RGB24,
            constants::SCREEN_WIDTH as u32,
            constants::SCREEN_HEIGHT as u32,
        )
        .map_err(|e| e.to_string())?;

    log::info!("Entering main loop");
    'main_loop: loop {
        let frame_start = Instant::now();

        if input::poll_quit(&mut sdl_context.event_pump) {
            break 'main_loop;
        }
        emulator
            .bus
            .set_joypad_state(input::pressed_mask(&sdl_context.event_pump));

        let frame_done = match emulator.run_frame() {
            Ok(done) => done,
            Err(e) => {
                emulator.dump_state();
                return Err(e);
            }
        };

        if frame_done {
            drawing::present_frame(
                &mut sdl_context.canvas,
                &mut texture,
                emulator.ppu.framebuffer(),
            )?;
        }

        // Serial bytes go straight to the host console (test ROMs report
        // their results this way).
        let serial = emulator.bus.take_serial();
        if !serial.is_empty() {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(&serial);
            let _ = stdout.flush();
        }

        let samples = emulator.apu.take_samples();
        if let Some(ref out) = audio_out {
            out.queue_samples(&samples);
        }

        // Throttle to real time: sleep most of the remainder, spin the rest.
        let elapsed = frame_start.elapsed();
        if elapsed < constants::TARGET_FRAME_DURATION {
            let remaining = constants::TARGET_FRAME_DURATION - elapsed;
            if remaining > Duration::from_millis(1) {
                thread::sleep(remaining - Duration::from_millis(1));
            }
            while frame_start.elapsed() < constants::TARGET_FRAME_DURATION {
                thread::yield_now();
            }
        }
    }

    // Flush whatever the APU produced since the last frame boundary.
    if let Some(ref out) = audio_out {
        out.queue_samples(&emulator.apu.take_samples());
    }

    if emulator.bus.has_battery() {
        match fs::write(&save_path, emulator.bus.external_ram()) {
            Ok(()) => log::info!("Saved cart RAM to '{}'", save_path.display()),
            Err(e) => log::warn!("Failed to save cart RAM: {}", e),
        }
    }

    log::info!("Emulator stopped");
    Ok(())
}

fn sidecar_save_path(rom_path: &Path) -> PathBuf {
    rom_path.with_extension("sav")
}
