//! Chip-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `chip8-emu run <rom>` - Run a ROM headless for a number of frames
//! - `chip8-emu play <rom>` - Play a ROM in the terminal
//! - `chip8-emu disasm <rom>` - Disassemble a ROM

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chip8-emu")]
#[command(version = "0.1.0")]
#[command(about = "A Chip-8 virtual machine interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Timing overrides shared by `run` and `play`.
#[derive(clap::Args)]
struct TimingArgs {
    /// JSON config file (cycles_per_second, timer_hz, seed)
    #[arg(short, long)]
    config: Option<String>,
    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,
    /// Instructions per second
    #[arg(long)]
    ips: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a ROM headless for a fixed number of 60 Hz frames
    Run {
        /// Path to the ROM image
        rom: String,
        /// Number of frames to run (default: 600, ten seconds)
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// Show trace output
        #[arg(short, long)]
        trace: bool,
        /// Print the final CPU state as JSON
        #[arg(long)]
        json: bool,
        /// Print the final screen
        #[arg(short, long)]
        screen: bool,
        #[command(flatten)]
        timing: TimingArgs,
    },
    /// Play a ROM in the terminal
    Play {
        /// Path to the ROM image
        rom: String,
        #[command(flatten)]
        timing: TimingArgs,
    },
    /// Disassemble a ROM to readable text
    Disasm {
        /// Path to the ROM image
        rom: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { rom, frames, trace, json, screen, timing }) => {
            run_rom(&rom, frames, trace, json, screen, &timing);
        }
        Some(Commands::Play { rom, timing }) => {
            play_rom(&rom, &timing);
        }
        Some(Commands::Disasm { rom }) => {
            disassemble_file(&rom);
        }
        None => {
            println!("Chip-8 Emulator v0.1.0");
            println!();
            println!("Use --help for available commands");
        }
    }
}

/// Build the driver config from an optional file plus flag overrides.
fn build_config(timing: &TimingArgs) -> chip8::Config {
    use chip8::Config;

    let mut config = match &timing.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Some(seed) = timing.seed {
        config.seed = Some(seed);
    }
    if let Some(ips) = timing.ips {
        config.cycles_per_second = ips;
    }

    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    config
}

fn read_rom(path: &str) -> Vec<u8> {
    match chip8::load_rom(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("❌ Failed to load ROM: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_rom(path: &str, frames: u64, trace: bool, json: bool, screen: bool, timing: &TimingArgs) {
    use chip8::Driver;
    use chip8::asm::disasm::{disassemble_instruction, format_instruction};

    let config = build_config(timing);
    let rom = read_rom(path);

    if !json {
        println!("🔧 Running: {} ({} bytes)", path, rom.len());
    }

    let mut driver = match Driver::new(config) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = driver.load(&rom) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    if trace && !json {
        println!();
        println!("━━━ Execution ━━━");
    }

    let mut fault = None;
    let mut blocked = false;
    for _ in 0..frames {
        let result = if trace && !json {
            driver.run_frame_with(|pc, instr| {
                println!("{:#05x}: {}", pc, format_instruction(instr));
            })
        } else {
            driver.run_frame()
        };

        match result {
            Ok(frame) if frame.awaiting_key => {
                // Nothing will ever press a key in a headless run.
                blocked = true;
                break;
            }
            Ok(_) => {}
            Err(e) => {
                fault = Some(e);
                break;
            }
        }
    }

    let cpu = driver.cpu();

    if json {
        match serde_json::to_string_pretty(&cpu.snapshot()) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("❌ Failed to serialize state: {}", e),
        }
    } else {
        println!();
        println!("━━━ Result ━━━");
        println!("Frames: {}", driver.frames());
        println!("Cycles: {}", cpu.cycles);
        println!("State: {:?}", cpu.state);
        println!("PC: {:#05x}  I: {:#05x}  SP: {}", cpu.regs.pc, cpu.regs.i, cpu.regs.sp);
        for (row, chunk) in cpu.regs.v.chunks(8).enumerate() {
            let line: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(col, v)| format!("V{:X}={:02X}", row * 8 + col, v))
                .collect();
            println!("{}", line.join(" "));
        }
        println!("DT: {}  ST: {}", cpu.regs.delay_timer, cpu.regs.sound_timer);

        if blocked {
            println!();
            println!("⏸  Program is waiting for a key press; stopping.");
        }
    }

    if screen {
        println!();
        print!("{}", cpu.display().to_ascii());
    }

    if let Some(e) = fault {
        eprintln!("❌ CPU fault: {}", e);
        if let (Some(pc), Some(op)) = (e.pc(), e.opcode()) {
            eprintln!("   {:#05x}: {}  {}", pc, op, disassemble_instruction(op));
        }
        std::process::exit(1);
    }
}

#[cfg(feature = "tui")]
fn play_rom(path: &str, timing: &TimingArgs) {
    let config = build_config(timing);
    let rom = read_rom(path);

    if let Err(e) = chip8::run_terminal(config, rom) {
        eprintln!("❌ Terminal error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn play_rom(_path: &str, _timing: &TimingArgs) {
    eprintln!("❌ Built without the `tui` feature");
    std::process::exit(1);
}

fn disassemble_file(path: &str) {
    use chip8::asm::disasm::disassemble;
    use chip8::cpu::memory::PROGRAM_START;

    let rom = read_rom(path);
    println!("{}", disassemble(&rom, PROGRAM_START));
}
