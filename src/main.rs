// Headless host for the garnet core: load a ROM, run a budget of
// instructions, report what happened.

use clap::Parser;
use garnet::{Emulator, TraceSink};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "garnet", about = "Headless Game Boy (DMG) emulator core runner")]
struct Args {
    /// Path to the ROM image
    rom: PathBuf,

    /// Instruction budget for the run
    #[arg(long, default_value_t = 10_000_000)]
    steps: u64,

    /// Write an execution trace to FILE ("-" for stdout)
    #[arg(long, value_name = "FILE")]
    trace: Option<PathBuf>,

    /// Dump captured serial output on exit
    #[arg(long)]
    serial: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let rom = fs::read(&args.rom)?;
    let mut emulator = Emulator::new(&rom)?;

    println!(
        "Loaded \"{}\": {:?}, ROM {} KiB, RAM {} KiB, header checksum {}",
        emulator.header.title,
        emulator.header.cartridge_type,
        emulator.header.rom_size / 1024,
        emulator.header.ram_size / 1024,
        if emulator.header.checksum_valid {
            "ok"
        } else {
            "BAD"
        },
    );

    if let Some(path) = &args.trace {
        let sink: Box<dyn TraceSink> = if path.as_os_str() == "-" {
            Box::new(std::io::stdout())
        } else {
            Box::new(fs::File::create(path)?)
        };
        emulator.set_trace_sink(Some(sink));
    }

    let result = emulator.run_steps(args.steps);

    println!(
        "Executed {} instructions in {} M-cycles",
        emulator.cpu.exe_counter(),
        emulator.cycles,
    );
    if args.serial {
        let output = emulator.serial_output();
        if output.is_empty() {
            println!("No serial output captured");
        } else {
            println!("Serial output: {output}");
        }
    }

    result?;
    Ok(())
}
