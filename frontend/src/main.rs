use std::fs;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::LevelFilter;

use cabinet_core::core::{Machine, MachineHandle, Status};
use cabinet_core::disassembler::Statement;
use cabinet_machines::registry;

mod config;
mod logger;

use config::FileConfig;

#[derive(Parser, Debug)]
#[command(name = "cabinet")]
#[command(about = "Run a Z80 program image on an emulated board", long_about = None)]
struct Args {
    /// Board to wire up (e.g. simplez80)
    board: String,

    /// Raw program image loaded at 0x0000
    program: PathBuf,

    /// Config file (default: $CONFIG_DIR/cabinet/cabinet.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Stop before executing the instruction at ADDR (hex with 0x or $, or decimal)
    #[arg(long = "break", value_name = "ADDR", value_parser = parse_address)]
    breakpoints: Vec<u16>,

    /// Print every instruction to stdout before it runs
    #[arg(long)]
    trace: bool,

    /// Write a machine snapshot here when the run ends
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long = "log")]
    log_level: Option<LevelFilter>,
}

fn parse_address(text: &str) -> Result<u16, String> {
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'));
    let parsed = match hex {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| format!("invalid address {text:?}: {e}"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = FileConfig::load(args.config.as_deref())?;

    let level = match (args.log_level, config.log_level.as_deref()) {
        (Some(level), _) => level,
        (None, Some(text)) => text
            .parse()
            .with_context(|| format!("invalid log_level {text:?} in config"))?,
        (None, None) => LevelFilter::Warn,
    };
    logger::init(level);

    let Some(entry) = registry::find(&args.board) else {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        bail!("unknown board {:?}; available: {}", args.board, names.join(", "));
    };

    let program = fs::read(&args.program)
        .with_context(|| format!("failed to read program {}", args.program.display()))?;
    let mut machine = (entry.create)(&config.board, &program)
        .with_context(|| format!("failed to build board {}", entry.name))?;

    machine.breakpoints.extend(args.breakpoints.iter().copied());
    if args.trace {
        machine.set_trace(Some(Box::new(|core: usize, statement: &Statement| {
            println!("[{core}] {statement}");
        })));
    }

    let machine = run(machine, &config, args.ticks)?;
    print_state(&machine);

    if let Some(path) = &args.snapshot {
        let bytes = machine.snapshot()?;
        fs::write(path, &bytes)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        log::info!("wrote {} byte snapshot to {}", bytes.len(), path.display());
    }

    if let Status::Trapped(fault) = machine.status() {
        bail!("machine trapped: {fault}");
    }
    Ok(())
}

/// Run on the scheduler thread until the machine leaves `Running`, which
/// includes the scheduler stopping it at the tick limit, then take it back.
fn run(machine: Machine, config: &FileConfig, limit: Option<u64>) -> Result<Machine> {
    let handle = MachineHandle::spawn(machine, &config.scheduler);
    handle.stop_at(limit)?;
    handle.start()?;

    let poll = config.scheduler.tick_interval();
    while handle.status()? == Status::Running {
        thread::sleep(poll);
    }

    Ok(handle.quit()?)
}

fn print_state(machine: &Machine) {
    println!("status: {:?} after {} ticks", machine.status(), machine.ticks());
    for index in 0..machine.core_count() {
        let Some(core) = machine.core(index) else {
            continue;
        };
        let cpu = core.cpu();
        println!("core {index}: {} cycles", core.total_cycles());

        let cells: Vec<String> = cpu
            .register_names()
            .iter()
            .filter_map(|&name| cpu.register(name).map(|value| format!("{name:>3}={value:04X}")))
            .collect();
        for row in cells.chunks(8) {
            println!("  {}", row.join(" "));
        }
        println!("  next: {}", core.statement());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_accept_hex_and_decimal() {
        assert_eq!(parse_address("0x1234"), Ok(0x1234));
        assert_eq!(parse_address("$00ff"), Ok(0x00FF));
        assert_eq!(parse_address("256"), Ok(256));
        assert!(parse_address("0x10000").is_err());
        assert!(parse_address("zz").is_err());
    }

    #[test]
    fn cli_collects_repeated_breakpoints() {
        let args = Args::try_parse_from([
            "cabinet", "simplez80", "prog.bin", "--break", "0x10", "--break", "$20", "--ticks", "5",
            "--log", "debug",
        ])
        .unwrap();
        assert_eq!(args.breakpoints, vec![0x10, 0x20]);
        assert_eq!(args.ticks, Some(5));
        assert_eq!(args.log_level, Some(LevelFilter::Debug));
        assert!(!args.trace);
    }
}
