//! orgcpu-run - Run a single organism and report its offspring
//!
//! # Usage
//!
//! ```bash
//! # Run a text genome for 1000 steps
//! orgcpu-run ancestors/replicator.org
//!
//! # 5000 steps, 1% copy mutation, reproducible
//! orgcpu-run -n 5000 -m 0.01 --seed 42 ancestors/replicator.org
//!
//! # Final state as JSON, with a custom CPU config
//! orgcpu-run --json --config cpu.json saved/child.orgb
//!
//! # Trace every executed instruction to stderr
//! orgcpu-run -v -n 100 ancestors/replicator.org
//! ```
//!
//! # Exit Codes
//!
//! - 0: Ran to the step limit
//! - 1: The organism faulted
//! - 2: Invalid arguments or IO error

use anyhow::{Context, Result};
use orgcpu::{format_genome, load_path, CpuConfig, Head, InstructionTable, PointMutation, VirtualCpu};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process::ExitCode;

struct Options {
    steps: u64,
    rate: f64,
    seed: Option<u64>,
    json: bool,
    verbose: bool,
    config: Option<PathBuf>,
    path: PathBuf,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let opts = match parse_args(&args) {
        Ok(Some(opts)) => opts,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("Error: {}\n", e);
            print_help();
            return ExitCode::from(2);
        }
    };

    match run(&opts) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut steps = 1000;
    let mut rate = 0.0;
    let mut seed = None;
    let mut json = false;
    let mut verbose = false;
    let mut config = None;
    let mut path = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .with_context(|| format!("{} requires a value", name))
        };
        match arg.as_str() {
            "-n" | "--steps" => {
                steps = value(arg)?.parse().context("--steps must be an integer")?;
            }
            "-m" | "--mutation-rate" => {
                rate = value(arg)?.parse().context("--mutation-rate must be a number")?;
            }
            "--seed" => {
                seed = Some(value(arg)?.parse().context("--seed must be an integer")?);
            }
            "--config" => config = Some(PathBuf::from(value(arg)?)),
            "--json" => json = true,
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => return Ok(None),
            _ if arg.starts_with('-') => anyhow::bail!("Unknown option: {}", arg),
            _ if path.is_some() => anyhow::bail!("Only one genome file may be given"),
            _ => path = Some(PathBuf::from(arg)),
        }
    }

    let path = path.context("No genome file specified")?;
    Ok(Some(Options { steps, rate, seed, json, verbose, config, path }))
}

fn run(opts: &Options) -> Result<ExitCode> {
    let config = match &opts.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            CpuConfig::from_json(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => CpuConfig::default(),
    };

    let table = InstructionTable::shared();
    let genome = load_path(&opts.path, &table)?;
    let mut cpu = VirtualCpu::with_config(genome, table.clone(), config);

    if opts.rate > 0.0 {
        let rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        cpu.set_mutator(PointMutation::new(opts.rate, rng));
    }

    let mut births = 0;
    let mut faulted = false;
    for _ in 0..opts.steps {
        let ip = cpu.head(Head::Inst);
        match cpu.step() {
            Ok(opcode) => {
                if opts.verbose {
                    eprintln!("{:>8} {:>5} {}", cpu.steps(), ip, table.name(opcode));
                }
            }
            Err(e) => {
                eprintln!("x organism faulted at step {}: {}", cpu.steps(), e);
                faulted = true;
                break;
            }
        }

        if cpu.is_divided() {
            if let Some(offspring) = cpu.take_offspring() {
                births += 1;
                println!("offspring {} ({} instructions): {}",
                    births,
                    offspring.len(),
                    format_genome(&offspring, &table),
                );
            }
        }
    }

    if opts.json {
        let snapshot = serde_json::to_string_pretty(&cpu.snapshot())
            .context("Failed to serialize CPU state")?;
        println!("{}", snapshot);
    } else {
        println!();
        print!("{}", cpu.dump_state());
    }
    eprintln!("{} steps, {} offspring", cpu.steps(), births);

    Ok(if faulted { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn print_help() {
    eprintln!("orgcpu-run - Run one digital organism");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    orgcpu-run [OPTIONS] <FILE>");
    eprintln!();
    eprintln!("ARGS:");
    eprintln!("    <FILE>    Genome file (.org text or .orgb binary)");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -n, --steps <N>            Instructions to execute (default 1000)");
    eprintln!("    -m, --mutation-rate <R>    Per-copy point mutation rate in [0, 1] (default 0)");
    eprintln!("        --seed <N>             Seed for the mutation RNG");
    eprintln!("        --config <FILE>        CPU config as JSON (stack_depth, max_working_len)");
    eprintln!("        --json                 Print the final state as JSON");
    eprintln!("    -v, --verbose              Trace each executed instruction to stderr");
    eprintln!("    -h, --help                 Print this help message");
    eprintln!();
    eprintln!("EXIT CODES:");
    eprintln!("    0    Ran to the step limit");
    eprintln!("    1    The organism faulted");
    eprintln!("    2    Invalid arguments or IO error");
}
