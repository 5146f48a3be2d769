//! # Scheduler Simulator Host
//!
//! Command-line entry point: replays a scenario script and prints the report.

use schedsimd::{load_config_file, read_text_file, HostRuntime, HostRuntimeConfig};
use std::env;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    let (config, verbose) = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    if let Err(e) = init_logging(verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let runtime = HostRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to create runtime: {}", e);
        process::exit(1);
    });

    match runtime.run_to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbose {
        0 => simplelog::LevelFilter::Info,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    let mut lcfg = simplelog::ConfigBuilder::new();
    lcfg.set_time_level(simplelog::LevelFilter::Error)
        .set_location_level(simplelog::LevelFilter::Off)
        .set_target_level(simplelog::LevelFilter::Off)
        .set_thread_level(simplelog::LevelFilter::Off);
    simplelog::TermLogger::init(
        level,
        lcfg.build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
}

fn parse_args(args: &[String]) -> Result<(HostRuntimeConfig, u8), String> {
    let mut config = HostRuntimeConfig::default();
    let mut script_path = None;
    let mut verbose = 0u8;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--script" | "-s" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --script".to_string());
                }
                script_path = Some(args[i].clone());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                config.base = load_config_file(Path::new(&args[i])).map_err(|e| e.to_string())?;
            }
            "--quantum" | "-q" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --quantum".to_string());
                }
                config.overrides.quantum = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("Invalid quantum value: {}", args[i]))?,
                );
            }
            "--max-procs" | "-n" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --max-procs".to_string());
                }
                config.overrides.max_procs = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("Invalid max-procs value: {}", args[i]))?,
                );
            }
            "--max-steps" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --max-steps".to_string());
                }
                let steps: u64 = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid max-steps value: {}", args[i]))?;
                config.overrides.max_steps = Some(if steps == 0 { None } else { Some(steps) });
            }
            "--audit" => {
                config.audit = true;
            }
            "-v" => verbose = verbose.saturating_add(1),
            "-vv" => verbose = verbose.saturating_add(2),
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    let Some(path) = script_path else {
        return Err("Missing required option --script".to_string());
    };
    config.script = read_text_file(Path::new(&path)).map_err(|e| e.to_string())?;

    Ok((config, verbose))
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} --script <FILE> [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --script <FILE>      Scenario script to replay (required)");
    eprintln!("  -c, --config <FILE>      JSON scheduler configuration");
    eprintln!("  -q, --quantum <Q>        Override the time quantum");
    eprintln!("  -n, --max-procs <N>      Override the process capacity");
    eprintln!("  --max-steps <N>          Sub-step limit per advance (0 = unlimited)");
    eprintln!("  --audit                  Include the transition audit trail");
    eprintln!("  -v, -vv                  Debug or trace logging on stderr");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --script scripts/io_overlap.sched", program);
    eprintln!("  {} -s scripts/io_overlap.sched --quantum 0.5 --audit", program);
}
