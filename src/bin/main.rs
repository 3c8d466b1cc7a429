//! Sandbox launcher CLI

use clap::Parser;
use log::warn;
use sandbox_launcher::{Profile, RunConfig, Supervisor, SystemCapabilities, logging};

#[derive(Parser)]
#[command(name = "launcher")]
#[command(about = "Run an untrusted binary under namespace, rlimit and seccomp enforcement", long_about = None)]
struct Cli {
    /// Sandbox profile (strict, resource-aware, learning)
    #[arg(short, long, default_value = "strict")]
    profile: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Probe host sandboxing capabilities and exit
    #[arg(long)]
    check: bool,

    /// Program to execute (absolute path)
    executable: Option<String>,

    /// Program arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    if cli.check {
        println!("{}", SystemCapabilities::detect().summary());
        return;
    }

    let Some(program) = cli.executable else {
        eprintln!("Usage: launcher [--profile=STRICT|RESOURCE-AWARE|LEARNING] <executable> [args...]");
        std::process::exit(1);
    };

    let profile = Profile::from_tag(&cli.profile).unwrap_or_else(|| {
        warn!("unknown profile '{}', falling back to strict", cli.profile);
        Profile::Strict
    });

    let config = RunConfig {
        program,
        args: cli.args,
        profile,
    };

    match Supervisor::new(config).run() {
        Ok(outcome) => {
            println!(
                "pid={} | exit_reason={} | runtime_ms={} | peak_cpu={} | peak_memory_kb={}",
                outcome.pid,
                outcome.reason,
                outcome.log.summary.runtime_ms,
                outcome.log.summary.peak_cpu,
                outcome.log.summary.peak_memory_kb,
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
