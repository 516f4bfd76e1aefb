use clap::{ArgAction, Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use tinyasm::engine::{Engine, EngineOptions};
use tinyasm::error::Result;

#[derive(Parser)]
#[command(name = "tinyasm", version, about = "Assemble and run four-register toy programs")]
struct Cli {
    /// Increase log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program and print the final registers
    Run {
        file: PathBuf,
        /// Abort after executing this many instructions
        #[arg(long)]
        max_steps: Option<u64>,
    },
    /// Assemble a program and report problems without running it
    Check { file: PathBuf },
    /// Print the assembled instruction listing
    Dump { file: PathBuf },
}

impl Command {
    fn file(&self) -> &PathBuf {
        match self {
            Command::Run { file, .. } | Command::Check { file } | Command::Dump { file } => file,
        }
    }
}

fn unwrap_or_error<T>(result: Result<T>, file: &str, source: &str) -> T {
    match result {
        Ok(x) => x,
        Err(e) => {
            if e.print(file, source).is_err() {
                eprintln!("{}", e);
            }
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let path = cli.command.file();
    let file = path.display().to_string();
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", file, e);
            std::process::exit(1);
        }
    };

    let program = unwrap_or_error(tinyasm::assemble(&source), &file, &source);
    info!(
        "assembled {} instruction(s), {} label(s)",
        program.len(),
        program.labels().len()
    );

    match cli.command {
        Command::Run { max_steps, .. } => {
            let options = EngineOptions { max_steps };
            let mut engine = Engine::with_options(&program, options);
            let registers = unwrap_or_error(engine.run(), &file, &source);
            println!("{}", registers);
        }
        Command::Check { .. } => {
            let unresolved = program.unresolved_labels();
            for instruction in &unresolved {
                let range = instruction.range();
                warn!(
                    "{}:{}..{}: '{}' jumps to an undeclared label",
                    file, range.start, range.end, instruction
                );
            }
            println!(
                "{}: {} instruction(s), {} label(s), {} unresolved jump(s)",
                file,
                program.len(),
                program.labels().len(),
                unresolved.len()
            );
        }
        Command::Dump { .. } => print!("{}", program),
    }
}
