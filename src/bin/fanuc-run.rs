use std::{fs, path::PathBuf, process};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use fanuc_ngc::eval::{Config, Interpreter, Program, SimMachine};

/// Run a Fanuc G-code program on a simulated machine, and print the
/// commands it received.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The program file.
    file: PathBuf,
    /// Skip blocks starting with "/".
    #[arg(short, long)]
    block_delete: bool,
    /// Abort after executing this many blocks.
    #[arg(short = 'l', long)]
    step_limit: Option<u64>,
    /// Print all defined variables after the run.
    #[arg(long)]
    dump_vars: bool,
    /// Log the executed blocks (repeat for variable writes).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .without_time()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let filename = args.file.display().to_string();
    let input = match fs::read_to_string(&args.file) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Cannot read {}: {}", filename, e);
            process::exit(2);
        }
    };
    let program = match Program::from_source(&filename, &input) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let config = Config { block_delete: args.block_delete, step_limit: args.step_limit };
    let mut interp = Interpreter::with_config(SimMachine::new(), config);
    let result = interp.run_program(program);

    for cmd in &interp.machine().commands {
        println!("{:?}", cmd);
    }
    if args.dump_vars {
        for index in (1..=33).chain(100..=199).chain(500..=999) {
            if let Ok(Some(value)) = interp.get_variable(index) {
                println!("#{} = {}", index, value);
            }
        }
    }
    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}
