use std::{fs, path::PathBuf, process};
use clap::Parser;
use fanuc_ngc::parse::parse;

/// Parse a Fanuc G-code program and print it in normalized form.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The program file.
    file: PathBuf,
}

fn main() {
    let args = Args::parse();
    let filename = args.file.display().to_string();
    let input = match fs::read_to_string(&args.file) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Cannot read {}: {}", filename, e);
            process::exit(2);
        }
    };

    match parse(&filename, &input) {
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
        Ok(prog) => print!("{}", prog),
    }
}
