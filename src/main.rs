use std::fs;
use std::path::Path;

use clap::{Arg, Command};

use minipy::{repl, runner};

fn cli() -> Command {
    Command::new("minipy")
        .about("A Python-flavored expression language with an incremental REPL")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("file"),
        )
}

fn main() {
    let matches = cli().get_matches();

    match matches.get_one::<String>("file") {
        Some(file_path) => run_file(file_path),
        None => repl::start(),
    }
}

fn run_file(path: &str) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        std::process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            runner::run(&source, path.to_str());
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
