//! The `ippr` binary: command-line surface around the interpreter library.
//!
//! Exit codes follow the language specification: the interpreted program's
//! own code (or the interpreter's fault code) on a completed run, 10 for
//! bad arguments, 11 when an input file cannot be opened, 12 when the
//! statistics file cannot be written.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use ippr::{Interpreter, StatField};

/// Interpreter for the IPPcode23 intermediate language.
///
/// At least one of --source and --input must be given; the other one
/// defaults to standard input.
#[derive(Parser, Debug)]
#[command(name = "ippr", version)]
struct Args {
    /// Program XML (defaults to standard input)
    #[arg(long, value_name = "PATH")]
    source: Option<PathBuf>,

    /// Runtime input consumed by READ (defaults to standard input)
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Write execution statistics to PATH after a successful run
    #[arg(long, value_name = "PATH")]
    stati: Option<PathBuf>,

    /// Statistics: number of executed instructions
    #[arg(long, action = ArgAction::Count, requires = "stati")]
    insts: u8,

    /// Statistics: maximum number of initialised variables
    #[arg(long, action = ArgAction::Count, requires = "stati")]
    vars: u8,

    /// Statistics: order of the most-executed instruction
    #[arg(long, action = ArgAction::Count, requires = "stati")]
    hot: u8,

    /// Statistics: most frequent opcodes in the source
    #[arg(long, action = ArgAction::Count, requires = "stati")]
    frequent: u8,

    /// Statistics: an empty line
    #[arg(long, action = ArgAction::Count, requires = "stati")]
    eol: u8,
}

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return 0;
        }
        Err(err) => {
            let _ = err.print();
            return 10;
        }
    };

    if args.source.is_none() && args.input.is_none() {
        eprintln!("error: at least one of --source and --input must be given");
        return 10;
    }

    // Statistics flags are order-sensitive and may repeat, so their report
    // order is recovered from the raw command line.
    let fields = stat_fields();

    let source = match read_source(args.source.as_deref()) {
        Ok(source) => source,
        Err((path, err)) => {
            eprintln!("error: cannot read {path}: {err}");
            return 11;
        }
    };
    let input: Box<dyn BufRead> = match &args.input {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(err) => {
                eprintln!("error: cannot open {}: {err}", path.display());
                return 11;
            }
        },
        None => Box::new(io::stdin().lock()),
    };

    let mut interpreter = Interpreter::new().with_input(input);
    let code = match interpreter.run(&source) {
        Ok(code) => code,
        Err(err) => return err.exit_code(),
    };

    if let Some(path) = &args.stati {
        let report = File::create(path).and_then(|mut file| {
            interpreter.stats().write_report(&fields, &mut file)
        });
        if let Err(err) = report {
            eprintln!("error: cannot write {}: {err}", path.display());
            return 12;
        }
    }

    code
}

fn read_source(path: Option<&std::path::Path>) -> Result<String, (String, io::Error)> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|err| (path.display().to_string(), err)),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .map_err(|err| ("standard input".to_string(), err))?;
            Ok(source)
        }
    }
}

/// The statistics fields in command-line order.
fn stat_fields() -> Vec<StatField> {
    std::env::args()
        .skip(1)
        .filter_map(|arg| match arg.as_str() {
            "--insts" => Some(StatField::Insts),
            "--vars" => Some(StatField::Vars),
            "--hot" => Some(StatField::Hot),
            "--frequent" => Some(StatField::Frequent),
            "--eol" => Some(StatField::Eol),
            _ => None,
        })
        .collect()
}
