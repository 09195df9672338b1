use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::ErrorReporter;
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};
use rox::Lox;

/// Exit status after lexing, parsing or resolution errors.
const EXIT_STATIC_ERROR: u8 = 65;

/// Exit status after a runtime error.
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parses a program and prints its AST
    Parse {
        filename: PathBuf,

        /// Print the AST as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a Lox program, or starts an interactive prompt without a file
    Run { filename: Option<PathBuf> },
}

/// Reads a whole source file as UTF‑8.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);

            writeln!(
                buf,
                "[{} {}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn print_errors(reporter: &ErrorReporter, source: &str) {
    for rendered in reporter.render(source) {
        eprintln!("{}", rendered);
    }
}

/// Map a finished run to the process exit status.
fn status(reporter: &ErrorReporter) -> ExitCode {
    if reporter.had_error() {
        ExitCode::from(EXIT_STATIC_ERROR)
    } else if reporter.had_runtime_error() {
        ExitCode::from(EXIT_RUNTIME_ERROR)
    } else {
        ExitCode::SUCCESS
    }
}

fn tokenize(filename: &PathBuf, json: bool) -> Result<ExitCode> {
    let source = read_file(filename)?;
    let mut tokens = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e.display(&source));
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code {}", EXIT_STATIC_ERROR);
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    Ok(ExitCode::SUCCESS)
}

fn parse(filename: &PathBuf, json: bool) -> Result<ExitCode> {
    let source = read_file(filename)?;
    let mut reporter = ErrorReporter::new();

    let tokens = scan_tokens(&source, &mut reporter);
    let statements = Parser::new(&tokens, &mut reporter).parse();

    if reporter.had_error() {
        print_errors(&reporter, &source);
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&statements)?);
    } else {
        let printer = AstPrinter;
        for stmt in &statements {
            println!("{}", printer.print_stmt(stmt));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn evaluate(filename: &PathBuf) -> Result<ExitCode> {
    let source = read_file(filename)?;

    match Lox::new().evaluate_expression(&source) {
        Ok(value) => {
            debug!("Evaluated to: {}", value);
            println!("{}", value);
            Ok(ExitCode::SUCCESS)
        }

        Err(reporter) => {
            print_errors(&reporter, &source);
            Ok(status(&reporter))
        }
    }
}

fn run_file(filename: &PathBuf) -> Result<ExitCode> {
    let source = read_file(filename)?;
    let reporter = Lox::new().run(&source);

    print_errors(&reporter, &source);

    Ok(status(&reporter))
}

fn run_prompt() -> Result<ExitCode> {
    info!("Starting interactive prompt");

    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("Lox REPL. Type exit() or quit to leave.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        if line == "exit()" || line == "quit" {
            break;
        }

        let reporter = lox.run(&line);
        print_errors(&reporter, &line);
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match &args.commands {
        Commands::Tokenize { filename, json } => tokenize(filename, *json),
        Commands::Parse { filename, json } => parse(filename, *json),
        Commands::Evaluate { filename } => evaluate(filename),
        Commands::Run { filename: Some(filename) } => run_file(filename),
        Commands::Run { filename: None } => run_prompt(),
    }
}
