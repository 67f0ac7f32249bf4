use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use nangosha_lang as lang;

use lang::error::StderrReporter;
use lang::interpreter::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
use lang::runner::{self, Status};
use lang::scanner::Scanner;
use lang::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for a small scripting language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable debug logging to a file (see --log-file)
    #[arg(long, global = true)]
    log: bool,

    /// Where --log writes to
    #[arg(long, global = true, default_value = "app.log")]
    log_file: PathBuf,

    /// Maximum nesting of script function calls
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
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

    /// Runs input from a file as a program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default)
    Repl,
}

/// Reads the contents of a file as UTF-8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf)
        .map_err(lang::LangError::from)
        .context(format!("{:?} is not valid UTF-8", filename))
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format(|buf, record| {
            // Strip the crate prefix from module paths
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("nangosha_lang::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<Status> {
    let source = read_file(filename)?;
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut status = Status::Success;

    for result in Scanner::new(&source) {
        match result {
            Ok(token) => {
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                status = Status::StaticError;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
        );
    }

    Ok(status)
}

fn repl(interpreter: &mut Interpreter) -> Result<()> {
    info!("Starting REPL");

    let stdin = io::stdin();
    let mut reporter = StderrReporter;

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            break;
        }

        let status = runner::run(interpreter, &line, &mut reporter);
        debug!("REPL entry finished with {:?}", status);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    let mut interpreter = Interpreter::new().with_max_call_depth(args.max_call_depth);

    let status = match args.commands.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");
            tokenize(&filename, json)?
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source = read_file(&filename)?;
            runner::run(&mut interpreter, &source, &mut StderrReporter)
        }

        Commands::Repl => {
            repl(&mut interpreter)?;
            Status::Success
        }
    };

    if status != Status::Success {
        debug!("Exiting with code {}", status.exit_code());
        std::process::exit(status.exit_code());
    }

    Ok(())
}
