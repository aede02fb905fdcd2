use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::{Builder, Env};
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::scanner::Scanner;
use rox::session::{Session, EXIT_DATA_ERROR, EXIT_USAGE};

/// Stack for the thread that runs every command; sized for
/// [`rox::interpreter::MAX_CALL_DEPTH`] nested calls in a debug build.
const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Lox language interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Script to run; starts the REPL when omitted
    script: Option<PathBuf>,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Where `--log` writes to
    #[arg(long, global = true, value_name = "PATH", default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prints the token stream of a file, one token per line
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Parses a file holding one expression and prints its syntax tree
    Parse {
        filename: PathBuf,

        /// Print the AST as JSON instead of an S-expression
        #[arg(long)]
        json: bool,
    },

    /// Evaluates a file holding one expression and prints its value
    Evaluate { filename: PathBuf },

    /// Runs a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt
    Repl,
}

/// Reads the contents of a file as UTF-8 text.
fn read_file(filename: &Path) -> Result<String> {
    info!("Loading source from {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    // Default to Debug, override with RUST_LOG
    Builder::from_env(Env::default().default_filter_or("debug"))
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
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
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<i32> {
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),

            Ok(token) => println!("{}", token),

            Err(e) => {
                tokenized = false;
                debug!("Lexical error: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized { 0 } else { EXIT_DATA_ERROR })
}

fn parse(filename: &Path, json: bool) -> Result<i32> {
    let source = read_file(filename)?;
    let mut session = Session::new();

    let tokens = session.scan(&source);

    if let Some(expr) = session.parse_expression(tokens) {
        if json {
            println!("{}", serde_json::to_string_pretty(&expr)?);
        } else {
            println!("{}", AstPrinter::print(&expr));
        }
    }

    Ok(session.exit_code())
}

fn evaluate(filename: &Path) -> Result<i32> {
    let source = read_file(filename)?;
    let mut session = Session::new();

    let tokens = session.scan(&source);

    if let Some(expr) = session.parse_expression(tokens) {
        if !session.had_error() {
            if let Some(value) = session.evaluate(&expr) {
                debug!("Evaluated to: {}", value);
                println!("{}", value);
            }
        }
    }

    Ok(session.exit_code())
}

fn run_file(filename: &Path) -> Result<i32> {
    let source = read_file(filename)?;
    info!("Provided input:\n {}", source);

    let mut session = Session::new();
    session.run(&source);

    Ok(session.exit_code())
}

/// One line per unit; errors are reported and the flags cleared before the
/// next line, while global bindings carry over.
fn run_prompt() -> Result<i32> {
    info!("Starting REPL");

    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };

        session.run(&line.context("Failed to read from stdin")?);
        session.reset();
    }

    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_USAGE,
            };
            e.print()?;
            std::process::exit(code);
        }
    };

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        // Minimal logger so the facade has a sink
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("Invoked with {:?}", args);

    // Deep Lox recursion needs more than the default main-thread stack.
    let worker = thread::Builder::new()
        .name("rox".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || -> Result<i32> {
            match (args.commands, args.script) {
                (Some(Commands::Tokenize { filename, json }), _) => tokenize(&filename, json),
                (Some(Commands::Parse { filename, json }), _) => parse(&filename, json),
                (Some(Commands::Evaluate { filename }), _) => evaluate(&filename),
                (Some(Commands::Run { filename }), _) => run_file(&filename),
                (Some(Commands::Repl), _) | (None, None) => run_prompt(),
                (None, Some(script)) => run_file(&script),
            }
        })
        .context("Failed to spawn interpreter thread")?;

    let code: i32 = worker
        .join()
        .map_err(|_| anyhow!("Interpreter thread panicked"))??;

    debug!("Exiting with code {}", code);

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
