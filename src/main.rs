use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use php_codeintel::config::Config;
use php_codeintel::error::{Error, Result};
use php_codeintel::{Backend, ContextResolver, Lexer, PhpLexer, ProcessLexer, helper, scanner};

#[derive(Parser)]
#[command(name = "php-codeintel")]
#[command(version)]
#[command(about = "PHP declaration extraction, cursor context and IDE helper generation")]
struct Cli {
    /// Tokenize with this `php` binary instead of the built-in lexer
    #[arg(long, global = true, value_name = "BIN")]
    php: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the language server on stdio (default)
    Serve,

    /// Print the declarations of a file or directory as JSON
    Scan {
        /// File or directory to scan
        path: PathBuf,

        /// Extension of the files to scan
        #[arg(long, default_value = "php")]
        extension: String,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the completion context at a byte offset of a file as JSON
    Context {
        file: PathBuf,

        /// Byte offset of the cursor
        #[arg(long)]
        offset: usize,
    },

    /// Write an IDE helper file for the configured facades
    Generate {
        /// File or directory to scan
        path: PathBuf,

        /// Config file (default: auto-detect)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Output file (default: from config)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // stdout belongs to the LSP transport and to JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let lexer = make_lexer(cli.php.as_deref())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let (service, socket) =
                LspService::new(move |client| Backend::with_lexer(Some(client), lexer.clone()));
            Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
                .serve(service)
                .await;
            Ok(())
        }
        Command::Scan {
            path,
            extension,
            pretty,
        } => {
            let files = if path.is_dir() {
                scanner::scan_all_files(&lexer, &path, &extension)?
            } else {
                scanner::scan_file(&lexer, &path, &extension)?
                    .into_iter()
                    .collect()
            };
            print_json(&files, pretty)
        }
        Command::Context { file, offset } => {
            let source = std::fs::read_to_string(&file).map_err(|e| Error::Io {
                path: file.clone(),
                source: e,
            })?;
            let context = ContextResolver::new(lexer).resolve(&source, offset)?;
            print_json(&context, true)
        }
        Command::Generate {
            path,
            config,
            output,
        } => {
            let root = if path.is_dir() {
                path.clone()
            } else {
                path.parent().map(Path::to_path_buf).unwrap_or_default()
            };
            let (config, source) = Config::discover(config.as_deref(), &root)?;
            tracing::info!(config = %source, entries = config.classmap.len(), "using class map");
            let output = output.unwrap_or_else(|| config.generator.output.clone());
            helper::write_helper(&lexer, &config, &path, &output)
        }
    }
}

fn make_lexer(php: Option<&Path>) -> Result<Arc<dyn Lexer>> {
    let lexer: Arc<dyn Lexer> = match php {
        Some(binary) => Arc::new(ProcessLexer::new(binary)?),
        None => Arc::new(PhpLexer::new()),
    };
    Ok(lexer)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}").map_err(|e| Error::Io {
        path: PathBuf::from("<stdout>"),
        source: e,
    })
}
