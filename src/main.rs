use std::{
    io::{self, Read},
    path::PathBuf,
};

use clap::{Parser as ClapParser, Subcommand};
use runql::cli::{self, CheckOptions, CheckResult, CliError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "runql")]
#[command(about = "runql - compile experiment search filters into parameterized SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a filter and print the joins, WHERE clause and parameters
    Check {
        /// The filter to compile (reads from stdin if not provided)
        query: Option<String>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// SQL dialect, overriding the configuration (postgres, sqlite)
        #[arg(short, long)]
        dialect: Option<String>,

        /// Also render a complete SELECT statement
        #[arg(short, long)]
        select: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't resolve attributes
        #[arg(long)]
        syntax_only: bool,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'runql docs' to list categories)
        category: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            query,
            config,
            dialect,
            select,
            pretty,
            syntax_only,
        } => read_query(query).and_then(|query| {
            run_check(
                CheckOptions {
                    query,
                    config,
                    dialect,
                    select,
                    syntax_only,
                },
                pretty,
            )
        }),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => cli::get_doc_category(&category).map(|content| {
            print!("{content}");
        }),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        if let Some(pointer) = e.pointer() {
            eprintln!("{pointer}");
        }
        std::process::exit(1);
    }
}

fn read_query(query: Option<String>) -> Result<String, CliError> {
    match query {
        Some(query) => Ok(query),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer.trim_end().to_string())
        }
        None => Err(CliError::NoQuery),
    }
}

fn run_check(options: CheckOptions, pretty: bool) -> Result<(), CliError> {
    debug!(query = %options.query, "compiling");

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{json}");
        }
    }
    Ok(())
}
