use cel_lang::Parser;
use cel_lang::cli::{self, CliError, EvalOptions};
use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "cel")]
#[command(about = "Parse, optimize and evaluate Common Expression Language expressions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression and print the result as JSON
    Eval {
        /// The CEL expression to evaluate
        expression: String,

        /// JSON object of variables (reads from stdin if not provided)
        #[arg(long)]
        vars: Option<String>,

        /// Run the default optimizer passes first
        #[arg(long)]
        optimize: bool,

        /// Also fold constant sub-expressions
        #[arg(long)]
        fold: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Print the syntax tree of an expression
    Parse {
        /// The CEL expression to parse
        expression: String,

        /// Run the default optimizer passes first
        #[arg(long)]
        optimize: bool,

        /// Also fold constant sub-expressions
        #[arg(long)]
        fold: bool,
    },

    /// Print every token, trivia included
    Tokens {
        /// The CEL source to tokenize
        expression: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            expression,
            vars,
            optimize,
            fold,
            pretty,
        } => run_eval(expression, vars, optimize, fold, pretty),
        Commands::Parse {
            expression,
            optimize,
            fold,
        } => run_parse(&expression, optimize, fold),
        Commands::Tokens { expression } => {
            print!("{}", cli::render_tokens(&expression));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_eval(
    expression: String,
    vars: Option<String>,
    optimize: bool,
    fold: bool,
    pretty: bool,
) -> Result<(), CliError> {
    let variables = match vars {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            (!buffer.trim().is_empty()).then_some(buffer)
        }
        None => None,
    };

    let options = EvalOptions {
        expression,
        variables,
        optimize,
        fold,
        pretty,
    };

    let output = cli::execute_eval(&options)?;
    println!("{}", output.rendered);
    Ok(())
}

fn run_parse(expression: &str, optimize: bool, fold: bool) -> Result<(), CliError> {
    let mut expr = Parser::new().parse(expression)?;
    if let Some(optimizer) = cli::optimizer_for(optimize, fold) {
        expr = optimizer.optimize(expr);
    }
    print!("{}", cli::render_ast(&expr));
    Ok(())
}
