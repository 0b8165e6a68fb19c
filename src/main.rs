use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use splice_calc::{EvalError, Evaluator, Limits};

/// Evaluates arithmetic expressions with grouping, functions, conditionals
/// and loop-sums.
///
/// With no expression, reads one expression per line from standard input.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Expression to evaluate once.
    expression: Option<String>,

    /// Digits printed after the decimal point.
    #[arg(short, long, default_value_t = 2)]
    precision: usize,

    /// Fail instead of recursing deeper than this.
    #[arg(long, env = "SPLICE_CALC_MAX_DEPTH")]
    max_depth: Option<usize>,

    /// Fail a loop that would run more iterations than this.
    #[arg(long, env = "SPLICE_CALC_MAX_ITERATIONS")]
    max_iterations: Option<usize>,

    /// Log level (off/error/warn/info/debug/trace); `RUST_LOG` otherwise.
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

impl Args {
    fn limits(&self) -> Limits {
        Limits {
            max_depth: self.max_depth,
            max_iterations: self.max_iterations,
        }
    }
}

fn init_logger(level: Option<LevelFilter>) {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).try_init().ok();
}

fn report(result: Result<f64, EvalError>, precision: usize) -> bool {
    match result {
        Ok(value) => {
            println!("result: {value:.precision$}");
            true
        }
        Err(err) => {
            eprintln!("error: {err}");
            false
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.log_level);

    let evaluator = Evaluator::<f64>::new().with_limits(args.limits());
    log::debug!("limits: {:?}", evaluator.limits());

    if let Some(expression) = &args.expression {
        return if report(evaluator.evaluate(expression), args.precision) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Expression: ");
        if io::stdout().flush().is_err() {
            return ExitCode::FAILURE;
        }
        match lines.next() {
            Some(Ok(line)) if line.trim().is_empty() => continue,
            Some(Ok(line)) => {
                report(evaluator.evaluate(&line), args.precision);
            }
            Some(Err(err)) => {
                eprintln!("error: failed to read input: {err}");
                return ExitCode::FAILURE;
            }
            None => {
                println!();
                return ExitCode::SUCCESS;
            }
        }
    }
}
