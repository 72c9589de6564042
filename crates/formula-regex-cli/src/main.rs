use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use formula_regex::functions::{ArgSpec, FunctionSpec};
use formula_regex::{iter_function_specs, EngineConfig, Session, Value};
use serde::Serialize;

mod call;
mod logger;

#[derive(Debug, Parser)]
#[command(name = "formula-regex")]
#[command(about = "Evaluate regex worksheet functions from the command line.")]
struct Cli {
    /// Log to stderr (`-v` debug, `-vv` trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file with engine settings (e.g. `{"backtrackLimit": 10000}`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `backtrackLimit` from `--config`.
    #[arg(long, global = true)]
    backtrack_limit: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate one call such as `REGEXMATCHES("a1b2", "\d", , , ";")`.
    Eval(EvalArgs),
    /// List the registered functions.
    List,
}

#[derive(Debug, Parser)]
struct EvalArgs {
    expr: String,

    /// Print `{"value": ..., "error": ...}` instead of the plain result.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct EvalReport {
    value: Option<serde_json::Value>,
    error: Option<&'static str>,
}

impl EvalReport {
    fn from_value(value: &Value) -> Self {
        let json = match value {
            Value::Error(kind) => {
                return Self {
                    value: None,
                    error: Some(kind.as_code()),
                }
            }
            Value::Number(n) => serde_json::json!(n),
            Value::Text(s) => serde_json::json!(s),
            Value::Bool(b) => serde_json::json!(b),
            Value::Blank | Value::Missing => serde_json::Value::Null,
        };
        Self {
            value: Some(json),
            error: None,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logger::init(cli.verbose)?;

    match &cli.command {
        Command::Eval(args) => {
            let config = load_config(cli.config.as_deref(), cli.backtrack_limit)?;
            eval(&Session::new(config), args)
        }
        Command::List => {
            list();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>, backtrack_limit: Option<usize>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if let Some(limit) = backtrack_limit {
        config.backtrack_limit = limit;
    }
    log::debug!("engine config: {config:?}");
    Ok(config)
}

fn eval(session: &Session, args: &EvalArgs) -> Result<ExitCode> {
    let call = call::parse_call(&args.expr).with_context(|| format!("parse `{}`", args.expr))?;
    let value = session.call(&call.name, &call.args);

    if args.json {
        println!("{}", serde_json::to_string(&EvalReport::from_value(&value))?);
    } else {
        println!("{value}");
    }

    Ok(if value.is_error() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn list() {
    let mut specs: Vec<&FunctionSpec> = iter_function_specs().collect();
    specs.sort_by_key(|spec| spec.name);
    for spec in specs {
        println!("{}({})\t{}", spec.name, signature(spec.args), spec.description);
    }
}

fn signature(args: &[ArgSpec]) -> String {
    args.iter()
        .map(|arg| {
            if arg.optional {
                format!("[{}]", arg.name)
            } else {
                arg.name.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
