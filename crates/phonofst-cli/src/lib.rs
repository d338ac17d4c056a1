// phonofst-cli: shared utilities for CLI tools.

use std::io::{self, Write};
use std::process;

use phonofst_model::{ModelConfig, PhoneticModel, Ranking};

/// Environment variable naming a JSON model configuration.
pub const CONFIG_ENV: &str = "PHONOFST_CONFIG";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "PHONOFST_LOG";

/// Number of rank thresholds in a recall curve.
pub const NUM_RANKS: usize = 128;

/// Install a stderr log subscriber filtered by `PHONOFST_LOG` (default `warn`).
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .try_init();
}

/// Resolve the model configuration.
///
/// Search order:
/// 1. `config_path` argument (if provided)
/// 2. `PHONOFST_CONFIG` environment variable
/// 3. The built-in Finnish -> English preset
pub fn load_config(config_path: Option<&str>) -> Result<ModelConfig, String> {
    let path = config_path
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_ENV).ok());
    let Some(path) = path else {
        tracing::info!("using built-in finnish-to-english configuration");
        return Ok(ModelConfig::finnish_to_english());
    };
    let json = std::fs::read_to_string(&path).map_err(|e| format!("failed to read {path}: {e}"))?;
    ModelConfig::from_json(&json).map_err(|e| format!("{path}: {e}"))
}

/// Load a compiled model file, or build a model from configuration.
pub fn load_model(
    model_path: Option<&str>,
    config_path: Option<&str>,
) -> Result<PhoneticModel, String> {
    if let Some(path) = model_path {
        let data = std::fs::read(path).map_err(|e| format!("failed to read {path}: {e}"))?;
        return PhoneticModel::from_bytes(&data).map_err(|e| format!("{path}: {e}"));
    }
    let config = load_config(config_path)?;
    PhoneticModel::build(&config).map_err(|e| format!("failed to build model: {e}"))
}

/// Remove `--NAME=VALUE`, `--NAME VALUE` or `-S VALUE` from `args`.
///
/// Returns `(value, remaining_args)`.
pub fn take_value(args: &[String], long: &str, short: &str) -> (Option<String>, Vec<String>) {
    let long_eq = format!("{long}=");
    let mut value = None;
    let mut remaining = Vec::new();
    let mut skip_next = false;

    for (i, arg) in args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if let Some(val) = arg.strip_prefix(&long_eq) {
            value = Some(val.to_string());
        } else if arg == long || arg == short {
            if i + 1 < args.len() {
                value = Some(args[i + 1].clone());
                skip_next = true;
            } else {
                fatal(&format!("{arg} requires a value"));
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    (value, remaining)
}

/// Parse the `-n`/`--results` count, falling back to `default`.
pub fn take_count(args: &[String], default: usize) -> (usize, Vec<String>) {
    let (value, remaining) = take_value(args, "--results", "-n");
    let count = match value {
        Some(v) => v
            .parse()
            .unwrap_or_else(|_| fatal(&format!("invalid result count: {v}"))),
        None => default,
    };
    (count, remaining)
}

/// Write a ranking: the query line, then one `Match <candidate> <cost>` line
/// per candidate, or `No results!`.
pub fn write_ranking(out: &mut impl Write, ranking: &Ranking) -> io::Result<()> {
    writeln!(out, "{}", ranking.query)?;
    if ranking.is_empty() {
        writeln!(out, "No results!")?;
    }
    for c in &ranking.candidates {
        writeln!(out, "Match {} {}", c.text, c.cost)?;
    }
    Ok(())
}

/// Cumulative recall at each rank threshold.
#[derive(Debug, Clone)]
pub struct RecallCurve {
    hits: Vec<usize>,
    queries: usize,
}

impl RecallCurve {
    pub fn new(ranks: usize) -> Self {
        Self {
            hits: vec![0; ranks],
            queries: 0,
        }
    }

    /// Count one query whose correct answer sits at `rank` (or nowhere).
    pub fn record(&mut self, rank: Option<usize>) {
        self.queries += 1;
        if let Some(slot) = rank.and_then(|r| self.hits.get_mut(r)) {
            *slot += 1;
        }
    }

    pub fn queries(&self) -> usize {
        self.queries
    }

    /// Fraction of queries answered at or before each rank.
    pub fn cumulative(&self) -> Vec<f64> {
        let mut total = 0;
        self.hits
            .iter()
            .map(|&h| {
                total += h;
                if self.queries == 0 {
                    0.0
                } else {
                    total as f64 / self.queries as f64
                }
            })
            .collect()
    }
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}
