// phonofst-pair: Check whether the model relates pairs of words.
//
// Reads `source target` pairs from stdin (one pair per line, separated by
// whitespace) and prints for each:
//   Match!
//   <cost>
// or `None!` when the model does not relate the two words.
//
// Usage:
//   phonofst-pair [-c CONFIG] [-m MODEL]
//
// Options:
//   -c, --config PATH    JSON model configuration (default: $PHONOFST_CONFIG or preset)
//   -m, --model PATH     Compiled model file (overrides --config)
//   -h, --help           Print help

use std::io::{self, BufRead, Write};

fn main() {
    phonofst_cli::init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if phonofst_cli::wants_help(&args) {
        println!("phonofst-pair: Check whether the model relates pairs of words.");
        println!();
        println!("Usage: phonofst-pair [-c CONFIG] [-m MODEL]");
        println!();
        println!("Reads `source target` pairs from stdin. Prints `Match!` and the");
        println!("cheapest cost, or `None!`.");
        println!();
        println!("Options:");
        println!("  -c, --config PATH    JSON model configuration");
        println!("  -m, --model PATH     Compiled model file (overrides --config)");
        println!("  -h, --help           Print this help");
        return;
    }

    let (config_path, args) = phonofst_cli::take_value(&args, "--config", "-c");
    let (model_path, _args) = phonofst_cli::take_value(&args, "--model", "-m");

    let model = phonofst_cli::load_model(model_path.as_deref(), config_path.as_deref())
        .unwrap_or_else(|e| phonofst_cli::fatal(&e));

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error reading stdin: {e}");
                break;
            }
        };
        let mut words = line.split_whitespace();
        let (Some(source), Some(target)) = (words.next(), words.next()) else {
            if !line.trim().is_empty() {
                eprintln!("skipping malformed line: {line}");
            }
            continue;
        };

        match model.score(&source.to_lowercase(), &target.to_lowercase()) {
            Some(cost) => {
                let _ = writeln!(out, "Match!");
                let _ = writeln!(out, "{cost}");
            }
            None => {
                let _ = writeln!(out, "None!");
            }
        }
    }
    let _ = out.flush();
}
