// phonofst-eval: Recall curve of a model over a labelled query file.
//
// Reads `query<TAB>correct` lines from FILE (or stdin), ranks every query
// and prints the cumulative recall at each rank threshold:
//   <rank>\t<fraction of queries answered at or before rank>
// Ranks are 1-based in the output. Ties with the correct answer's cost count
// against it.
//
// Usage:
//   phonofst-eval [-c CONFIG] [-m MODEL] [-n RANKS] [FILE]
//
// Options:
//   -c, --config PATH    JSON model configuration (default: $PHONOFST_CONFIG or preset)
//   -m, --model PATH     Compiled model file (overrides --config)
//   -n, --results N      Number of rank thresholds (default 128)
//   -v, --verbose        Also print each query's rank
//   -h, --help           Print help

use std::io::{self, BufRead, Write};

use phonofst_cli::RecallCurve;

fn main() {
    phonofst_cli::init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if phonofst_cli::wants_help(&args) {
        println!("phonofst-eval: Recall curve of a model over a labelled query file.");
        println!();
        println!("Usage: phonofst-eval [-c CONFIG] [-m MODEL] [-n RANKS] [FILE]");
        println!();
        println!("Input lines: query<TAB>correct. Output lines: rank<TAB>recall.");
        println!();
        println!("Options:");
        println!("  -c, --config PATH    JSON model configuration");
        println!("  -m, --model PATH     Compiled model file (overrides --config)");
        println!("  -n, --results N      Number of rank thresholds (default 128)");
        println!("  -v, --verbose        Also print each query's rank");
        println!("  -h, --help           Print this help");
        return;
    }

    let (config_path, args) = phonofst_cli::take_value(&args, "--config", "-c");
    let (model_path, args) = phonofst_cli::take_value(&args, "--model", "-m");
    let (ranks, args) = phonofst_cli::take_count(&args, phonofst_cli::NUM_RANKS);
    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    let file = args.iter().find(|a| !a.starts_with('-'));

    let lines: Vec<String> = match file {
        Some(path) => std::fs::read_to_string(path)
            .unwrap_or_else(|e| phonofst_cli::fatal(&format!("failed to read {path}: {e}")))
            .lines()
            .map(str::to_string)
            .collect(),
        None => io::stdin().lock().lines().map_while(Result::ok).collect(),
    };

    let mut queries = Vec::new();
    let mut answers = Vec::new();
    for line in &lines {
        let Some((query, correct)) = line.split_once('\t') else {
            if !line.trim().is_empty() {
                eprintln!("skipping malformed line: {line}");
            }
            continue;
        };
        queries.push(query.trim().to_lowercase());
        answers.push(correct.trim().to_lowercase());
    }

    let model = phonofst_cli::load_model(model_path.as_deref(), config_path.as_deref())
        .unwrap_or_else(|e| phonofst_cli::fatal(&e));

    let rankings = model.rank_many(&queries, ranks);

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut curve = RecallCurve::new(ranks);
    for (ranking, correct) in rankings.iter().zip(&answers) {
        let rank = ranking.rank_of(correct);
        if verbose {
            let shown = rank.map_or_else(|| "-".to_string(), |r| r.to_string());
            let _ = writeln!(out, "# {}\t{correct}\t{shown}", ranking.query);
        }
        curve.record(rank);
    }

    tracing::info!(queries = curve.queries(), "evaluated");
    for (i, recall) in curve.cumulative().iter().enumerate() {
        let _ = writeln!(out, "{}\t{recall:.4}", i + 1);
    }
    let _ = out.flush();
}
