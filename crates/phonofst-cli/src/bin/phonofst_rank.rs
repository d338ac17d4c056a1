// phonofst-rank: Rank target-language spellings for words from stdin.
//
// Reads query words from stdin (one per line) and prints, for each query:
//   <query>
//   Match <candidate> <cost>     (one line per candidate, cheapest first)
// or `No results!` when nothing matches.
//
// Usage:
//   phonofst-rank [-c CONFIG] [-m MODEL] [-n COUNT]
//
// Options:
//   -c, --config PATH    JSON model configuration (default: $PHONOFST_CONFIG or preset)
//   -m, --model PATH     Compiled model file (overrides --config)
//   -n, --results N      Number of candidates per query (default 10)
//   -h, --help           Print help

use std::io::{self, BufRead, Write};

fn main() {
    phonofst_cli::init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if phonofst_cli::wants_help(&args) {
        println!("phonofst-rank: Rank target-language spellings for words from stdin.");
        println!();
        println!("Usage: phonofst-rank [-c CONFIG] [-m MODEL] [-n COUNT]");
        println!();
        println!("Reads words from stdin (one per line). Prints the query, then");
        println!("  Match <candidate> <cost>");
        println!("per candidate, or `No results!`.");
        println!();
        println!("Options:");
        println!("  -c, --config PATH    JSON model configuration");
        println!("  -m, --model PATH     Compiled model file (overrides --config)");
        println!("  -n, --results N      Number of candidates per query (default 10)");
        println!("  -h, --help           Print this help");
        return;
    }

    let (config_path, args) = phonofst_cli::take_value(&args, "--config", "-c");
    let (model_path, args) = phonofst_cli::take_value(&args, "--model", "-m");
    let (count, _args) = phonofst_cli::take_count(&args, 10);

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
        let word = line.trim().to_lowercase();
        if word.is_empty() {
            continue;
        }

        let ranking = model.rank(&word, count);
        if ranking.status != phonofst::SearchStatus::Complete {
            tracing::warn!(query = %word, status = ?ranking.status, "search truncated");
        }
        let _ = phonofst_cli::write_ranking(&mut out, &ranking);
    }
    let _ = out.flush();
}
