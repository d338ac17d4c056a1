// phonofst-compile: Build a model and write it to a model file.
//
// Usage:
//   phonofst-compile [-c CONFIG] OUTPUT
//   phonofst-compile --dump-config
//
// Options:
//   -c, --config PATH    JSON model configuration (default: $PHONOFST_CONFIG or preset)
//   --dump-config        Print the resolved configuration as JSON and exit
//   -h, --help           Print help

fn main() {
    phonofst_cli::init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();

    if phonofst_cli::wants_help(&args) {
        println!("phonofst-compile: Build a model and write it to a model file.");
        println!();
        println!("Usage: phonofst-compile [-c CONFIG] OUTPUT");
        println!("       phonofst-compile [-c CONFIG] --dump-config");
        println!();
        println!("Options:");
        println!("  -c, --config PATH    JSON model configuration");
        println!("  --dump-config        Print the resolved configuration as JSON and exit");
        println!("  -h, --help           Print this help");
        return;
    }

    let (config_path, args) = phonofst_cli::take_value(&args, "--config", "-c");
    let config = phonofst_cli::load_config(config_path.as_deref())
        .unwrap_or_else(|e| phonofst_cli::fatal(&e));

    if args.iter().any(|a| a == "--dump-config") {
        let json = config
            .to_json()
            .unwrap_or_else(|e| phonofst_cli::fatal(&e.to_string()));
        println!("{json}");
        return;
    }

    let Some(output) = args.iter().find(|a| !a.starts_with('-')) else {
        phonofst_cli::fatal("missing OUTPUT path (see --help)");
    };

    let model = phonofst_model::PhoneticModel::build(&config)
        .unwrap_or_else(|e| phonofst_cli::fatal(&format!("failed to build model: {e}")));
    let bytes = model
        .to_bytes()
        .unwrap_or_else(|e| phonofst_cli::fatal(&e.to_string()));
    std::fs::write(output, &bytes)
        .unwrap_or_else(|e| phonofst_cli::fatal(&format!("failed to write {output}: {e}")));

    eprintln!(
        "wrote {output}: {} states, {} transitions, {} bytes",
        model.relation().num_states(),
        model.relation().num_transitions(),
        bytes.len()
    );
}
