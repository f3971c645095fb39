use tracing_subscriber::EnvFilter;

const WHITELISTED_CRATES: &[&str] = &["hookbridge", "hookbridge_transformer", "hookbridge_config"];

pub(crate) fn default_env_filter(level: &str) -> String {
    let mut filters: Vec<String> = WHITELISTED_CRATES
        .iter()
        .map(|crate_name| format!("{crate_name}={level}"))
        .collect();

    // Set default level for all other crates to warn
    filters.insert(0, "warn".to_string());

    filters.join(",")
}

pub(crate) fn init_cli_logger(quiet: bool, verbose: u8) {
    let level_str = if quiet {
        "warn"
    } else if verbose == 0 {
        "info"
    } else if verbose == 1 {
        "debug"
    } else {
        "trace"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_env_filter(level_str)));

    let result = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();

    if let Err(e) = result {
        eprintln!("hookbridge: Failed initializing logger: {e:?}");
    }
}
