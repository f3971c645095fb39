mod commands;
mod logger;

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::error;

#[derive(Parser)]
#[command(name = "hookbridge")]
#[command(version)]
#[command(about = "Generic-webhook transformation tooling")]
#[command(
    long_about = "Hookbridge translates inbound webhook deliveries into chat messages via \
operator-authored JavaScript transformation scripts. Scripts run in a sandboxed V8 isolate \
with a hard execution deadline and no I/O access.\n\n\
Use `validate` for authoring-time feedback on a script and `run` to execute one against a \
JSON payload the way the bridge would on a live delivery."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path; when given, `run` honors its generic-webhooks gates
    #[arg(long, short = 'c', global = true)]
    config: Option<Utf8PathBuf>,

    /// No logging except for errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Verbose logging (-v) or trace logging (-vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile-check a transformation script without running it
    #[command(
        long_about = "Compiles the script the way the bridge does when an operator saves a \
transformation, without evaluating it. Prints nothing and exits 0 on success; prints the \
compile diagnostic and exits 1 otherwise."
    )]
    Validate(commands::ValidateCmd),

    /// Run a transformation script against a webhook payload
    #[command(
        long_about = "Executes the script in the sandbox against the given JSON payload, \
validates the result against the v2 contract, and prints the interpreted outcome."
    )]
    Run(commands::RunCmd),

    /// Show version information
    Version,
}

impl Cli {
    async fn handle(&self) -> Result<()> {
        match &self.command {
            Commands::Validate(cmd) => cmd.handle().await,
            Commands::Run(cmd) => cmd.handle(self.config.as_ref()).await,
            Commands::Version => {
                println!("hookbridge {}", hookbridge_transformer::version());
                Ok(())
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.quiet, cli.verbose);

    if let Err(e) = cli.handle().await {
        error!("{e:#}");
        std::process::exit(1);
    }
}
