use fanprobe_core::logging;

mod cli;

use crate::cli::Cli;
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let directive = cli.log_directive();
    if let Err(err) = logging::init_logging(directive, cli.log_file.as_deref()) {
        logging::init_logging_stderr(directive);
        tracing::warn!("{:#}; logging to stderr", err);
    }

    let code = match cli.run().await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            1
        }
    };
    std::process::exit(code);
}
