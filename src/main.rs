mod config;
mod http;
mod ip;
mod run;
mod services;
mod util;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use config::Cli;
use http::UreqTransport;
use services::namesilo;

/// Exit code for a run that failed part way, e.g. the registrar rejected an
/// update. clap exits with 2 on bad arguments before anything is sent.
const RUNTIME_ERROR: u8 = 1;

fn log_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
        // ureq logs full request URLs, API key included
        // UNWRAP-SAFETY: the directive is a well-formed constant.
        .add_directive("ureq=warn".parse().unwrap())
}

fn log_subscriber<W>(verbose: bool, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_target(false)
        .with_writer(writer)
        .finish()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout only carries the per-record status lines
    log_subscriber(cli.verbose, io::stderr).init();

    info!(
        "silodyn v{} updating {}{}",
        env!("CARGO_PKG_VERSION"),
        cli.domain,
        if cli.dry_run { " (dry run)" } else { "" }
    );

    let transport = UreqTransport::new(cli.timeout());
    let service = namesilo::Service::new(namesilo::Config::from(&cli), &transport);

    match run::execute(&transport, &cli.endpoints(), &service, &mut io::stdout().lock()) {
        Ok(summary) => {
            info!(
                "Done: {} record(s) updated, {} left untouched",
                summary.updated, summary.untouched
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(RUNTIME_ERROR)
        }
    }
}
