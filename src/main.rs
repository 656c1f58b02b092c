use std::process::ExitCode;

use clap::Parser;
use confpatch::PatchError;
use confpatch::cli::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "confpatch=debug"
    } else {
        "confpatch=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = cli
        .settings_loader()
        .load()
        .and_then(|settings| confpatch::ops::run(&cli.into_action(), &settings));

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &PatchError) {
    eprintln!("error: {err}");
    if let PatchError::UnknownKeys(keys) = err {
        for key in keys {
            eprintln!("  {key}");
        }
    }
}
