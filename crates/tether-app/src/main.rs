mod cli;
mod commands;
mod demo;

use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::parse();

    // Initialize logging
    let log_directive = args.log_level.as_deref().unwrap_or("tether=info");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| "tether=info".parse().expect("static directive")),
            ),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("tether v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match args.command {
        cli::Command::Check { path } => commands::check(path.as_deref()),
        cli::Command::Script { path } => commands::script(path.as_deref()),
        cli::Command::Demo => demo::run(),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
