//! appshell: app shell coordinator binary.
//! Hosts the UI context loop, the navigation and unauthorized buses and the
//! session invalidation path in one process.

use clap::Parser;

mod cli;
mod cmd_run;
mod cmd_session;
mod setup;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("APPSHELL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let backends = setup::Backends::open(&args)?;
    let command = args
        .command
        .unwrap_or_else(|| cli::Command::Run(cli::RunOpts::default()));

    match command {
        cli::Command::Run(opts) => {
            tracing::info!("appshell starting");
            cmd_run::cmd_run(backends, opts).await?;
        }
        cli::Command::Resolve => cmd_session::cmd_resolve(&backends).await?,
        cli::Command::SignIn(opts) => cmd_session::cmd_sign_in(&backends, opts.token).await?,
        cli::Command::SignOut => cmd_session::cmd_sign_out(&backends).await?,
        cli::Command::Graph => cmd_session::cmd_graph(&backends)?,
    }

    Ok(())
}
