//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "appshell", about = "App shell coordinator", version)]
pub struct Cli {
    /// Directory holding session.json and cache.db
    #[arg(long, global = true, env = "APPSHELL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Shell manifest (TOML). The built-in manifest is used when absent.
    #[arg(long, global = true, env = "APPSHELL_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Upper bound on the start-destination read before falling back to sign-in
    #[arg(
        long,
        global = true,
        env = "APPSHELL_STARTUP_TIMEOUT_MS",
        default_value = "5000"
    )]
    pub startup_timeout_ms: u64,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run an interactive (or scripted) shell session
    Run(RunOpts),
    /// Print the start destination for the stored session
    Resolve,
    /// Store a session token
    SignIn(SignInOpts),
    /// Clear the session store and local database
    SignOut,
    /// Print the navigation graph
    Graph,
}

#[derive(clap::Args)]
pub struct RunOpts {
    /// Frame interval in milliseconds
    #[arg(long, default_value = "16")]
    pub frame_interval_ms: u64,

    /// Read shell commands from a file instead of stdin
    #[arg(long)]
    pub script: Option<PathBuf>,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            script: None,
        }
    }
}

#[derive(clap::Args)]
pub struct SignInOpts {
    /// Access token to persist
    #[arg(long, env = "APPSHELL_TOKEN", hide_env_values = true)]
    pub token: String,
}

/// Default data directory following XDG conventions.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_DATA_HOME")
        && !dir.is_empty()
    {
        return PathBuf::from(dir).join("appshell");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/share/appshell");
    }
    PathBuf::from(".appshell")
}
