//! One-shot session subcommands: resolve, sign-in, sign-out, graph.

use std::sync::Arc;

use appshell_core::Token;
use appshell_store::SessionStore;

use appshell_runtime::invalidator::clear_local_state;
use appshell_runtime::{BackgroundTasks, StartResolver};

use crate::setup::Backends;

pub async fn cmd_resolve(backends: &Backends) -> anyhow::Result<()> {
    let resolution = StartResolver::new(
        backends.session.clone(),
        BackgroundTasks::new(),
        backends.manifest.start.clone(),
    )
    .with_timeout(backends.startup_timeout)
    .resolve()
    .await;

    match resolution.fallback {
        Some(reason) => println!("{} (fallback: {reason})", resolution.destination),
        None => println!("{}", resolution.destination),
    }
    Ok(())
}

pub async fn cmd_sign_in(backends: &Backends, token: String) -> anyhow::Result<()> {
    let session = Arc::clone(&backends.session);
    tokio::task::spawn_blocking(move || session.write_token(&Token::new(token))).await??;
    println!("signed in ({})", backends.session.path().display());
    Ok(())
}

pub async fn cmd_sign_out(backends: &Backends) -> anyhow::Result<()> {
    let session = Arc::clone(&backends.session);
    let database = Arc::clone(&backends.database);
    let ok = tokio::task::spawn_blocking(move || clear_local_state(database.as_ref(), session.as_ref()))
        .await?;
    if !ok {
        anyhow::bail!("sign-out left local data behind, see log");
    }
    println!("signed out");
    Ok(())
}

pub fn cmd_graph(backends: &Backends) -> anyhow::Result<()> {
    let manifest = &backends.manifest;
    let graph = manifest.graph()?;
    let tabs = manifest.bottom_navigation();

    println!(
        "start: signed_in={} signed_out={}",
        manifest.start.signed_in, manifest.start.signed_out
    );
    println!("{:<12} {:<14} {:<6} {:<10} TAB", "ID", "LABEL", "BARS", "BOTTOM_NAV");
    for dest in graph.destinations() {
        let tab = if dest.id == *tabs.root() {
            "root"
        } else if tabs.contains(&dest.id) {
            "yes"
        } else {
            ""
        };
        println!(
            "{:<12} {:<14} {:<6} {:<10} {tab}",
            dest.id.as_str(),
            dest.label,
            if dest.meta.light_bars { "light" } else { "dark" },
            if dest.meta.bottom_navigation_visible { "shown" } else { "hidden" },
        );
    }
    Ok(())
}
