//! `appshell run`: drive a shell session from stdin or a script file.
//!
//! One line per command:
//!
//! ```text
//! go <id>              publish navigate(<id>) on the navigation bus
//! pop                  publish pop_back_stack
//! pop-to <id> [incl]   publish pop_back_stack_to(<id>), inclusive with "incl"
//! tab <id>             tap a bottom navigation item
//! root                 return to the top of the root tab
//! back                 system back (closes the shell at the root)
//! pause | resume       move the UI context out of / into the foreground
//! frame                request one frame
//! notify <title>       post a notification
//! cache <key> <value>  write a cached entry to the local database
//! sign-in <token>      persist a session token
//! unauthorized         publish an unauthorized event
//! state                print the live context
//! sleep <ms>           pause the script
//! quit                 close the shell
//! ```

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use appshell_core::{DestinationId, NavigationCommand, Token};
use appshell_store::SessionStore;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use appshell_runtime::{
    ContextSnapshot, Delivery, Services, Shell, ShellEvent, UiInput, UnauthorizedEvent,
};

use crate::cli::RunOpts;
use crate::setup::Backends;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine {
    Go(DestinationId),
    Pop,
    PopTo { id: DestinationId, inclusive: bool },
    Tab(DestinationId),
    Root,
    Back,
    Pause,
    Resume,
    Frame,
    Notify(String),
    Cache { key: String, value: String },
    SignIn(String),
    Unauthorized,
    State,
    Sleep(Duration),
    Quit,
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> anyhow::Result<Option<ScriptLine>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let arg = |what: &str| -> anyhow::Result<String> {
        if rest.is_empty() {
            bail!("{word}: missing {what}");
        }
        Ok(rest.to_string())
    };

    let parsed = match word {
        "go" => ScriptLine::Go(DestinationId::new(arg("destination")?)),
        "pop" => ScriptLine::Pop,
        "pop-to" => {
            let mut parts = rest.split_whitespace();
            let Some(id) = parts.next() else {
                bail!("pop-to: missing destination");
            };
            let inclusive = match parts.next() {
                None => false,
                Some("incl" | "inclusive") => true,
                Some(other) => bail!("pop-to: unexpected argument {other:?}"),
            };
            ScriptLine::PopTo {
                id: DestinationId::new(id),
                inclusive,
            }
        }
        "tab" => ScriptLine::Tab(DestinationId::new(arg("item")?)),
        "root" => ScriptLine::Root,
        "back" => ScriptLine::Back,
        "pause" => ScriptLine::Pause,
        "resume" => ScriptLine::Resume,
        "frame" => ScriptLine::Frame,
        "notify" => ScriptLine::Notify(arg("title")?),
        "cache" => {
            let Some((key, value)) = rest.split_once(char::is_whitespace) else {
                bail!("cache: expected <key> <value>");
            };
            ScriptLine::Cache {
                key: key.to_string(),
                value: value.trim().to_string(),
            }
        }
        "sign-in" => ScriptLine::SignIn(arg("token")?),
        "unauthorized" => ScriptLine::Unauthorized,
        "state" => ScriptLine::State,
        "sleep" => {
            let ms: u64 = arg("milliseconds")?
                .parse()
                .context("sleep: expected milliseconds")?;
            ScriptLine::Sleep(Duration::from_millis(ms))
        }
        "quit" | "exit" => ScriptLine::Quit,
        other => bail!("unknown command {other:?}"),
    };
    Ok(Some(parsed))
}

pub async fn cmd_run(backends: Backends, opts: RunOpts) -> anyhow::Result<()> {
    let services = backends.services()?;
    let shell = Shell::new(services.clone()).context("manifest does not fit the start policy")?;
    let events = services.events.subscribe();
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (ready_tx, _) = watch::channel(false);
    let ready = Arc::new(ready_tx);

    println!(
        "appshell: data dir {}, {} destinations",
        backends.data_dir.display(),
        backends.manifest.destinations.len()
    );

    let lines = match opts.script.as_deref() {
        Some(path) => script_lines(path).await?,
        None => stdin_lines(),
    };
    let printer = tokio::spawn(print_events(events, Arc::clone(&ready)));
    let ticker = tokio::spawn(tick_frames(
        input_tx.clone(),
        Duration::from_millis(opts.frame_interval_ms.max(1)),
    ));

    let generations = {
        let driver = Driver {
            services: services.clone(),
            backends: &backends,
            input: input_tx.clone(),
            ready: Arc::clone(&ready),
            echo: opts.script.is_some(),
        };
        let shell = shell.run(input_rx);
        let reader = async {
            let result = driver.run_lines(lines).await;
            driver.send(UiInput::Close);
            result
        };
        tokio::pin!(shell);
        tokio::pin!(reader);

        let mut reader_done = false;
        let mut interrupted = false;
        loop {
            tokio::select! {
                generations = &mut shell => break generations,
                result = &mut reader, if !reader_done => {
                    reader_done = true;
                    if let Err(e) = result {
                        tracing::warn!("shell input failed: {e:#}");
                    }
                }
                signal = tokio::signal::ctrl_c(), if !interrupted => {
                    interrupted = true;
                    if let Err(e) = signal {
                        tracing::warn!("failed to listen for ctrl-c: {e}");
                    } else {
                        tracing::info!("received ctrl-c, closing shell");
                        let _ = input_tx.send(UiInput::Close);
                    }
                }
            }
        }
    };

    ticker.abort();
    if tokio::time::timeout(Duration::from_secs(5), services.background.wait_idle())
        .await
        .is_err()
    {
        tracing::warn!("background cleanup still running at exit");
    }

    // The printer ends once the last event sender is gone.
    drop(services);
    if tokio::time::timeout(Duration::from_secs(1), printer).await.is_err() {
        tracing::debug!("event printer did not drain in time");
    }

    println!("appshell: stopped after {generations} context(s)");
    Ok(())
}

/// Stdin is read on a plain thread so a pending read never holds up
/// runtime shutdown.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn script_lines(path: &Path) -> anyhow::Result<mpsc::UnboundedReceiver<String>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let (tx, rx) = mpsc::unbounded_channel();
    for line in text.lines() {
        let _ = tx.send(line.to_string());
    }
    Ok(rx)
}

struct Driver<'a> {
    services: Services,
    backends: &'a Backends,
    input: mpsc::UnboundedSender<UiInput>,
    ready: Arc<watch::Sender<bool>>,
    echo: bool,
}

impl Driver<'_> {
    async fn run_lines(&self, mut lines: mpsc::UnboundedReceiver<String>) -> anyhow::Result<()> {
        while let Some(line) = lines.recv().await {
            let parsed = match parse_line(&line) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => continue,
                Err(e) => {
                    println!("error: {e:#}");
                    continue;
                }
            };
            if self.echo {
                println!("> {}", line.trim());
            }

            // Wait for a live, started context so scripts stay deterministic
            // across relaunches.
            let mut ready = self.ready.subscribe();
            if ready.wait_for(|r| *r).await.is_err() {
                break;
            }
            if !self.execute(parsed).await? {
                break;
            }
        }
        Ok(())
    }

    /// Returns `false` once the shell should stop reading.
    async fn execute(&self, line: ScriptLine) -> anyhow::Result<bool> {
        let services = &self.services;
        match line {
            ScriptLine::Go(id) => self.publish(NavigationCommand::navigate(id)),
            ScriptLine::Pop => self.publish(NavigationCommand::pop_back_stack()),
            ScriptLine::PopTo { id, inclusive } => {
                self.publish(NavigationCommand::pop_back_stack_to(id, inclusive));
            }
            ScriptLine::Tab(id) => self.send(UiInput::Tap(id)),
            ScriptLine::Root => self.send(UiInput::ReturnToRoot),
            ScriptLine::Back => self.send(UiInput::Back),
            ScriptLine::Pause => self.send(UiInput::Pause),
            ScriptLine::Resume => self.send(UiInput::Resume),
            ScriptLine::Frame => self.send(UiInput::Frame),
            ScriptLine::Notify(title) => {
                let id = self.backends.notifier.post(title);
                println!("notification #{id} posted");
            }
            ScriptLine::Cache { key, value } => {
                let database = Arc::clone(&self.backends.database);
                tokio::task::spawn_blocking(move || database.put_cached(&key, &value))
                    .await
                    .context("cache worker failed")??;
            }
            ScriptLine::SignIn(token) => {
                let session = Arc::clone(&self.backends.session);
                tokio::task::spawn_blocking(move || session.write_token(&Token::new(token)))
                    .await
                    .context("session worker failed")??;
                println!("token stored");
            }
            ScriptLine::Unauthorized => {
                // The context is about to go away; hold further lines until
                // its replacement is up.
                self.ready.send_replace(false);
                if services.unauthorized.publish(UnauthorizedEvent) == Delivery::Dropped {
                    println!("unauthorized event dropped: no live context");
                    self.ready.send_replace(true);
                }
            }
            ScriptLine::State => {
                let (tx, rx) = oneshot::channel();
                self.send(UiInput::Inspect(tx));
                match rx.await {
                    Ok(snapshot) => print_snapshot(&snapshot),
                    Err(_) => println!("no live context"),
                }
            }
            ScriptLine::Sleep(duration) => tokio::time::sleep(duration).await,
            ScriptLine::Quit => {
                self.send(UiInput::Close);
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn publish(&self, command: NavigationCommand) {
        let label = command.label().to_string();
        if self.services.navigation.publish(command) == Delivery::Dropped {
            println!("{label}: dropped, no live context");
        }
    }

    fn send(&self, msg: UiInput) {
        if self.input.send(msg).is_err() {
            tracing::debug!("shell input closed");
        }
    }
}

async fn tick_frames(input: mpsc::UnboundedSender<UiInput>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        if input.send(UiInput::Frame).is_err() {
            break;
        }
    }
}

/// Print the transcript. Frames are summarized once per context.
async fn print_events(mut events: broadcast::Receiver<ShellEvent>, ready: Arc<watch::Sender<bool>>) {
    let mut suspended = 0u64;
    let mut drawn = false;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "event printer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        match event {
            ShellEvent::ContextLaunched { generation } => {
                suspended = 0;
                drawn = false;
                println!("[context {generation}] launched");
            }
            ShellEvent::StartResolved {
                destination,
                fallback,
            } => {
                let note = if fallback { " (fallback)" } else { "" };
                println!("start destination: {destination}{note}");
            }
            ShellEvent::SplashReleased => {
                println!("splash released");
                ready.send_replace(true);
            }
            ShellEvent::FrameSuspended => suspended += 1,
            ShellEvent::FrameDrawn { destination } => {
                if !drawn {
                    drawn = true;
                    let shown = destination.map_or_else(|| "-".to_string(), |d| d.to_string());
                    println!("first frame: {shown} ({suspended} suspended)");
                }
            }
            ShellEvent::DestinationChanged {
                destination,
                chrome,
            } => println!(
                "-> {destination} [bars={}, bottom_nav={}]",
                chrome.system_bars,
                if chrome.bottom_navigation_visible { "shown" } else { "hidden" }
            ),
            ShellEvent::CommandApplied { seq, label } => println!("#{seq} {label}: ok"),
            ShellEvent::CommandFailed { seq, label, reason } => {
                println!("#{seq} {label}: failed: {reason}");
            }
            ShellEvent::TabSelected { item } => println!("tab {item} selected"),
            ShellEvent::TabRejected { item, reason } => println!("tab {item} rejected: {reason}"),
            ShellEvent::UnauthorizedIgnored => println!("unauthorized ignored (finishing)"),
            ShellEvent::SessionInvalidated => println!("session invalidated"),
            ShellEvent::CleanupFinished { ok } => {
                println!("local data cleared{}", if ok { "" } else { " with errors" });
            }
            ShellEvent::ContextDestroyed {
                generation,
                restart,
            } => {
                ready.send_replace(false);
                let suffix = if restart { ", restarting" } else { "" };
                println!("[context {generation}] destroyed{suffix}");
            }
        }
    }
}

fn print_snapshot(snapshot: &ContextSnapshot) {
    let stack: Vec<&str> = snapshot.back_stack.iter().map(DestinationId::as_str).collect();
    println!(
        "context {} {} splash={} stack=[{}] tab={}",
        snapshot.generation,
        snapshot.phase,
        if snapshot.splash_ready { "released" } else { "held" },
        stack.join(", "),
        snapshot
            .selected_tab
            .as_ref()
            .map_or("-", DestinationId::as_str),
    );
}
