//! One UI context: the task that owns the nav host for a single launch.
//!
//! Everything the host touches is mutated from this task only. Other tasks
//! reach it through the two buses and the `UiInput` channel.

use std::future::pending;

use appshell_core::{DestinationId, NavError, PreDrawObservers, SplashGate};
use tokio::sync::{mpsc, oneshot};

use crate::bus::BusConsumer;
use crate::events::{ShellEvent, emit};
use crate::invalidator::SessionInvalidator;
use crate::lifecycle::{Lifecycle, Phase};
use crate::navigation::NavHost;
use crate::shell::Services;
use crate::startup::{Resolution, StartResolver};

/// Platform input delivered to the live context.
#[derive(Debug)]
pub enum UiInput {
    /// The platform is about to draw a frame.
    Frame,
    Tap(DestinationId),
    Back,
    Pause,
    Resume,
    ReturnToRoot,
    Inspect(oneshot::Sender<ContextSnapshot>),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextExit {
    Closed,
    /// Closed by session invalidation; a fresh context must be launched.
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
    pub generation: u64,
    pub phase: Phase,
    pub splash_ready: bool,
    pub current: Option<DestinationId>,
    pub back_stack: Vec<DestinationId>,
    pub selected_tab: Option<DestinationId>,
}

pub struct UiContext {
    generation: u64,
    services: Services,
    lifecycle: Lifecycle,
    pre_draw: PreDrawObservers,
    splash: SplashGate,
    host: Option<NavHost>,
    invalidator: SessionInvalidator,
}

impl UiContext {
    pub fn new(generation: u64, services: Services) -> Self {
        let mut pre_draw = PreDrawObservers::new();
        // Installed before anything can request a frame.
        let splash = SplashGate::install(&mut pre_draw);
        let invalidator = SessionInvalidator::new(
            services.session.clone(),
            services.database.clone(),
            services.notifier.clone(),
            services.background.clone(),
            services.events.clone(),
        );
        Self {
            generation,
            services,
            lifecycle: Lifecycle::new(),
            pre_draw,
            splash,
            host: None,
            invalidator,
        }
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub async fn run(mut self, input: &mut mpsc::UnboundedReceiver<UiInput>) -> ContextExit {
        let mut unauthorized = self.services.unauthorized.attach();
        let mut commands = self.services.navigation.attach();
        if unauthorized.is_none() || commands.is_none() {
            tracing::warn!(generation = self.generation, "bus already has a consumer");
        }
        tracing::info!(generation = self.generation, "ui context launched");
        emit(
            &self.services.events,
            ShellEvent::ContextLaunched {
                generation: self.generation,
            },
        );

        let resolver = StartResolver::new(
            self.services.session.clone(),
            self.services.background.clone(),
            self.services.start_policy.clone(),
        )
        .with_timeout(self.services.startup_timeout);
        let startup = resolver.resolve();
        tokio::pin!(startup);
        let mut resolving = true;

        self.lifecycle.resume();

        while !self.lifecycle.is_finishing() {
            let consuming = self.host.is_some() && self.lifecycle.is_resumed();
            tokio::select! {
                biased;

                resolution = &mut startup, if resolving => {
                    resolving = false;
                    self.on_start_resolved(resolution);
                }

                Some(_event) = next(&mut unauthorized) => {
                    self.invalidator.handle(&self.lifecycle);
                }

                Some(command) = next(&mut commands), if consuming => {
                    if let Some(host) = self.host.as_mut() {
                        // Failures are logged and reported by the host.
                        let _ = host.apply(command);
                    }
                }

                msg = input.recv() => match msg {
                    Some(msg) => self.on_input(msg),
                    None => {
                        tracing::info!(generation = self.generation, "input closed, finishing context");
                        self.lifecycle.finish();
                    }
                },
            }
        }

        // Detach first so anything still queued is discarded with a log.
        drop(commands);
        drop(unauthorized);
        self.destroy()
    }

    fn on_start_resolved(&mut self, resolution: Resolution) {
        let Resolution {
            destination,
            fallback,
        } = resolution;
        let mut fell_back = fallback.is_some();

        let signed_out = self.services.start_policy.signed_out.clone();
        let mut built = self.build_host(&destination).map(|host| (destination.clone(), host));
        if let Err(e) = &built
            && destination != signed_out
        {
            tracing::warn!(%destination, fallback = %signed_out, "cannot start at resolved destination: {e}");
            fell_back = true;
            built = self.build_host(&signed_out).map(|host| (signed_out.clone(), host));
        }

        let (start, host) = match built {
            Ok(built) => built,
            Err(e) => {
                // The splash stays up; nothing could ever be drawn behind it.
                tracing::error!(generation = self.generation, "cannot build navigation host: {e}");
                self.lifecycle.finish();
                return;
            }
        };
        self.host = Some(host);
        emit(
            &self.services.events,
            ShellEvent::StartResolved {
                destination: start,
                fallback: fell_back,
            },
        );

        // Released only once the host exists, so the first drawn frame
        // already shows the start destination.
        if self.splash.mark_ready() {
            tracing::debug!(generation = self.generation, "splash released");
            emit(&self.services.events, ShellEvent::SplashReleased);
        }
    }

    fn build_host(&self, start: &DestinationId) -> Result<NavHost, NavError> {
        let mut graph = self.services.graph.clone();
        graph.set_start_destination(start)?;
        NavHost::new(
            graph,
            self.services.tabs.clone(),
            self.services.chrome.clone(),
            self.services.events.clone(),
        )
    }

    fn on_input(&mut self, msg: UiInput) {
        match msg {
            UiInput::Frame => {
                let event = if self.pre_draw.dispatch_on_pre_draw() {
                    ShellEvent::FrameDrawn {
                        destination: self.current(),
                    }
                } else {
                    ShellEvent::FrameSuspended
                };
                emit(&self.services.events, event);
            }
            UiInput::Tap(item) => match self.host.as_mut() {
                Some(host) => {
                    host.select_tab(&item);
                }
                None => tracing::warn!(item = %item, "tap ignored, navigation host not ready"),
            },
            UiInput::ReturnToRoot => {
                if let Some(host) = self.host.as_mut() {
                    host.return_to_top_of_root_stack();
                }
            }
            UiInput::Back => {
                let popped = self.host.as_mut().is_some_and(NavHost::back);
                if !popped && self.host.is_some() {
                    tracing::info!(generation = self.generation, "back at root, finishing context");
                    self.lifecycle.finish();
                }
            }
            UiInput::Pause => self.lifecycle.pause(),
            UiInput::Resume => self.lifecycle.resume(),
            UiInput::Inspect(reply) => {
                let _ = reply.send(self.snapshot());
            }
            UiInput::Close => {
                tracing::info!(generation = self.generation, "close requested");
                self.lifecycle.finish();
            }
        }
    }

    fn current(&self) -> Option<DestinationId> {
        self.host.as_ref().and_then(|h| h.current().cloned())
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            generation: self.generation,
            phase: self.lifecycle.phase(),
            splash_ready: self.splash.is_ready(),
            current: self.current(),
            back_stack: self
                .host
                .as_ref()
                .map(NavHost::back_stack)
                .unwrap_or_default(),
            selected_tab: self.host.as_ref().map(|h| h.selected_tab().clone()),
        }
    }

    fn destroy(mut self) -> ContextExit {
        self.splash.uninstall();
        self.host = None;
        self.lifecycle.destroy();
        let restart = self.lifecycle.is_restarting();
        tracing::info!(generation = self.generation, restart, "ui context destroyed");
        emit(
            &self.services.events,
            ShellEvent::ContextDestroyed {
                generation: self.generation,
                restart,
            },
        );
        if restart {
            ContextExit::Restart
        } else {
            ContextExit::Closed
        }
    }
}

/// Next item from an optional consumer; pends forever without one.
async fn next<T>(consumer: &mut Option<BusConsumer<T>>) -> Option<T> {
    match consumer {
        Some(consumer) => consumer.recv().await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use appshell_core::{Destination, NavGraph, StartPolicy, Token};
    use appshell_store::{MemorySessionStore, SqliteDatabase};
    use tokio::sync::broadcast;
    use tokio::task::JoinHandle;

    use crate::bottom_nav::BottomNavigation;

    fn services(token: Option<&str>, policy: StartPolicy) -> Services {
        let graph = NavGraph::new([
            Destination::new("sign_in").with_light_bars(true),
            Destination::new("home").with_bottom_navigation(true),
            Destination::new("profile").with_bottom_navigation(true),
        ])
        .expect("graph");
        let tabs = BottomNavigation::new(
            DestinationId::new("home"),
            ["home", "profile"].map(DestinationId::new),
        );
        let store = match token {
            Some(t) => MemorySessionStore::with_token(Token::new(t)),
            None => MemorySessionStore::new(),
        };
        let database = SqliteDatabase::open_in_memory().expect("db");
        Services::new(graph, tabs, Arc::new(store), Arc::new(database)).with_start_policy(policy)
    }

    fn policy(signed_in: &str, signed_out: &str) -> StartPolicy {
        StartPolicy {
            signed_in: DestinationId::new(signed_in),
            signed_out: DestinationId::new(signed_out),
        }
    }

    fn launch(services: Services) -> (mpsc::UnboundedSender<UiInput>, JoinHandle<ContextExit>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move { UiContext::new(1, services).run(&mut rx).await });
        (tx, handle)
    }

    async fn wait_for(
        events: &mut broadcast::Receiver<ShellEvent>,
        pred: impl Fn(&ShellEvent) -> bool,
    ) -> ShellEvent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match events.recv().await {
                    Ok(event) if pred(&event) => return event,
                    Ok(_) => {}
                    Err(e) => panic!("event stream failed: {e}"),
                }
            }
        })
        .await
        .expect("expected event did not arrive")
    }

    #[tokio::test]
    async fn undeclared_start_falls_back_to_signed_out() {
        let services = services(Some("abc"), policy("ghost", "sign_in"));
        let mut events = services.events.subscribe();
        let (input, handle) = launch(services);

        let resolved = wait_for(&mut events, |e| matches!(e, ShellEvent::StartResolved { .. })).await;
        assert_eq!(
            resolved,
            ShellEvent::StartResolved {
                destination: DestinationId::new("sign_in"),
                fallback: true,
            }
        );
        wait_for(&mut events, |e| matches!(e, ShellEvent::SplashReleased)).await;

        input.send(UiInput::Frame).expect("input");
        let drawn = wait_for(&mut events, |e| matches!(e, ShellEvent::FrameDrawn { .. })).await;
        assert_eq!(
            drawn,
            ShellEvent::FrameDrawn {
                destination: Some(DestinationId::new("sign_in"))
            }
        );

        input.send(UiInput::Close).expect("input");
        let exit = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("context stopped")
            .expect("context task");
        assert_eq!(exit, ContextExit::Closed);
    }

    #[tokio::test]
    async fn splash_kept_when_no_host_can_be_built() {
        let services = services(None, policy("home", "ghost"));
        let mut events = services.events.subscribe();
        let (input, handle) = launch(services);

        let exit = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("context stopped")
            .expect("context task");
        // Ended on its own while input was still open.
        assert_eq!(exit, ContextExit::Closed);
        drop(input);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(seen.contains(&ShellEvent::ContextDestroyed {
            generation: 1,
            restart: false
        }));
        assert!(!seen.iter().any(|e| matches!(
            e,
            ShellEvent::SplashReleased | ShellEvent::StartResolved { .. } | ShellEvent::FrameDrawn { .. }
        )));
    }
}
