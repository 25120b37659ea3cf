//! Process-wide services and the context relaunch loop.

use std::sync::Arc;
use std::time::Duration;

use appshell_core::{Chrome, NavError, NavGraph, NavigationCommand, StartPolicy};
use appshell_store::{LocalDatabase, SessionStore};
use tokio::sync::mpsc;

use crate::bottom_nav::BottomNavigation;
use crate::bus::EventBus;
use crate::context::{ContextExit, UiContext, UiInput};
use crate::events::{self, EventSender};
use crate::invalidator::UnauthorizedEvent;
use crate::notifications::{NotificationCenter, Notifier};
use crate::startup::DEFAULT_STARTUP_TIMEOUT;
use crate::supervisor::BackgroundTasks;
use crate::window::WindowChrome;

/// Services that outlive any single UI context.
#[derive(Clone)]
pub struct Services {
    /// Graph without a start destination; each context sets its own.
    pub graph: NavGraph,
    pub tabs: BottomNavigation,
    pub start_policy: StartPolicy,
    pub startup_timeout: Duration,
    pub session: Arc<dyn SessionStore>,
    pub database: Arc<dyn LocalDatabase>,
    pub notifier: Arc<dyn Notifier>,
    pub chrome: Arc<dyn Chrome>,
    pub navigation: Arc<EventBus<NavigationCommand>>,
    pub unauthorized: Arc<EventBus<UnauthorizedEvent>>,
    pub background: BackgroundTasks,
    pub events: EventSender,
}

impl Services {
    pub fn new(
        graph: NavGraph,
        tabs: BottomNavigation,
        session: Arc<dyn SessionStore>,
        database: Arc<dyn LocalDatabase>,
    ) -> Self {
        let (events, _) = events::channel();
        Self {
            graph,
            tabs,
            start_policy: StartPolicy::default(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            session,
            database,
            notifier: Arc::new(NotificationCenter::new()),
            chrome: Arc::new(WindowChrome::new()),
            navigation: EventBus::new("navigation"),
            unauthorized: EventBus::new("unauthorized"),
            background: BackgroundTasks::new(),
            events,
        }
    }

    #[must_use]
    pub fn with_start_policy(mut self, policy: StartPolicy) -> Self {
        self.start_policy = policy;
        self
    }

    #[must_use]
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_chrome(mut self, chrome: Arc<dyn Chrome>) -> Self {
        self.chrome = chrome;
        self
    }

    /// Every destination a context may start at or switch to must be
    /// declared in the graph.
    pub fn validate(&self) -> Result<(), NavError> {
        let policy = [&self.start_policy.signed_in, &self.start_policy.signed_out];
        for id in policy.into_iter().chain(self.tabs.items()) {
            if !self.graph.contains(id) {
                return Err(NavError::UnknownDestination(id.clone()));
            }
        }
        Ok(())
    }
}

pub struct Shell {
    services: Services,
}

impl Shell {
    pub fn new(services: Services) -> Result<Self, NavError> {
        services.validate()?;
        Ok(Self { services })
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Run UI contexts until one closes without asking for a restart.
    /// Returns the number of contexts launched.
    pub async fn run(self, mut input: mpsc::UnboundedReceiver<UiInput>) -> u64 {
        let mut generation = 0;
        loop {
            generation += 1;
            let context = UiContext::new(generation, self.services.clone());
            match context.run(&mut input).await {
                ContextExit::Closed => break,
                ContextExit::Restart => {
                    tracing::info!(next = generation + 1, "relaunching ui context");
                }
            }
        }
        tracing::info!(contexts = generation, "shell stopped");
        generation
    }
}
