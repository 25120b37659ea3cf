//! Nav host: the controller, the bottom bar and chrome wiring for one UI context.

use std::sync::Arc;

use appshell_core::{
    Chrome, DestinationId, NavController, NavError, NavGraph, NavigationCommand, Subscription,
    adjust_chrome,
};

use crate::bottom_nav::BottomNavigation;
use crate::events::{EventSender, ShellEvent, emit};

pub struct NavHost {
    controller: NavController,
    bottom_nav: BottomNavigation,
    chrome_listener: Subscription,
    events: EventSender,
    applied: u64,
}

impl NavHost {
    /// `graph` must already carry its start destination.
    pub fn new(
        graph: NavGraph,
        bottom_nav: BottomNavigation,
        chrome: Arc<dyn Chrome>,
        events: EventSender,
    ) -> Result<Self, NavError> {
        let mut controller = NavController::new();
        controller.set_graph(graph)?;

        let listener_events = events.clone();
        let chrome_listener = controller.add_on_destination_changed_listener(Box::new(move |dest| {
            let state = adjust_chrome(&chrome, dest);
            tracing::info!(destination = %dest.id, bars = %state.system_bars, bottom_nav = state.bottom_navigation_visible, "destination changed");
            emit(
                &listener_events,
                ShellEvent::DestinationChanged {
                    destination: dest.id.clone(),
                    chrome: state,
                },
            );
        }));

        let mut host = Self {
            controller,
            bottom_nav,
            chrome_listener,
            events,
            applied: 0,
        };
        host.sync_selection();
        Ok(host)
    }

    pub fn controller(&self) -> &NavController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut NavController {
        &mut self.controller
    }

    pub fn bottom_navigation(&self) -> &BottomNavigation {
        &self.bottom_nav
    }

    pub fn selected_tab(&self) -> &DestinationId {
        self.bottom_nav.selected()
    }

    pub fn current(&self) -> Option<&DestinationId> {
        self.controller.current_entry().map(|e| e.destination())
    }

    pub fn back_stack(&self) -> Vec<DestinationId> {
        self.controller
            .back_stack_destinations()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Apply one bus command. Failures are reported and do not stop the
    /// consumer.
    pub fn apply(&mut self, command: NavigationCommand) -> Result<(), NavError> {
        self.applied += 1;
        let seq = self.applied;
        let label = command.label().to_string();

        match command.apply(&mut self.controller) {
            Ok(()) => {
                tracing::debug!(seq, %label, "navigation command applied");
                self.sync_selection();
                emit(&self.events, ShellEvent::CommandApplied { seq, label });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(seq, %label, "navigation command failed: {e}");
                emit(
                    &self.events,
                    ShellEvent::CommandFailed {
                        seq,
                        label,
                        reason: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    pub fn select_tab(&mut self, item: &DestinationId) -> bool {
        let accepted = self.bottom_nav.on_item_selected(item, &mut self.controller);
        let event = if accepted {
            ShellEvent::TabSelected { item: item.clone() }
        } else {
            let reason = if self.bottom_nav.contains(item) {
                "navigation rejected".to_string()
            } else {
                NavError::UnknownDestination(item.clone()).to_string()
            };
            ShellEvent::TabRejected {
                item: item.clone(),
                reason,
            }
        };
        emit(&self.events, event);
        accepted
    }

    /// Programmatic reselection of the root tab.
    pub fn return_to_top_of_root_stack(&mut self) -> bool {
        let root = self.bottom_nav.root().clone();
        self.select_tab(&root)
    }

    /// System back. Returns `false` at the root entry.
    pub fn back(&mut self) -> bool {
        let popped = self.controller.pop_back_stack();
        if popped {
            self.sync_selection();
        }
        popped
    }

    fn sync_selection(&mut self) {
        if let Some(current) = self.controller.current_entry().map(|e| e.destination().clone()) {
            self.bottom_nav.sync_with(&current);
        }
    }
}

impl Drop for NavHost {
    fn drop(&mut self) {
        self.chrome_listener.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use crate::window::WindowChrome;
    use appshell_core::{Destination, SystemBarStyle};
    use tokio::sync::broadcast;

    fn graph(start: &str) -> NavGraph {
        let mut graph = NavGraph::new([
            Destination::new("sign_in").with_light_bars(true),
            Destination::new("home").with_bottom_navigation(true),
            Destination::new("catalog").with_bottom_navigation(true),
            Destination::new("profile").with_bottom_navigation(true),
            Destination::new("details"),
        ])
        .expect("graph");
        graph
            .set_start_destination(&DestinationId::new(start))
            .expect("start");
        graph
    }

    fn host(start: &str) -> (NavHost, Arc<WindowChrome>, broadcast::Receiver<ShellEvent>) {
        let (tx, rx) = events::channel();
        let window = Arc::new(WindowChrome::new());
        let bar = BottomNavigation::new(
            DestinationId::new("home"),
            ["home", "catalog", "profile"].map(DestinationId::new),
        );
        let host = NavHost::new(graph(start), bar, window.clone(), tx).expect("host");
        (host, window, rx)
    }

    fn drain(rx: &mut broadcast::Receiver<ShellEvent>) -> Vec<ShellEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[test]
    fn chrome_applied_for_start_destination() {
        let (host, window, mut rx) = host("sign_in");
        assert_eq!(host.current().map(DestinationId::as_str), Some("sign_in"));
        assert_eq!(window.state().system_bars, SystemBarStyle::Light);
        assert!(!window.state().bottom_navigation_visible);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ShellEvent::DestinationChanged { destination, .. }] if destination.as_str() == "sign_in"
        ));
    }

    #[test]
    fn failed_command_does_not_stop_later_ones() {
        let (mut host, window, mut rx) = host("home");
        drain(&mut rx);

        assert!(host.apply(NavigationCommand::navigate("catalog")).is_ok());
        assert!(host.apply(NavigationCommand::navigate("nowhere")).is_err());
        assert!(host.apply(NavigationCommand::navigate("details")).is_ok());

        assert_eq!(host.back_stack(), ["home", "catalog", "details"].map(DestinationId::new));
        assert!(!window.state().bottom_navigation_visible);

        let kinds: Vec<_> = drain(&mut rx).iter().map(ShellEvent::kind).collect();
        assert_eq!(
            kinds,
            [
                "destination_changed",
                "command_applied",
                "command_failed",
                "destination_changed",
                "command_applied",
            ]
        );
    }

    #[test]
    fn commands_keep_tab_selection_in_step() {
        let (mut host, _window, _rx) = host("home");
        host.apply(NavigationCommand::navigate("profile")).expect("profile");
        assert_eq!(host.selected_tab().as_str(), "profile");
        host.back();
        assert_eq!(host.selected_tab().as_str(), "home");
    }

    #[test]
    fn tab_rejection_reported() {
        let (mut host, _window, mut rx) = host("home");
        drain(&mut rx);
        assert!(!host.select_tab(&DestinationId::new("details")));
        assert_eq!(host.selected_tab().as_str(), "home");
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ShellEvent::TabRejected { item, .. }] if item.as_str() == "details"
        ));
    }

    #[test]
    fn return_to_root_reselects_home() {
        let (mut host, _window, _rx) = host("home");
        host.select_tab(&DestinationId::new("catalog"));
        host.apply(NavigationCommand::navigate("details")).expect("details");
        assert!(host.return_to_top_of_root_stack());
        assert_eq!(host.back_stack(), [DestinationId::new("home")]);
        assert_eq!(host.selected_tab().as_str(), "home");
    }

    #[test]
    fn back_stops_at_root() {
        let (mut host, _window, _rx) = host("home");
        assert!(!host.back());
        host.apply(NavigationCommand::navigate("details")).expect("details");
        assert!(host.back());
        assert_eq!(host.current().map(DestinationId::as_str), Some("home"));
    }
}
