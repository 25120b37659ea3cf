//! Window chrome: system bar style and bottom navigation visibility.

use std::sync::{Mutex, PoisonError};

use appshell_core::{Chrome, ChromeState, SystemBarStyle};

/// Window decorations of the headless shell: the applied state is recorded
/// and logged.
#[derive(Debug, Default)]
pub struct WindowChrome {
    state: Mutex<ChromeState>,
}

impl WindowChrome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ChromeState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Chrome for WindowChrome {
    fn set_system_bar_style(&self, style: SystemBarStyle) {
        tracing::debug!(%style, "system bars");
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .system_bars = style;
    }

    fn set_bottom_navigation_visible(&self, visible: bool) {
        tracing::debug!(visible, "bottom navigation");
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .bottom_navigation_visible = visible;
    }
}
