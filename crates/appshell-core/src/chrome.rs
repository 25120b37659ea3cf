//! Window chrome driven by destination metadata.

use std::fmt;
use std::sync::Arc;

use crate::types::{Destination, DestinationMeta};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemBarStyle {
    Light,
    #[default]
    Dark,
}

impl SystemBarStyle {
    pub fn from_light(light_bars: bool) -> Self {
        if light_bars { Self::Light } else { Self::Dark }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for SystemBarStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChromeState {
    pub system_bars: SystemBarStyle,
    pub bottom_navigation_visible: bool,
}

impl From<&DestinationMeta> for ChromeState {
    fn from(meta: &DestinationMeta) -> Self {
        Self {
            system_bars: SystemBarStyle::from_light(meta.light_bars),
            bottom_navigation_visible: meta.bottom_navigation_visible,
        }
    }
}

/// Window decoration surface. Implementations own the actual widgets.
pub trait Chrome: Send + Sync {
    fn set_system_bar_style(&self, style: SystemBarStyle);
    fn set_bottom_navigation_visible(&self, visible: bool);
}

impl<T: Chrome + ?Sized> Chrome for Arc<T> {
    fn set_system_bar_style(&self, style: SystemBarStyle) {
        (**self).set_system_bar_style(style);
    }

    fn set_bottom_navigation_visible(&self, visible: bool) {
        (**self).set_bottom_navigation_visible(visible);
    }
}

/// Apply the two chrome adjustments for a newly active destination.
pub fn adjust_chrome<C: Chrome + ?Sized>(chrome: &C, destination: &Destination) -> ChromeState {
    let state = ChromeState::from(&destination.meta);
    chrome.set_system_bar_style(state.system_bars);
    chrome.set_bottom_navigation_visible(state.bottom_navigation_visible);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Chrome for Recorder {
        fn set_system_bar_style(&self, style: SystemBarStyle) {
            self.calls.lock().expect("lock").push(format!("bars={style}"));
        }

        fn set_bottom_navigation_visible(&self, visible: bool) {
            self.calls.lock().expect("lock").push(format!("bnv={visible}"));
        }
    }

    #[test]
    fn light_bars_hidden_bottom_nav() {
        let chrome = Recorder::default();
        let dest = Destination::new("sign_in")
            .with_light_bars(true)
            .with_bottom_navigation(false);

        let state = adjust_chrome(&chrome, &dest);
        assert_eq!(state.system_bars, SystemBarStyle::Light);
        assert!(!state.bottom_navigation_visible);
        assert_eq!(
            *chrome.calls.lock().expect("lock"),
            vec!["bars=light".to_string(), "bnv=false".to_string()]
        );
    }

    #[test]
    fn inverse_metadata_gives_inverse_chrome() {
        let chrome = Recorder::default();
        let dest = Destination::new("home")
            .with_light_bars(false)
            .with_bottom_navigation(true);

        let state = adjust_chrome(&chrome, &dest);
        assert_eq!(state.system_bars, SystemBarStyle::Dark);
        assert!(state.bottom_navigation_visible);
    }

    #[test]
    fn missing_metadata_defaults_to_dark_and_hidden() {
        let state = ChromeState::from(&DestinationMeta::default());
        assert_eq!(state, ChromeState::default());
        assert!(!state.bottom_navigation_visible);
    }

    #[test]
    fn arc_forwards_to_inner() {
        let chrome = Arc::new(Recorder::default());
        adjust_chrome(&chrome, &Destination::new("x"));
        assert_eq!(chrome.calls.lock().expect("lock").len(), 2);
    }
}
