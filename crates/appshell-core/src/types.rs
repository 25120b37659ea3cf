use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Destination ──────────────────────────────────────────────────

/// Stable identifier of a navigable screen, unique within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DestinationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DestinationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Display metadata carried by a destination and read on every destination change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestinationMeta {
    #[serde(default)]
    pub light_bars: bool,
    #[serde(default)]
    pub bottom_navigation_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub id: DestinationId,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub meta: DestinationMeta,
}

impl Destination {
    pub fn new(id: impl Into<DestinationId>) -> Self {
        let id = id.into();
        Self {
            label: id.as_str().to_string(),
            id,
            meta: DestinationMeta::default(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_light_bars(mut self, light_bars: bool) -> Self {
        self.meta.light_bars = light_bars;
        self
    }

    #[must_use]
    pub fn with_bottom_navigation(mut self, visible: bool) -> Self {
        self.meta.bottom_navigation_visible = visible;
        self
    }
}

// ─── Token ────────────────────────────────────────────────────────

/// Opaque credential. Only its presence is meaningful to the coordinator.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_defaults_label_to_id() {
        let dest = Destination::new("home");
        assert_eq!(dest.label, "home");
        assert_eq!(dest.meta, DestinationMeta::default());
    }

    #[test]
    fn destination_builder_sets_meta() {
        let dest = Destination::new("sign_in")
            .with_label("Sign in")
            .with_light_bars(true)
            .with_bottom_navigation(false);
        assert_eq!(dest.label, "Sign in");
        assert!(dest.meta.light_bars);
        assert!(!dest.meta.bottom_navigation_visible);
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = Token::new("secret-value");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("secret"));
        assert_eq!(token.expose(), "secret-value");
    }

    #[test]
    fn destination_id_display_matches_str() {
        let id = DestinationId::from("profile");
        assert_eq!(id.to_string(), "profile");
        assert_eq!(id.as_str(), "profile");
    }
}
