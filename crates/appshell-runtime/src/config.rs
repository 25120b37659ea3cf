//! Shell manifest: destinations, start policy and bottom navigation tabs.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use appshell_core::{Destination, DestinationId, NavGraph, StartPolicy, start};
use serde::{Deserialize, Serialize};

use crate::bottom_nav::BottomNavigation;

/// Used when no manifest file is given.
pub const DEFAULT_MANIFEST: &str = r#"
[start]
signed_in = "home"
signed_out = "sign_in"

[bottom_navigation]
root = "home"
items = ["home", "catalog", "profile"]

[[destination]]
id = "sign_in"
label = "Sign in"
light_bars = true

[[destination]]
id = "home"
label = "Home"
bottom_navigation_visible = true

[[destination]]
id = "catalog"
label = "Catalog"
bottom_navigation_visible = true

[[destination]]
id = "profile"
label = "Profile"
bottom_navigation_visible = true

[[destination]]
id = "details"
label = "Details"
"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabConfig {
    pub root: DestinationId,
    #[serde(default)]
    pub items: Vec<DestinationId>,
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            root: DestinationId::new(start::HOME),
            items: vec![DestinationId::new(start::HOME)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub start: StartPolicy,
    #[serde(default)]
    pub bottom_navigation: TabConfig,
    #[serde(rename = "destination", default)]
    pub destinations: Vec<Destination>,
}

impl Manifest {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let manifest: Self = toml::from_str(text).context("invalid shell manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load `path`, or the built-in manifest when `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read manifest {}", path.display()))?;
                Self::parse(&text).with_context(|| format!("in {}", path.display()))
            }
            None => Self::parse(DEFAULT_MANIFEST),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.destinations.is_empty() {
            bail!("manifest declares no destinations");
        }
        let mut seen = HashSet::new();
        for dest in &self.destinations {
            if !seen.insert(&dest.id) {
                bail!("duplicate destination id: {}", dest.id);
            }
        }

        let require = |id: &DestinationId, role: &str| -> anyhow::Result<()> {
            if seen.contains(id) {
                Ok(())
            } else {
                bail!("{role} destination {id} is not declared")
            }
        };
        require(&self.start.signed_in, "signed-in start")?;
        require(&self.start.signed_out, "signed-out start")?;
        require(&self.bottom_navigation.root, "root tab")?;
        for item in &self.bottom_navigation.items {
            require(item, "tab")?;
        }
        if !self
            .bottom_navigation
            .items
            .contains(&self.bottom_navigation.root)
        {
            bail!(
                "root tab {} must be listed in bottom_navigation.items",
                self.bottom_navigation.root
            );
        }
        Ok(())
    }

    /// Inflate the graph. The start destination is left unset.
    pub fn graph(&self) -> anyhow::Result<NavGraph> {
        NavGraph::new(self.destinations.iter().cloned()).context("invalid navigation graph")
    }

    pub fn bottom_navigation(&self) -> BottomNavigation {
        BottomNavigation::new(
            self.bottom_navigation.root.clone(),
            self.bottom_navigation.items.iter().cloned(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_is_valid() {
        let manifest = Manifest::load(None).expect("default manifest");
        assert_eq!(manifest.destinations.len(), 5);
        assert_eq!(manifest.start, StartPolicy::default());

        let sign_in = manifest
            .destinations
            .iter()
            .find(|d| d.id.as_str() == "sign_in")
            .expect("sign_in");
        assert!(sign_in.meta.light_bars);
        assert!(!sign_in.meta.bottom_navigation_visible);

        let graph = manifest.graph().expect("graph");
        assert!(graph.start_destination().is_none());
        assert_eq!(manifest.bottom_navigation().items().len(), 3);
    }

    #[test]
    fn start_section_optional() {
        let manifest = Manifest::parse(
            r#"
            [bottom_navigation]
            root = "home"
            items = ["home"]

            [[destination]]
            id = "home"

            [[destination]]
            id = "sign_in"
            "#,
        )
        .expect("parse");
        assert_eq!(manifest.start.signed_out.as_str(), "sign_in");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Manifest::parse(
            r#"
            [[destination]]
            id = "home"

            [[destination]]
            id = "home"
            "#,
        )
        .expect_err("duplicate");
        assert!(format!("{err:#}").contains("duplicate destination id: home"));
    }

    #[test]
    fn rejects_undeclared_start() {
        let err = Manifest::parse(
            r#"
            [start]
            signed_in = "dashboard"
            signed_out = "home"

            [[destination]]
            id = "home"
            "#,
        )
        .expect_err("undeclared");
        assert!(format!("{err:#}").contains("dashboard"));
    }

    #[test]
    fn rejects_root_missing_from_items() {
        let err = Manifest::parse(
            r#"
            [start]
            signed_in = "home"
            signed_out = "home"

            [bottom_navigation]
            root = "home"
            items = ["profile"]

            [[destination]]
            id = "home"

            [[destination]]
            id = "profile"
            "#,
        )
        .expect_err("root missing");
        assert!(format!("{err:#}").contains("root tab home"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shell.toml");
        std::fs::write(&path, DEFAULT_MANIFEST).expect("write");
        let manifest = Manifest::load(Some(&path)).expect("load");
        assert_eq!(manifest.bottom_navigation.root.as_str(), "home");

        let missing = Manifest::load(Some(&dir.path().join("nope.toml")));
        assert!(missing.is_err());
    }
}
