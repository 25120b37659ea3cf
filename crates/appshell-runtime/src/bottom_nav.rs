//! Bottom navigation bar: tab selection with per-tab back stack state.

use appshell_core::{DestinationId, NavController, NavError, NavOptions};

#[derive(Debug, Clone)]
pub struct BottomNavigation {
    items: Vec<DestinationId>,
    root: DestinationId,
    selected: DestinationId,
}

impl BottomNavigation {
    /// `root` is the first tab the bar shows as selected; it need not be
    /// listed in `items` twice.
    pub fn new(root: DestinationId, items: impl IntoIterator<Item = DestinationId>) -> Self {
        let mut list: Vec<DestinationId> = items.into_iter().collect();
        if !list.contains(&root) {
            list.insert(0, root.clone());
        }
        Self {
            items: list,
            selected: root.clone(),
            root,
        }
    }

    pub fn items(&self) -> &[DestinationId] {
        &self.items
    }

    pub fn root(&self) -> &DestinationId {
        &self.root
    }

    pub fn selected(&self) -> &DestinationId {
        &self.selected
    }

    pub fn contains(&self, item: &DestinationId) -> bool {
        self.items.contains(item)
    }

    /// Options used for every tab switch: no duplicate on retap, saved
    /// state restored, and the stack popped back to the root with the
    /// leaving tab's state saved.
    pub fn tab_options(&self) -> NavOptions {
        NavOptions::default()
            .with_launch_single_top(true)
            .with_restore_state(true)
            .with_pop_up_to(self.root.clone(), false, true)
    }

    pub fn select(
        &mut self,
        item: &DestinationId,
        controller: &mut NavController,
    ) -> Result<(), NavError> {
        if !self.contains(item) {
            return Err(NavError::UnknownDestination(item.clone()));
        }
        controller.navigate_with(item, &self.tab_options())?;
        self.selected = item.clone();
        Ok(())
    }

    /// Item-selected handler: `false` leaves the current selection visually
    /// unchanged.
    pub fn on_item_selected(&mut self, item: &DestinationId, controller: &mut NavController) -> bool {
        match self.select(item, controller) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(item = %item, "tab selection rejected: {e}");
                false
            }
        }
    }

    /// Keep the highlighted tab in step with navigation that did not come
    /// from the bar.
    pub fn sync_with(&mut self, current: &DestinationId) {
        if self.contains(current) && &self.selected != current {
            self.selected = current.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appshell_core::{Destination, NavGraph};

    fn controller() -> NavController {
        let mut graph = NavGraph::new(
            ["home", "catalog", "profile", "details"].map(Destination::new),
        )
        .expect("graph");
        graph
            .set_start_destination(&DestinationId::new("home"))
            .expect("start");
        let mut nav = NavController::new();
        nav.set_graph(graph).expect("set graph");
        nav
    }

    fn bar() -> BottomNavigation {
        BottomNavigation::new(
            DestinationId::new("home"),
            ["home", "catalog", "profile"].map(DestinationId::new),
        )
    }

    fn stack(nav: &NavController) -> Vec<String> {
        nav.back_stack_destinations()
            .into_iter()
            .map(|d| d.to_string())
            .collect()
    }

    #[test]
    fn root_selected_initially() {
        let bar = bar();
        assert_eq!(bar.selected().as_str(), "home");
        assert_eq!(bar.items().len(), 3);
    }

    #[test]
    fn root_added_when_missing_from_items() {
        let bar = BottomNavigation::new(DestinationId::new("home"), [DestinationId::new("catalog")]);
        assert_eq!(bar.items()[0].as_str(), "home");
    }

    #[test]
    fn retap_does_not_duplicate() {
        let mut nav = controller();
        let mut bar = bar();
        let catalog = DestinationId::new("catalog");
        assert!(bar.on_item_selected(&catalog, &mut nav));
        assert!(bar.on_item_selected(&catalog, &mut nav));
        assert_eq!(stack(&nav), ["home", "catalog"]);
        assert_eq!(bar.selected(), &catalog);
    }

    #[test]
    fn unknown_item_rejected_selection_unchanged() {
        let mut nav = controller();
        let mut bar = bar();
        assert!(!bar.on_item_selected(&DestinationId::new("details"), &mut nav));
        assert_eq!(bar.selected().as_str(), "home");
        assert_eq!(stack(&nav), ["home"]);
    }

    #[test]
    fn switching_back_restores_tab_stack() {
        let mut nav = controller();
        let mut bar = bar();
        bar.select(&DestinationId::new("catalog"), &mut nav).expect("catalog");
        nav.navigate(&DestinationId::new("details")).expect("details");
        bar.select(&DestinationId::new("profile"), &mut nav).expect("profile");
        assert_eq!(stack(&nav), ["home", "profile"]);

        bar.select(&DestinationId::new("catalog"), &mut nav).expect("catalog again");
        assert_eq!(stack(&nav), ["home", "catalog", "details"]);
    }

    #[test]
    fn sync_follows_tab_destinations_only() {
        let mut bar = bar();
        bar.sync_with(&DestinationId::new("profile"));
        assert_eq!(bar.selected().as_str(), "profile");
        bar.sync_with(&DestinationId::new("details"));
        assert_eq!(bar.selected().as_str(), "profile");
    }
}
