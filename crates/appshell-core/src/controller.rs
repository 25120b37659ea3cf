//! Navigation controller: back stack state machine behind the nav host.
//!
//! Pure and synchronous. The runtime owns exactly one controller per UI
//! context and mutates it only from that context's task.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::NavError;
use crate::graph::NavGraph;
use crate::subscription::{Listeners, Subscription};
use crate::types::{Destination, DestinationId};

// ─── Options ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopUpTo {
    pub destination: DestinationId,
    pub inclusive: bool,
    /// Keep the popped entries so a later `restore_state` navigation can bring them back.
    pub save_state: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavOptions {
    /// Do not push a second copy of the destination already on top.
    pub launch_single_top: bool,
    /// Restore a previously saved stack rooted at the target, if any.
    pub restore_state: bool,
    pub pop_up_to: Option<PopUpTo>,
}

impl NavOptions {
    #[must_use]
    pub fn with_launch_single_top(mut self, single_top: bool) -> Self {
        self.launch_single_top = single_top;
        self
    }

    #[must_use]
    pub fn with_restore_state(mut self, restore: bool) -> Self {
        self.restore_state = restore;
        self
    }

    #[must_use]
    pub fn with_pop_up_to(
        mut self,
        destination: impl Into<DestinationId>,
        inclusive: bool,
        save_state: bool,
    ) -> Self {
        self.pop_up_to = Some(PopUpTo {
            destination: destination.into(),
            inclusive,
            save_state,
        });
        self
    }
}

// ─── Back stack entries ───────────────────────────────────────────

/// Per-entry screen state (scroll position, form input, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryState(BTreeMap<String, String>);

impl EntryState {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackStackEntry {
    id: u64,
    destination: DestinationId,
    state: EntryState,
}

impl BackStackEntry {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn destination(&self) -> &DestinationId {
        &self.destination
    }

    pub fn state(&self) -> &EntryState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EntryState {
        &mut self.state
    }
}

// ─── Controller ───────────────────────────────────────────────────

/// Invoked synchronously whenever the top of the back stack changes.
pub type DestinationChangedListener = dyn FnMut(&Destination) + Send;

#[derive(Default)]
pub struct NavController {
    graph: Option<NavGraph>,
    back_stack: Vec<BackStackEntry>,
    /// Stacks popped with `save_state`, by save id.
    saved_stacks: HashMap<u64, Vec<BackStackEntry>>,
    /// Every destination of a saved stack points at that stack's save id.
    saved_index: HashMap<DestinationId, u64>,
    next_save_id: u64,
    listeners: Listeners<DestinationChangedListener>,
    next_entry_id: u64,
}

impl fmt::Debug for NavController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavController")
            .field("back_stack", &self.back_stack)
            .field("saved", &self.saved_index.keys().collect::<Vec<_>>())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl NavController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a graph and reset the back stack to its start destination.
    pub fn set_graph(&mut self, graph: NavGraph) -> Result<(), NavError> {
        let start = graph
            .start_destination()
            .cloned()
            .ok_or(NavError::NoStartDestination)?;
        let before = self.top_entry_id();

        self.back_stack.clear();
        self.saved_stacks.clear();
        self.saved_index.clear();
        self.graph = Some(graph);
        self.push_entry(start);

        self.notify_if_changed(before);
        Ok(())
    }

    pub fn graph(&self) -> Option<&NavGraph> {
        self.graph.as_ref()
    }

    /// Register a destination-change listener. If a destination is already
    /// active the listener is invoked for it immediately.
    pub fn add_on_destination_changed_listener(
        &mut self,
        mut listener: Box<DestinationChangedListener>,
    ) -> Subscription {
        if let Some(dest) = self.current_destination() {
            listener(dest);
        }
        self.listeners.register(listener)
    }

    pub fn current_entry(&self) -> Option<&BackStackEntry> {
        self.back_stack.last()
    }

    pub fn current_entry_mut(&mut self) -> Option<&mut BackStackEntry> {
        self.back_stack.last_mut()
    }

    pub fn current_destination(&self) -> Option<&Destination> {
        let entry = self.back_stack.last()?;
        self.graph.as_ref()?.find(&entry.destination)
    }

    pub fn back_stack(&self) -> &[BackStackEntry] {
        &self.back_stack
    }

    pub fn back_stack_destinations(&self) -> Vec<&DestinationId> {
        self.back_stack.iter().map(|e| &e.destination).collect()
    }

    pub fn has_saved_state(&self, id: &DestinationId) -> bool {
        self.saved_index.contains_key(id)
    }

    pub fn navigate(&mut self, id: &DestinationId) -> Result<(), NavError> {
        self.navigate_with(id, &NavOptions::default())
    }

    /// Navigate to `id`, honouring pop-up-to, single-top and restore-state.
    pub fn navigate_with(&mut self, id: &DestinationId, options: &NavOptions) -> Result<(), NavError> {
        let graph = self.graph.as_ref().ok_or(NavError::GraphNotSet)?;
        if !graph.contains(id) {
            return Err(NavError::UnknownDestination(id.clone()));
        }
        if let Some(pop) = &options.pop_up_to
            && !graph.contains(&pop.destination)
        {
            return Err(NavError::UnknownDestination(pop.destination.clone()));
        }

        let before = self.top_entry_id();

        if let Some(pop) = &options.pop_up_to {
            self.pop_until(&pop.destination, pop.inclusive, pop.save_state);
        }

        let restored = options.restore_state && self.restore_saved_stack(id);
        if !restored {
            let on_top = self.back_stack.last().is_some_and(|e| &e.destination == id);
            if !(options.launch_single_top && on_top) {
                self.push_entry(id.clone());
            }
        }

        self.notify_if_changed(before);
        Ok(())
    }

    /// Pop the top entry. The root entry is never popped.
    pub fn pop_back_stack(&mut self) -> bool {
        if self.back_stack.len() <= 1 {
            return false;
        }
        let before = self.top_entry_id();
        self.back_stack.pop();
        self.notify_if_changed(before);
        true
    }

    /// Pop entries above `id` (and `id` itself when `inclusive`).
    ///
    /// Returns `Ok(false)` when nothing was popped or popping would empty
    /// the back stack.
    pub fn pop_back_stack_to(&mut self, id: &DestinationId, inclusive: bool) -> Result<bool, NavError> {
        let graph = self.graph.as_ref().ok_or(NavError::GraphNotSet)?;
        if !graph.contains(id) {
            return Err(NavError::UnknownDestination(id.clone()));
        }
        let pos = self
            .back_stack
            .iter()
            .rposition(|e| &e.destination == id)
            .ok_or_else(|| NavError::NotOnBackStack(id.clone()))?;
        let cut = if inclusive { pos } else { pos + 1 };
        if cut == 0 || cut >= self.back_stack.len() {
            return Ok(false);
        }

        let before = self.top_entry_id();
        self.back_stack.truncate(cut);
        self.notify_if_changed(before);
        Ok(true)
    }

    /// Without a parent hierarchy in the graph, up behaves like back.
    pub fn navigate_up(&mut self) -> bool {
        self.pop_back_stack()
    }

    fn top_entry_id(&self) -> Option<u64> {
        self.back_stack.last().map(BackStackEntry::id)
    }

    fn push_entry(&mut self, destination: DestinationId) {
        self.next_entry_id += 1;
        self.back_stack.push(BackStackEntry {
            id: self.next_entry_id,
            destination,
            state: EntryState::default(),
        });
    }

    /// A target that is not on the back stack pops nothing.
    fn pop_until(&mut self, target: &DestinationId, inclusive: bool, save_state: bool) {
        let Some(pos) = self.back_stack.iter().rposition(|e| &e.destination == target) else {
            return;
        };
        let cut = if inclusive { pos } else { pos + 1 };
        if cut >= self.back_stack.len() {
            return;
        }

        let popped = self.back_stack.split_off(cut);
        if save_state {
            self.save_stack(popped);
        }
    }

    /// Any destination of the popped stack can restore it later. A newer
    /// save claims its destinations from older ones; stacks left with no
    /// destination pointing at them are dropped.
    fn save_stack(&mut self, popped: Vec<BackStackEntry>) {
        self.next_save_id += 1;
        let save_id = self.next_save_id;
        for entry in &popped {
            self.saved_index.insert(entry.destination.clone(), save_id);
        }
        self.saved_stacks.insert(save_id, popped);

        let index = &self.saved_index;
        self.saved_stacks
            .retain(|id, _| index.values().any(|referenced| referenced == id));
    }

    fn restore_saved_stack(&mut self, id: &DestinationId) -> bool {
        let Some(save_id) = self.saved_index.get(id).copied() else {
            return false;
        };
        self.saved_index.retain(|_, referenced| *referenced != save_id);
        match self.saved_stacks.remove(&save_id) {
            Some(entries) => {
                self.back_stack.extend(entries);
                true
            }
            None => false,
        }
    }

    fn notify_if_changed(&mut self, before: Option<u64>) {
        if self.top_entry_id() == before {
            return;
        }
        let (Some(graph), Some(entry)) = (&self.graph, self.back_stack.last()) else {
            return;
        };
        if let Some(dest) = graph.find(&entry.destination) {
            self.listeners.for_each_active(|listener| listener(dest));
        }
    }
}
