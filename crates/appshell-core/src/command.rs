//! Navigation commands: one-shot mutations handed to the controller's owner.

use std::fmt;

use crate::controller::{NavController, NavOptions};
use crate::error::NavError;
use crate::types::DestinationId;

type Action = Box<dyn FnOnce(&mut NavController) -> Result<(), NavError> + Send>;

/// A labelled navigation mutation. Producers build these anywhere; only the
/// owner of the live controller applies them.
pub struct NavigationCommand {
    label: String,
    action: Action,
}

impl NavigationCommand {
    pub fn new(
        label: impl Into<String>,
        action: impl FnOnce(&mut NavController) -> Result<(), NavError> + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            action: Box::new(action),
        }
    }

    pub fn navigate(id: impl Into<DestinationId>) -> Self {
        let id = id.into();
        Self::new(format!("navigate({id})"), move |nav| nav.navigate(&id))
    }

    pub fn navigate_with(id: impl Into<DestinationId>, options: NavOptions) -> Self {
        let id = id.into();
        Self::new(format!("navigate({id}, {options:?})"), move |nav| {
            nav.navigate_with(&id, &options)
        })
    }

    /// Popping at the root is a no-op, not a failure.
    pub fn pop_back_stack() -> Self {
        Self::new("pop_back_stack", |nav| {
            nav.pop_back_stack();
            Ok(())
        })
    }

    pub fn pop_back_stack_to(id: impl Into<DestinationId>, inclusive: bool) -> Self {
        let id = id.into();
        Self::new(
            format!("pop_back_stack_to({id}, inclusive={inclusive})"),
            move |nav| nav.pop_back_stack_to(&id, inclusive).map(|_| ()),
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn apply(self, controller: &mut NavController) -> Result<(), NavError> {
        (self.action)(controller)
    }
}

impl fmt::Debug for NavigationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationCommand")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
