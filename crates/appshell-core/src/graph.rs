//! Navigation graph: the set of known destinations plus a start node chosen at runtime.

use std::collections::HashMap;

use crate::error::NavError;
use crate::types::{Destination, DestinationId};

#[derive(Debug, Clone)]
pub struct NavGraph {
    /// Destinations in declaration order.
    destinations: Vec<Destination>,
    index: HashMap<DestinationId, usize>,
    start: Option<DestinationId>,
}

impl NavGraph {
    /// Build a graph from destinations. Ids must be unique; the start
    /// destination is left unset until [`NavGraph::set_start_destination`].
    pub fn new(destinations: impl IntoIterator<Item = Destination>) -> Result<Self, NavError> {
        let destinations: Vec<Destination> = destinations.into_iter().collect();
        if destinations.is_empty() {
            return Err(NavError::EmptyGraph);
        }

        let mut index = HashMap::with_capacity(destinations.len());
        for (pos, dest) in destinations.iter().enumerate() {
            if index.insert(dest.id.clone(), pos).is_some() {
                return Err(NavError::DuplicateDestination(dest.id.clone()));
            }
        }

        Ok(Self {
            destinations,
            index,
            start: None,
        })
    }

    pub fn set_start_destination(&mut self, id: &DestinationId) -> Result<(), NavError> {
        if !self.contains(id) {
            return Err(NavError::UnknownDestination(id.clone()));
        }
        self.start = Some(id.clone());
        Ok(())
    }

    pub fn start_destination(&self) -> Option<&DestinationId> {
        self.start.as_ref()
    }

    pub fn find(&self, id: &DestinationId) -> Option<&Destination> {
        self.index.get(id).map(|&pos| &self.destinations[pos])
    }

    pub fn contains(&self, id: &DestinationId) -> bool {
        self.index.contains_key(id)
    }

    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NavGraph {
        NavGraph::new([
            Destination::new("sign_in"),
            Destination::new("home"),
            Destination::new("profile"),
        ])
        .expect("valid graph")
    }

    #[test]
    fn lookup_by_id() {
        let graph = sample();
        assert_eq!(graph.len(), 3);
        assert!(graph.contains(&"home".into()));
        assert!(graph.find(&"missing".into()).is_none());
    }

    #[test]
    fn keeps_declaration_order() {
        let graph = sample();
        let ids: Vec<&str> = graph.destinations().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["sign_in", "home", "profile"]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = NavGraph::new([Destination::new("home"), Destination::new("home")])
            .expect_err("duplicate");
        assert_eq!(err, NavError::DuplicateDestination("home".into()));
    }

    #[test]
    fn rejects_empty_graph() {
        let err = NavGraph::new(Vec::new()).expect_err("empty");
        assert_eq!(err, NavError::EmptyGraph);
    }

    #[test]
    fn start_destination_must_exist() {
        let mut graph = sample();
        assert!(graph.start_destination().is_none());

        let err = graph
            .set_start_destination(&"nowhere".into())
            .expect_err("unknown start");
        assert_eq!(err, NavError::UnknownDestination("nowhere".into()));

        graph.set_start_destination(&"home".into()).expect("known");
        assert_eq!(graph.start_destination(), Some(&"home".into()));
    }
}
