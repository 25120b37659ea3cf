//! appshell-core: navigation and startup state machines for the app shell.
//! Graph, back stack, commands, splash gate and chrome policy.
//! No IO, no async: the runtime crate drives these from its UI task.

pub mod chrome;
pub mod command;
pub mod controller;
pub mod error;
pub mod graph;
pub mod splash;
pub mod start;
pub mod subscription;
pub mod types;

pub use chrome::{Chrome, ChromeState, SystemBarStyle, adjust_chrome};
pub use command::NavigationCommand;
pub use controller::{BackStackEntry, EntryState, NavController, NavOptions, PopUpTo};
pub use error::NavError;
pub use graph::NavGraph;
pub use splash::{PreDrawObservers, ReadinessFlag, SplashGate};
pub use start::StartPolicy;
pub use subscription::{Listeners, Subscription};
pub use types::{Destination, DestinationId, DestinationMeta, Token};
