//! appshell-runtime: the async half of the app shell.
//!
//! One tokio task per UI context owns the nav host. Producers anywhere in
//! the process reach it through two single-consumer buses; session
//! invalidation hands its cleanup to a process-wide supervisor and asks the
//! shell for a fresh context.

pub mod bottom_nav;
pub mod bus;
pub mod config;
pub mod context;
pub mod events;
pub mod invalidator;
pub mod lifecycle;
pub mod navigation;
pub mod notifications;
pub mod shell;
pub mod startup;
pub mod supervisor;
pub mod window;

pub use bottom_nav::BottomNavigation;
pub use bus::{BusConsumer, Delivery, EventBus};
pub use config::Manifest;
pub use context::{ContextExit, ContextSnapshot, UiContext, UiInput};
pub use events::ShellEvent;
pub use invalidator::{Invalidation, SessionInvalidator, UnauthorizedEvent};
pub use lifecycle::{Lifecycle, Phase};
pub use navigation::NavHost;
pub use notifications::{NotificationCenter, Notifier};
pub use shell::{Services, Shell};
pub use startup::{FallbackReason, Resolution, StartResolver};
pub use supervisor::BackgroundTasks;
pub use window::WindowChrome;
