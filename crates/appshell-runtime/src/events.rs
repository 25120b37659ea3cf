//! Observable shell events, broadcast to the CLI printer and to tests.

use appshell_core::{ChromeState, DestinationId};
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    ContextLaunched { generation: u64 },
    StartResolved { destination: DestinationId, fallback: bool },
    SplashReleased,
    /// A frame was requested but the pre-draw pass vetoed it.
    FrameSuspended,
    FrameDrawn { destination: Option<DestinationId> },
    DestinationChanged { destination: DestinationId, chrome: ChromeState },
    CommandApplied { seq: u64, label: String },
    CommandFailed { seq: u64, label: String, reason: String },
    TabSelected { item: DestinationId },
    TabRejected { item: DestinationId, reason: String },
    /// An unauthorized signal arrived while the context was already closing.
    UnauthorizedIgnored,
    SessionInvalidated,
    CleanupFinished { ok: bool },
    ContextDestroyed { generation: u64, restart: bool },
}

impl ShellEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContextLaunched { .. } => "context_launched",
            Self::StartResolved { .. } => "start_resolved",
            Self::SplashReleased => "splash_released",
            Self::FrameSuspended => "frame_suspended",
            Self::FrameDrawn { .. } => "frame_drawn",
            Self::DestinationChanged { .. } => "destination_changed",
            Self::CommandApplied { .. } => "command_applied",
            Self::CommandFailed { .. } => "command_failed",
            Self::TabSelected { .. } => "tab_selected",
            Self::TabRejected { .. } => "tab_rejected",
            Self::UnauthorizedIgnored => "unauthorized_ignored",
            Self::SessionInvalidated => "session_invalidated",
            Self::CleanupFinished { .. } => "cleanup_finished",
            Self::ContextDestroyed { .. } => "context_destroyed",
        }
    }
}

pub type EventSender = broadcast::Sender<ShellEvent>;

pub const EVENT_CAPACITY: usize = 256;

pub fn channel() -> (EventSender, broadcast::Receiver<ShellEvent>) {
    broadcast::channel(EVENT_CAPACITY)
}

/// Send without caring whether anyone listens.
pub fn emit(events: &EventSender, event: ShellEvent) {
    let _ = events.send(event);
}
