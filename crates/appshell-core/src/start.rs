//! Start destination policy: token presence picks the first screen.

use serde::{Deserialize, Serialize};

use crate::types::{DestinationId, Token};

pub const HOME: &str = "home";
pub const SIGN_IN: &str = "sign_in";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPolicy {
    /// Destination shown when a token is stored.
    pub signed_in: DestinationId,
    /// Destination shown when no token is stored.
    pub signed_out: DestinationId,
}

impl Default for StartPolicy {
    fn default() -> Self {
        Self {
            signed_in: DestinationId::new(HOME),
            signed_out: DestinationId::new(SIGN_IN),
        }
    }
}

impl StartPolicy {
    /// The token's mere presence is trusted; no validation or expiry check.
    pub fn resolve(&self, token: Option<&Token>) -> &DestinationId {
        match token {
            Some(_) => &self.signed_in,
            None => &self.signed_out,
        }
    }
}
