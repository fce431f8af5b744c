//! Operational mode of the node.
//!
//! ```text
//!              ┌──────────── Idle ────────────┐
//!              │               ▲              │
//!              ▼               │              ▼
//!          Pairing ──▶ Identifying      Calibrating
//! ```
//!
//! Every mode returns to `Idle`. Calibration only starts from `Idle`, and
//! nothing starts while it runs.

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Idle,
    Identifying,
    Calibrating,
    Pairing,
}

impl Mode {
    pub fn can_enter(self, next: Mode) -> bool {
        matches!(
            (self, next),
            (_, Mode::Idle) | (Mode::Idle, _) | (Mode::Pairing, Mode::Identifying)
        ) || self == next
    }

    /// Validated transition.
    pub fn enter(self, next: Mode) -> Result<Mode, Error> {
        if self.can_enter(next) {
            Ok(next)
        } else {
            Err(Error::ModeConflict {
                active: self,
                requested: next,
            })
        }
    }
}
