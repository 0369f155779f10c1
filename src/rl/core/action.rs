//! Action Space
//!
//! Discrete action space shared by the environment and every agent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArbError;

/// Number of discrete actions
pub const NUM_ACTIONS: usize = 3;

/// Battery dispatch decision for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Action {
    /// Leave stored energy untouched
    #[default]
    Hold = 0,
    /// Buy energy from the grid into storage
    Charge = 1,
    /// Sell stored energy to the grid
    Discharge = 2,
}

impl Action {
    /// Convert from action index
    pub fn from_index(index: usize) -> Result<Self, ArbError> {
        match index {
            0 => Ok(Self::Hold),
            1 => Ok(Self::Charge),
            2 => Ok(Self::Discharge),
            _ => Err(ArbError::InvalidAction(format!(
                "action index {} outside 0..{}",
                index, NUM_ACTIONS
            ))),
        }
    }

    /// Convert to action index
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// Get all possible actions
    pub fn all() -> &'static [Action] {
        &[Self::Hold, Self::Charge, Self::Discharge]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hold => "hold",
            Self::Charge => "charge",
            Self::Discharge => "discharge",
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = ArbError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::from_index(index)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ArbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hold" | "h" => Ok(Self::Hold),
            "charge" | "c" | "buy" => Ok(Self::Charge),
            "discharge" | "d" | "sell" => Ok(Self::Discharge),
            other => Err(ArbError::InvalidAction(format!("unknown action '{}'", other))),
        }
    }
}
