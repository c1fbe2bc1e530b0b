mod engine;

pub use engine::{
    ClaimDecision, FallbackClosed, MainClosed, RuntimeState, WindowMachine, WindowPhase,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which of a task's two windows a claim or ledger event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Main,
    Fallback,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Main => "main",
            WindowKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(WindowKind::Main),
            "fallback" => Ok(WindowKind::Fallback),
            _ => Err(()),
        }
    }
}
