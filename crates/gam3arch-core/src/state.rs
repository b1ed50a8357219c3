use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of behavioural states an agent can occupy.
pub const STATE_COUNT: usize = 4;

/// Behavioural state of an agent. The ordinal index is fixed and is the row
/// and column index of every 4x4 matrix in the model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    Forge,
    Nexus,
    Back,
    Horizon,
}

impl State {
    pub const ALL: [State; STATE_COUNT] = [State::Forge, State::Nexus, State::Back, State::Horizon];

    pub fn index(self) -> usize {
        match self {
            State::Forge => 0,
            State::Nexus => 1,
            State::Back => 2,
            State::Horizon => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<State> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            State::Forge => "Forge",
            State::Nexus => "Nexus",
            State::Back => "Back",
            State::Horizon => "Horizon",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for State {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.name() == s.trim())
            .ok_or_else(|| format!("unknown state `{s}`"))
    }
}
