use serde::{Deserialize, Serialize};

/// One manifest entry. Tracks carry no id field; identity is the position in
/// the catalog order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub file: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatTarget {
    Finite(u32),
    Infinite,
}

impl Default for RepeatTarget {
    fn default() -> Self {
        Self::Finite(1)
    }
}

impl RepeatTarget {
    /// Cycles through the offered options: 1x, 3x, 10x, infinite.
    pub fn next(self) -> Self {
        match self {
            Self::Finite(count) if count < 3 => Self::Finite(3),
            Self::Finite(count) if count < 10 => Self::Finite(10),
            Self::Finite(_) => Self::Infinite,
            Self::Infinite => Self::Finite(1),
        }
    }

    pub fn allows_replay(self, play_count: u32) -> bool {
        match self {
            Self::Finite(target) => play_count < target,
            Self::Infinite => true,
        }
    }

    pub fn label(self) -> String {
        match self {
            Self::Finite(count) => format!("x{count}"),
            Self::Infinite => String::from("inf"),
        }
    }
}
