//! Per-axis configuration values: priority and traversal order.

use serde::{Deserialize, Serialize};

/// How strongly an axis is favoured when ranking neighbors.
///
/// Any integer is accepted; values beyond [`Priority::MIN`]..=[`Priority::MAX`]
/// rank the same as the nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const MIN: Priority = Priority(-10);
    pub const LOW: Priority = Priority(-5);
    pub const NORMAL: Priority = Priority(0);
    pub const HIGH: Priority = Priority(5);
    pub const MAX: Priority = Priority(10);

    pub fn value(self) -> i32 {
        self.0
    }

    /// Priority clamped into the named range.
    pub fn clamped(self) -> i32 {
        self.0.clamp(Self::MIN.0, Self::MAX.0)
    }

    /// Cost of one step along an axis with this priority.
    ///
    /// `MAX` costs 1 per step, `NORMAL` 11, `MIN` 21.
    pub fn step_weight(self) -> usize {
        (Self::MAX.0 - self.clamped()) as usize + 1
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::NORMAL
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Priority::MIN => write!(f, "MIN"),
            Priority::LOW => write!(f, "LOW"),
            Priority::NORMAL => write!(f, "NORMAL"),
            Priority::HIGH => write!(f, "HIGH"),
            Priority::MAX => write!(f, "MAX"),
            Priority(other) => write!(f, "{other}"),
        }
    }
}

/// Which directions along an axis are eligible for caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum Order {
    /// Only negative offsets.
    Backward = -1,
    /// Both directions, forward first at equal distance.
    #[default]
    Centered = 0,
    /// Only positive offsets.
    Forward = 1,
}

impl Order {
    pub fn value(self) -> i32 {
        self as i32
    }

    /// Whether an offset of `delta` along the axis is allowed.
    pub fn admits(self, delta: isize) -> bool {
        match self {
            Order::Centered => true,
            Order::Forward => delta > 0,
            Order::Backward => delta < 0,
        }
    }
}

impl TryFrom<i32> for Order {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Order::Backward),
            0 => Ok(Order::Centered),
            1 => Ok(Order::Forward),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Backward => write!(f, "backward"),
            Order::Centered => write!(f, "centered"),
            Order::Forward => write!(f, "forward"),
        }
    }
}
