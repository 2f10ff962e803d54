use std::fmt;
use std::str::FromStr;

use common::consts::{DEFAULT_HIGH_PRIORITY_MINUTES, DEFAULT_MEDIUM_PRIORITY_MINUTES};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Maps waiting minutes to a priority tier. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitClassifier {
    medium_after_minutes: i64,
    high_after_minutes: i64,
}

impl WaitClassifier {
    pub fn new(medium_after_minutes: i64, high_after_minutes: i64) -> Self {
        Self {
            medium_after_minutes,
            high_after_minutes,
        }
    }

    pub fn classify(&self, waiting_minutes: i64) -> Priority {
        if waiting_minutes >= self.high_after_minutes {
            Priority::High
        } else if waiting_minutes >= self.medium_after_minutes {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

impl Default for WaitClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIUM_PRIORITY_MINUTES, DEFAULT_HIGH_PRIORITY_MINUTES)
    }
}
