//! Transient notifications shown after a shortlist action.
//!
//! The store only reports outcomes. Hosts turn them into toasts with
//! [`Notice`], so wording stays out of the core and each of the four cases
//! stays distinguishable.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::config::CollectionConfig;
use crate::store::ToggleOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    Added { label: String },
    Removed { label: String },
    CapacityReached { label: String, capacity: usize },
    Cleared { label: String },
}

impl Notice {
    pub fn for_outcome(outcome: ToggleOutcome, config: &CollectionConfig) -> Self {
        let label = config.label.clone();
        match outcome {
            ToggleOutcome::Added => Notice::Added { label },
            ToggleOutcome::Removed => Notice::Removed { label },
            ToggleOutcome::RejectedCapacity => Notice::CapacityReached {
                label,
                capacity: config.capacity.map_or(0, |c| c.get()),
            },
        }
    }

    pub fn cleared(config: &CollectionConfig) -> Self {
        Notice::Cleared {
            label: config.label.clone(),
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Added { label } => write!(f, "Added to {}", label),
            Notice::Removed { label } => write!(f, "Removed from {}", label),
            Notice::CapacityReached { label, capacity } => {
                write!(f, "Your {} is full: you can keep up to {} items at a time", label, capacity)
            }
            Notice::Cleared { label } => write!(f, "{} cleared", capitalize(label)),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
