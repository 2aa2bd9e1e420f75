use serde::{Deserialize, Serialize};
use slot_inspect_core::BudgetExceeded;
use std::fmt;

/// Which side of the registration a failure refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    Reference,
    Test,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageRole::Reference => "reference",
            ImageRole::Test => "test",
        })
    }
}

/// Why registration produced no homography.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlignmentError {
    #[error("not enough descriptors in {image} image ({count} < 4)")]
    NotEnoughDescriptors { image: ImageRole, count: usize },
    #[error("not enough matches ({count} < 4)")]
    NotEnoughMatches { count: usize },
    #[error("homography solver found no consistent model")]
    SolverFailed,
    #[error("registration cancelled")]
    Cancelled,
    #[error("registration deadline exceeded")]
    DeadlineExceeded,
}

impl From<BudgetExceeded> for AlignmentError {
    fn from(e: BudgetExceeded) -> Self {
        match e {
            BudgetExceeded::Cancelled => AlignmentError::Cancelled,
            BudgetExceeded::DeadlineExceeded => AlignmentError::DeadlineExceeded,
        }
    }
}
