//! FILENAME: pivot-tree/src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Window start lies past its end.
    #[error("Invalid range: from {from} is greater than to {to}")]
    InvalidRange { from: usize, to: usize },
}
