//! Job history records

use serde::{Deserialize, Serialize};

/// One submitted compute job and the input file it was started from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Provider-assigned job identifier
    pub id: String,
    /// Original input file path as given on the command line
    pub file: String,
}

impl JobRecord {
    pub fn new(id: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file: file.into(),
        }
    }
}
