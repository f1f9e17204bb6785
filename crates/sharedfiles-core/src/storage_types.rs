use std::fmt::{Display, Formatter, Result as FmtResult};

/// Storage backend kinds
///
/// Exactly one kind is selected at startup and kept for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Set of capacity-bounded remote object stores
    Pool,
    /// Local directory plus SQLite metadata table
    Local,
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BackendKind::Pool => write!(f, "pool"),
            BackendKind::Local => write!(f, "local"),
        }
    }
}
