//! File id validation shared by every backend.

use crate::traits::{StorageError, StorageResult};

/// Reject ids that are not a single, plain path component.
///
/// Ids become file names (local) and object names (pools), so anything that
/// could walk out of the storage root is refused.
pub fn validate_file_id(id: &str) -> StorageResult<()> {
    if id.is_empty() {
        return Err(StorageError::InvalidKey("File id is empty".to_string()));
    }

    if id == "." || id == ".." {
        return Err(StorageError::InvalidKey(
            "File id must not be a relative path component".to_string(),
        ));
    }

    if id.contains('/') || id.contains('\\') || id.contains('\0') {
        return Err(StorageError::InvalidKey(
            "File id contains invalid characters".to_string(),
        ));
    }

    Ok(())
}
