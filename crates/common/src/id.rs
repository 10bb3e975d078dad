//! ID generation utilities.

use ulid::Ulid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// Lowercase ULIDs sort by creation time, which keeps `id` a usable
    /// tie-breaker when ordering rows that share a timestamp.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a storage key for an uploaded file.
    ///
    /// Keys are grouped by owner so one project's media can be listed or
    /// purged together.
    #[must_use]
    pub fn storage_key(&self, owner: &str, extension: &str) -> String {
        let id = uuid::Uuid::now_v7().simple().to_string();
        if extension.is_empty() {
            format!("{owner}/{id}")
        } else {
            format!("{owner}/{id}.{extension}")
        }
    }
}
