//! Domain entities mirrored from persistent storage.

use serde::Serialize;

/// A directory entry. `id` is assigned by the database on insert and never
/// changes afterwards; `name` and `email` are non-empty for every persisted
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
}
