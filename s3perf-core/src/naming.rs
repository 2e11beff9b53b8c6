//! Object names for write workloads.

use uuid::Uuid;

/// Generates a fresh, random object name on every call.
///
/// Names are hyphenated UUIDv4 strings, so they do not collide within or across runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectNamer;

impl ObjectNamer {
    /// Creates a new namer.
    pub fn new() -> Self {
        Self
    }

    /// Returns a new object name.
    pub fn next_name(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
