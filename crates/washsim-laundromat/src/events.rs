//! Events exchanged by the laundromat components.

use serde::Serialize;

/// Emitted by a student task to the statistics collector
/// when the student reaches a terminal state.
#[derive(Clone, Serialize)]
pub struct StudentDeparted {
    /// Identifier of the departed student.
    pub student_id: u32,
    /// Whether the student washed or walked out.
    pub washed: bool,
}
