//! Chronological journal of observable student events.

use serde::Serialize;

/// Kind of observable event in a student's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TraceEventKind {
    /// The student arrived at the laundromat.
    Arrived,
    /// The student took a machine and started washing.
    StartedWashing,
    /// The student finished washing and released the machine.
    LeftAfterWashing,
    /// The student's patience ran out before a machine freed up.
    LeftWithoutWashing,
}

/// Single journal record.
#[derive(Clone, Debug, Serialize)]
pub struct TraceRecord {
    /// Simulation time of the event.
    pub time: f64,
    /// Identifier of the student.
    pub student_id: u32,
    /// What happened.
    pub kind: TraceEventKind,
}

/// Append-only journal of student events.
///
/// Records are appended under the monotonic simulation clock, so the journal
/// is chronological by construction. The model never depends on the journal:
/// it exists for post-run inspection and tests.
#[derive(Default)]
pub struct TraceJournal {
    records: Vec<TraceRecord>,
}

impl TraceJournal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record.
    pub fn record(&mut self, time: f64, student_id: u32, kind: TraceEventKind) {
        self.records.push(TraceRecord {
            time,
            student_id,
            kind,
        });
    }

    /// Returns all records in chronological order.
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Serializes the journal to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}
