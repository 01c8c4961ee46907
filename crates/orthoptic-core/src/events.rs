use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::MarkOutcome;
use crate::timer::{ExerciseKind, TimerState};

/// Every state change in the core produces an Event.
/// The UI collaborator consumes them; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ExerciseStarted {
        kind: ExerciseKind,
        duration_secs: u32,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    ExercisePaused {
        kind: ExerciseKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    ExerciseResumed {
        kind: ExerciseKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Natural expiry. Emitted exactly once per run; the caller forwards
    /// this to the completion ledger and plays the completion cue.
    ExerciseCompleted {
        kind: ExerciseKind,
        at: DateTime<Utc>,
    },
    /// Screen exit with time still on the clock. Progress is persisted,
    /// nothing is marked complete.
    ExerciseSuspended {
        kind: ExerciseKind,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Today's date was recorded (or found already recorded) in the
    /// completed-days ledger.
    DayMarked {
        date: String,
        outcome: MarkOutcome,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        kind: ExerciseKind,
        remaining_secs: u32,
        total_secs: u32,
        progress: f64,
        at: DateTime<Utc>,
    },
}
