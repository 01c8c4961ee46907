mod engine;

pub use engine::{format_remaining, ExerciseKind, ExerciseTimer, SavedProgress, TimerState};
