//! Exercise timer implementation.
//!
//! The timer is a caller-driven state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` once per
//! elapsed second while the timer is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused | Completed)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, 180);
//! timer.start();
//! // Once per second:
//! timer.tick(); // Returns Some(Event::ExerciseCompleted) on expiry
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Stereogram,
    PencilPushUp,
}

impl ExerciseKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseKind::Stereogram => "Stereogram",
            ExerciseKind::PencilPushUp => "Pencil Push-Up",
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// The single overwritten in-flight progress record.
///
/// At most one exists per device; restored on re-entry when the
/// exercise kind matches, discarded otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedProgress {
    pub exercise_kind: ExerciseKind,
    pub remaining_secs: u32,
}

/// Countdown state machine for one exercise session.
///
/// Invariant: `0 <= remaining_secs <= total_secs` across every transition.
/// The completion event is emitted exactly once per natural expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseTimer {
    kind: ExerciseKind,
    total_secs: u32,
    remaining_secs: u32,
    state: TimerState,
}

impl ExerciseTimer {
    /// Create a fresh timer in `Idle` with the full duration remaining.
    pub fn new(kind: ExerciseKind, total_secs: u32) -> Self {
        Self {
            kind,
            total_secs,
            remaining_secs: total_secs,
            state: TimerState::Idle,
        }
    }

    /// Create a timer on screen entry, restoring saved progress when the
    /// kind matches. Progress for a different kind is ignored. A saved
    /// remaining above the current total (duration was shrunk since the
    /// save) is clamped to the total.
    pub fn with_progress(kind: ExerciseKind, total_secs: u32, progress: Option<&SavedProgress>) -> Self {
        let remaining_secs = match progress {
            Some(p) if p.exercise_kind == kind => p.remaining_secs.min(total_secs),
            _ => total_secs,
        };
        Self {
            kind,
            total_secs,
            remaining_secs,
            state: TimerState::Idle,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    /// 0.0 .. 1.0 progress through the session.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / self.total_secs as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            kind: self.kind,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            progress: self.progress(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle | TimerState::Paused | TimerState::Completed => {
                if self.remaining_secs == 0 {
                    // Previous run finished; restart from the full duration.
                    self.remaining_secs = self.total_secs;
                }
                self.state = TimerState::Running;
                Some(Event::ExerciseStarted {
                    kind: self.kind,
                    duration_secs: self.total_secs,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            TimerState::Running => None, // Already running.
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                Some(Event::ExercisePaused {
                    kind: self.kind,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Paused => {
                self.state = TimerState::Running;
                Some(Event::ExerciseResumed {
                    kind: self.kind,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// The single start/pause/resume control. One button drives the whole
    /// session: Idle starts, Running pauses, Paused resumes, Completed
    /// restarts from the full duration.
    pub fn toggle(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle | TimerState::Completed => self.start(),
            TimerState::Running => self.pause(),
            TimerState::Paused => self.resume(),
        }
    }

    /// Call once per elapsed second. Returns `Some(Event::ExerciseCompleted)`
    /// exactly once, when the countdown reaches zero. Ticks in any state
    /// other than `Running` are no-ops.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = TimerState::Completed;
            return Some(Event::ExerciseCompleted {
                kind: self.kind,
                at: Utc::now(),
            });
        }
        None
    }

    /// Update the total duration. Applies to future sessions; the current
    /// remaining count is only clamped down when it exceeds the new total.
    pub fn change_duration(&mut self, new_total_secs: u32) {
        self.total_secs = new_total_secs;
        self.remaining_secs = self.remaining_secs.min(new_total_secs);
    }

    /// Screen exit: stop ticking and hand back the progress record to be
    /// persisted. Does not complete the session and emits no completion.
    pub fn suspend(&mut self) -> (SavedProgress, Option<Event>) {
        let event = match self.state {
            TimerState::Running | TimerState::Paused => {
                self.state = TimerState::Paused;
                Some(Event::ExerciseSuspended {
                    kind: self.kind,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        };
        (
            SavedProgress {
                exercise_kind: self.kind,
                remaining_secs: self.remaining_secs,
            },
            event,
        )
    }
}

/// Format a remaining-seconds count as `MM:SS` for display.
pub fn format_remaining(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed_events(timer: &mut ExerciseTimer, ticks: u32) -> u32 {
        (0..ticks)
            .filter(|_| matches!(timer.tick(), Some(Event::ExerciseCompleted { .. })))
            .count() as u32
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, 180);
        assert_eq!(timer.state(), TimerState::Idle);

        assert!(timer.start().is_some());
        assert_eq!(timer.state(), TimerState::Running);

        assert!(timer.pause().is_some());
        assert_eq!(timer.state(), TimerState::Paused);

        assert!(timer.resume().is_some());
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn full_run_completes_exactly_once() {
        let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, 180);
        timer.start();
        assert_eq!(completed_events(&mut timer, 180), 1);
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.state(), TimerState::Completed);

        // A 181st tick is a no-op.
        assert!(timer.tick().is_none());
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(timer.state(), TimerState::Completed);
    }

    #[test]
    fn toggle_is_single_control() {
        let mut timer = ExerciseTimer::new(ExerciseKind::PencilPushUp, 60);
        assert!(matches!(timer.toggle(), Some(Event::ExerciseStarted { .. })));
        assert!(matches!(timer.toggle(), Some(Event::ExercisePaused { .. })));
        assert!(matches!(timer.toggle(), Some(Event::ExerciseResumed { .. })));
    }

    #[test]
    fn pause_loses_no_time() {
        let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, 180);
        timer.start();
        for _ in 0..30 {
            timer.tick();
        }
        let before = timer.remaining_secs();
        timer.toggle(); // pause
        assert_eq!(timer.remaining_secs(), before);
        timer.toggle(); // resume
        assert_eq!(timer.remaining_secs(), before);
        timer.tick();
        assert_eq!(timer.remaining_secs(), before - 1);
    }

    #[test]
    fn ticks_while_paused_are_noops() {
        let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, 10);
        timer.start();
        timer.tick();
        timer.pause();
        for _ in 0..20 {
            assert!(timer.tick().is_none());
        }
        assert_eq!(timer.remaining_secs(), 9);
    }

    #[test]
    fn change_duration_clamps_only_downward() {
        let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, 180);
        assert_eq!(timer.remaining_secs(), 180);
        timer.change_duration(60);
        assert_eq!(timer.remaining_secs(), 60);
        assert_eq!(timer.total_secs(), 60);

        let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, 180);
        timer.start();
        for _ in 0..150 {
            timer.tick();
        }
        assert_eq!(timer.remaining_secs(), 30);
        timer.change_duration(60);
        assert_eq!(timer.remaining_secs(), 30);
        assert_eq!(timer.total_secs(), 60);
    }

    #[test]
    fn start_after_completion_resets() {
        let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, 3);
        timer.start();
        completed_events(&mut timer, 3);
        assert_eq!(timer.state(), TimerState::Completed);

        timer.start();
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.remaining_secs(), 3);
    }

    #[test]
    fn restore_matching_kind() {
        let progress = SavedProgress {
            exercise_kind: ExerciseKind::Stereogram,
            remaining_secs: 42,
        };
        let timer = ExerciseTimer::with_progress(ExerciseKind::Stereogram, 180, Some(&progress));
        assert_eq!(timer.remaining_secs(), 42);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn restore_other_kind_resets() {
        let progress = SavedProgress {
            exercise_kind: ExerciseKind::Stereogram,
            remaining_secs: 42,
        };
        let timer = ExerciseTimer::with_progress(ExerciseKind::PencilPushUp, 180, Some(&progress));
        assert_eq!(timer.remaining_secs(), 180);
    }

    #[test]
    fn restore_clamps_to_shrunk_total() {
        let progress = SavedProgress {
            exercise_kind: ExerciseKind::Stereogram,
            remaining_secs: 170,
        };
        let timer = ExerciseTimer::with_progress(ExerciseKind::Stereogram, 60, Some(&progress));
        assert_eq!(timer.remaining_secs(), 60);
    }

    #[test]
    fn suspend_returns_progress_without_completing() {
        let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, 180);
        timer.start();
        for _ in 0..10 {
            timer.tick();
        }
        let (progress, event) = timer.suspend();
        assert_eq!(progress.exercise_kind, ExerciseKind::Stereogram);
        assert_eq!(progress.remaining_secs, 170);
        assert!(matches!(event, Some(Event::ExerciseSuspended { .. })));
        assert_eq!(timer.state(), TimerState::Paused);
        assert!(timer.tick().is_none());
    }

    #[test]
    fn format_remaining_is_mm_ss() {
        assert_eq!(format_remaining(180), "03:00");
        assert_eq!(format_remaining(61), "01:01");
        assert_eq!(format_remaining(0), "00:00");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Cmd {
            Toggle,
            Tick,
            ChangeDuration(u32),
        }

        fn cmd_strategy() -> impl Strategy<Value = Cmd> {
            prop_oneof![
                Just(Cmd::Toggle),
                Just(Cmd::Tick),
                (1u32..600).prop_map(Cmd::ChangeDuration),
            ]
        }

        proptest! {
            #[test]
            fn remaining_never_exceeds_total(
                total in 1u32..600,
                cmds in proptest::collection::vec(cmd_strategy(), 0..200),
            ) {
                let mut timer = ExerciseTimer::new(ExerciseKind::Stereogram, total);
                for cmd in cmds {
                    match cmd {
                        Cmd::Toggle => { timer.toggle(); }
                        Cmd::Tick => { timer.tick(); }
                        Cmd::ChangeDuration(d) => timer.change_duration(d),
                    }
                    prop_assert!(timer.remaining_secs() <= timer.total_secs());
                }
            }
        }
    }
}
