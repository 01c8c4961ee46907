//! # Orthoptic Core Library
//!
//! Core business logic for the Orthoptic vision-therapy app: users sign
//! in, run timed eye exercises (stereogram viewing, pencil push-ups), and
//! have completed days recorded on a calendar. The mobile shell is a thin
//! layer over this library; the bundled CLI drives the same surface.
//!
//! ## Architecture
//!
//! - **Timer**: a caller-driven countdown state machine; the caller
//!   invokes `tick()` once per elapsed second
//! - **Session**: locally persisted identity plus the token lifecycle
//!   that keeps it usable
//! - **Ledger**: idempotent completed-days record in the per-user cloud
//!   document
//! - **Reminder**: cancellable recurring delivery plus one-shot reminders
//! - **Storage**: TOML configuration and SQLite-backed local state
//!
//! ## Key Components
//!
//! - [`ExerciseTimer`]: countdown state machine
//! - [`SessionStore`] / [`TokenLifecycle`]: session persistence and refresh
//! - [`CompletionLedger`]: completed-days record
//! - [`ReminderScheduler`]: recurring reminder delivery
//! - [`App`]: dependency-injected bootstrap wiring it all together

pub mod app;
pub mod error;
pub mod events;
pub mod ledger;
pub mod reminder;
pub mod remote;
pub mod session;
pub mod storage;
pub mod timer;

pub use app::{App, Route};
pub use error::{AuthError, CoreError, RemoteError, StorageError, ValidationError};
pub use events::Event;
pub use ledger::{day_status, CompletionLedger, DayStatus, MarkOutcome};
pub use reminder::{parse_time_of_day, ReminderConfig, ReminderScheduler, SchedulerError};
pub use remote::{DocStoreClient, IdentityClient, PushClient, UserDocument};
pub use session::{token_state, Session, SessionStatus, SessionStore, TokenLifecycle, TokenState};
pub use storage::{Config, Database};
pub use timer::{format_remaining, ExerciseKind, ExerciseTimer, SavedProgress, TimerState};
