//! Application bootstrap and orchestration.
//!
//! Owns the explicitly constructed collaborators (session store, identity
//! provider, document store, push delivery, local database) and wires the
//! state machines to them. Nothing in here is ambient or module-global;
//! every handle is injected at construction so tests can substitute
//! mocks.
//!
//! Every failure path below ends in either "treat as logged out" or "log
//! and continue" -- nothing is fatal to the process.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::Utc;

use crate::error::{AuthError, CoreError, ValidationError};
use crate::events::Event;
use crate::ledger::CompletionLedger;
use crate::reminder::ReminderConfig;
use crate::remote::{device_token, AuthTokens, DocStoreClient, IdentityClient, PushClient, UserDocument};
use crate::session::{Session, SessionStatus, SessionStore, TokenLifecycle};
use crate::storage::{Config, Database};
use crate::timer::{ExerciseKind, ExerciseTimer};

/// Where the shell should land after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ExerciseHome,
    Login,
}

/// The assembled application core.
pub struct App {
    config: Config,
    store: SessionStore,
    identity: IdentityClient,
    docs: DocStoreClient,
    push: PushClient,
    db: Database,
}

impl App {
    /// Assemble from on-disk config and the default data directory.
    pub fn bootstrap() -> Result<Self, CoreError> {
        let config = Config::load_or_default();
        let store = SessionStore::open()?;
        let db = Database::open()?;
        Self::with_parts(config, store, db)
    }

    /// Assemble from explicit parts; clients are built from
    /// `config.backend`, so tests can point them at mock servers.
    pub fn with_parts(config: Config, store: SessionStore, db: Database) -> Result<Self, CoreError> {
        let identity = IdentityClient::new(&config.backend)?;
        let docs = DocStoreClient::new(&config.backend)?;
        let push = PushClient::new(&config.backend)?;
        Ok(Self {
            config,
            store,
            identity,
            docs,
            push,
            db,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.config.notifications.reminder_interval_secs)
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// App-launch auto-login: load the stored session, ensure it is
    /// usable, and route accordingly. No stored session means login --
    /// and zero network calls.
    pub async fn startup(&self) -> Route {
        let Some(session) = self.store.load() else {
            tracing::info!("no stored session, routing to login");
            return Route::Login;
        };
        match TokenLifecycle::new(&self.store, &self.identity)
            .ensure_valid(session)
            .await
        {
            SessionStatus::Valid(session) => {
                tracing::info!(email = %session.email, "auto-login succeeded");
                Route::ExerciseHome
            }
            SessionStatus::LoginRequired => Route::Login,
        }
    }

    /// Create an account and persist the resulting session. An account
    /// that already exists falls through to sign-in with the same
    /// credentials.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, CoreError> {
        let (email, password) = trimmed_credentials(email, password)?;
        match self.identity.sign_up(&email, &password).await {
            Ok(tokens) => self.persist_login(tokens, &email).await,
            Err(CoreError::Auth(AuthError::Provider(ref message))) if message == "EMAIL_EXISTS" => {
                tracing::debug!(%email, "account exists, signing in instead");
                self.sign_in(&email, &password).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CoreError> {
        let (email, password) = trimmed_credentials(email, password)?;
        let tokens = self.identity.sign_in(&email, &password).await?;
        self.persist_login(tokens, &email).await
    }

    async fn persist_login(&self, tokens: AuthTokens, email: &str) -> Result<Session, CoreError> {
        let fcm_token = device_token(&self.db)?;
        let session = Session {
            user_id: tokens.user_id,
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
            email: email.to_string(),
            fcm_token: Some(fcm_token.clone()),
        };
        self.store.save(&session)?;

        // Register the device token in the user document so reminders can
        // reach this install. Best effort.
        let patch = UserDocument {
            fcm_token: Some(fcm_token),
            ..Default::default()
        };
        if let Err(e) = self
            .docs
            .merge_user(&session.user_id, &session.id_token, &patch)
            .await
        {
            tracing::warn!(error = %e, "failed to register device token");
        }
        Ok(session)
    }

    /// Log out: drop the stored session.
    pub fn logout(&self) -> Result<(), CoreError> {
        self.store.clear()
    }

    /// A usable session or `LoginRequired`.
    pub async fn require_session(&self) -> Result<Session, CoreError> {
        let Some(session) = self.store.load() else {
            return Err(AuthError::LoginRequired.into());
        };
        match TokenLifecycle::new(&self.store, &self.identity)
            .ensure_valid(session)
            .await
        {
            SessionStatus::Valid(session) => Ok(session),
            SessionStatus::LoginRequired => Err(AuthError::LoginRequired.into()),
        }
    }

    // ── Exercise flow ────────────────────────────────────────────────

    /// Screen entry: pull the configured duration from the user document
    /// and restore any saved progress for this exercise kind.
    pub async fn open_exercise(&self, kind: ExerciseKind) -> Result<ExerciseTimer, CoreError> {
        let session = self.require_session().await?;
        let total_secs = self.exercise_duration_secs(&session).await;
        let progress = self.db.load_progress()?;
        Ok(ExerciseTimer::with_progress(kind, total_secs, progress.as_ref()))
    }

    /// Screen exit: persist in-flight progress, overwriting the previous
    /// record.
    pub fn suspend_exercise(&self, timer: &mut ExerciseTimer) -> Result<Option<Event>, CoreError> {
        let (progress, event) = timer.suspend();
        self.db.save_progress(&progress)?;
        Ok(event)
    }

    /// The saved in-flight progress record, if any.
    pub fn saved_progress(&self) -> Result<Option<crate::timer::SavedProgress>, CoreError> {
        self.db.load_progress()
    }

    /// Natural expiry: record today in the completion ledger. A failed
    /// remote write is logged and dropped; the session still counts
    /// locally for this run.
    pub async fn complete_exercise(&self, kind: ExerciseKind) -> Option<Event> {
        if let Err(e) = self.db.clear_progress() {
            tracing::warn!(error = %e, "failed to clear saved progress");
        }
        let session = match self.require_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, %kind, "completion not recorded");
                return None;
            }
        };
        let ledger = CompletionLedger::new(self.docs.clone());
        match ledger.mark_today(&session.user_id, &session.id_token).await {
            Ok(outcome) => {
                let date = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
                let mut cached = self.db.completed_days().unwrap_or_default();
                cached.insert(date.clone());
                if let Err(e) = self.db.replace_completed_days(&cached) {
                    tracing::warn!(error = %e, "failed to update completed-days cache");
                }
                Some(Event::DayMarked {
                    date,
                    outcome,
                    at: Utc::now(),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, %kind, "failed to record completed day");
                None
            }
        }
    }

    /// Completed days, remote-first with the local cache as fallback when
    /// the backend is unreachable.
    pub async fn completed_days(&self) -> Result<BTreeSet<String>, CoreError> {
        let session = self.require_session().await?;
        let ledger = CompletionLedger::new(self.docs.clone());
        match ledger.fetch(&session.user_id, &session.id_token).await {
            Ok(days) => {
                if let Err(e) = self.db.replace_completed_days(&days) {
                    tracing::warn!(error = %e, "failed to refresh completed-days cache");
                }
                Ok(days)
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed, serving cached completed days");
                self.db.completed_days()
            }
        }
    }

    // ── Settings ─────────────────────────────────────────────────────

    /// Current exercise duration in seconds: the user document's value,
    /// falling back to the configured default. A user document with no
    /// duration yet gets the default written back.
    pub async fn exercise_duration_secs(&self, session: &Session) -> u32 {
        let default = self.config.exercise.default_duration_secs;
        match self.docs.fetch_user(&session.user_id, &session.id_token).await {
            Ok(doc) => match doc.exercise_duration {
                Some(secs) if secs > 0 => secs,
                _ => {
                    let patch = UserDocument {
                        exercise_duration: Some(default),
                        ..Default::default()
                    };
                    if let Err(e) = self
                        .docs
                        .merge_user(&session.user_id, &session.id_token, &patch)
                        .await
                    {
                        tracing::warn!(error = %e, "failed to seed exercise duration");
                    }
                    default
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "duration fetch failed, using default");
                default
            }
        }
    }

    /// Set the exercise duration from user input in whole minutes.
    /// Rejects non-numeric or zero input at the boundary with no state
    /// mutation. Returns the new duration in seconds.
    pub async fn set_exercise_duration(&self, minutes_input: &str) -> Result<u32, CoreError> {
        let minutes: u32 = minutes_input
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidDuration(minutes_input.to_string()))?;
        if minutes == 0 {
            return Err(ValidationError::InvalidDuration(minutes_input.to_string()).into());
        }
        let secs = minutes * 60;

        let session = self.require_session().await?;
        let patch = UserDocument {
            exercise_duration: Some(secs),
            ..Default::default()
        };
        if let Err(e) = self
            .docs
            .merge_user(&session.user_id, &session.id_token, &patch)
            .await
        {
            // Settings saves are best effort; the next screen entry
            // re-reads whatever the document actually holds.
            tracing::warn!(error = %e, "failed to save exercise duration");
        }
        Ok(secs)
    }

    // ── Reminders ────────────────────────────────────────────────────

    /// Validate and store a reminder time, then attempt one delivery
    /// right away and report the outcome. Invalid input is rejected
    /// before any network traffic.
    pub async fn set_reminder(&self, time_of_day: &str) -> Result<ReminderConfig, CoreError> {
        let (hour, minute) = crate::reminder::parse_time_of_day(time_of_day)?;
        let time = format!("{hour:02}:{minute:02}");

        let session = self.require_session().await?;
        let doc = self
            .docs
            .fetch_user(&session.user_id, &session.id_token)
            .await
            .unwrap_or_default();
        let reminder = ReminderConfig {
            time_of_day: time,
            target_token: doc
                .fcm_token
                .or_else(|| session.fcm_token.clone())
                .ok_or_else(|| CoreError::Custom("no device registration token on record".into()))?,
        };

        let patch = UserDocument {
            reminder_time: Some(reminder.time_of_day.clone()),
            ..Default::default()
        };
        if let Err(e) = self
            .docs
            .merge_user(&session.user_id, &session.id_token, &patch)
            .await
        {
            tracing::warn!(error = %e, "failed to save reminder time");
        }

        self.push
            .deliver(
                &reminder.target_token,
                "Vision Therapy Reminder",
                &format!("Time for your exercise at {}!", reminder.time_of_day),
            )
            .await?;
        tracing::info!(time = %reminder.time_of_day, "reminder set and delivered");
        Ok(reminder)
    }
}

fn trimmed_credentials(email: &str, password: &str) -> Result<(String, String), ValidationError> {
    let email = email.trim();
    let password = password.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::EmptyCredentials);
    }
    Ok((email.to_string(), password.to_string()))
}
