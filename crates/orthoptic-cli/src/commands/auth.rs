use clap::Subcommand;
use orthoptic_core::remote::humanize_provider_message;
use orthoptic_core::{App, AuthError, CoreError, Route};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account (signs in instead if it already exists)
    Signup { email: String, password: String },
    /// Sign in with email and password
    Login { email: String, password: String },
    /// Clear the stored session
    Logout,
    /// Show whether a usable session is on disk
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::bootstrap()?;
    let rt = tokio::runtime::Runtime::new()?;

    match action {
        AuthAction::Signup { email, password } => {
            let session = rt
                .block_on(app.sign_up(&email, &password))
                .map_err(display_auth_error)?;
            println!("signed in as {}", session.email);
        }
        AuthAction::Login { email, password } => {
            let session = rt
                .block_on(app.sign_in(&email, &password))
                .map_err(display_auth_error)?;
            println!("signed in as {}", session.email);
        }
        AuthAction::Logout => {
            app.logout()?;
            println!("logged out");
        }
        AuthAction::Status => match rt.block_on(app.startup()) {
            Route::ExerciseHome => println!("logged in"),
            Route::Login => println!("login required"),
        },
    }
    Ok(())
}

/// Provider rejection codes read better with the underscores dropped.
fn display_auth_error(err: CoreError) -> Box<dyn std::error::Error> {
    match err {
        CoreError::Auth(AuthError::Provider(message)) => {
            humanize_provider_message(&message).into()
        }
        other => Box::new(other),
    }
}
