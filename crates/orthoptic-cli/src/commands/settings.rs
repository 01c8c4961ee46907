use clap::Subcommand;
use orthoptic_core::App;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show the current exercise duration
    Show,
    /// Set the exercise duration in whole minutes
    SetDuration { minutes: String },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::bootstrap()?;
    let rt = tokio::runtime::Runtime::new()?;

    match action {
        SettingsAction::Show => {
            let session = rt.block_on(app.require_session())?;
            let secs = rt.block_on(app.exercise_duration_secs(&session));
            println!("Current duration: {} min", secs / 60);
        }
        SettingsAction::SetDuration { minutes } => {
            let secs = rt.block_on(app.set_exercise_duration(&minutes))?;
            println!("Exercise duration set to {} min", secs / 60);
        }
    }
    Ok(())
}
