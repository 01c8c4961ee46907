use std::io::Write;
use std::time::Duration;

use clap::{Subcommand, ValueEnum};
use orthoptic_core::{format_remaining, App, Event, ExerciseKind};

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Stereogram,
    PencilPushup,
}

impl From<KindArg> for ExerciseKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Stereogram => ExerciseKind::Stereogram,
            KindArg::PencilPushup => ExerciseKind::PencilPushUp,
        }
    }
}

#[derive(Subcommand)]
pub enum ExerciseAction {
    /// Run an exercise session; Ctrl-C saves progress for next time
    Run { kind: KindArg },
    /// Show saved progress
    Status,
}

pub fn run(action: ExerciseAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::bootstrap()?;
    let rt = tokio::runtime::Runtime::new()?;

    match action {
        ExerciseAction::Run { kind } => rt.block_on(run_session(&app, kind.into()))?,
        ExerciseAction::Status => match app.saved_progress()? {
            Some(progress) => println!(
                "{}: {} remaining",
                progress.exercise_kind,
                format_remaining(progress.remaining_secs)
            ),
            None => println!("no exercise in progress"),
        },
    }
    Ok(())
}

async fn run_session(app: &App, kind: ExerciseKind) -> Result<(), Box<dyn std::error::Error>> {
    let mut timer = app.open_exercise(kind).await?;
    timer.start();
    println!("{kind}: {}", format_remaining(timer.remaining_secs()));

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await; // the first tick resolves immediately
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let completed = matches!(timer.tick(), Some(Event::ExerciseCompleted { .. }));
                print!("\r{} ", format_remaining(timer.remaining_secs()));
                std::io::stdout().flush()?;
                if completed {
                    // Completion cue; the mobile shell plays a sound here.
                    println!("\nTime's up!\x07");
                    if let Some(event) = app.complete_exercise(kind).await {
                        println!("{}", serde_json::to_string_pretty(&event)?);
                    }
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                app.suspend_exercise(&mut timer)?;
                println!(
                    "\nprogress saved at {}",
                    format_remaining(timer.remaining_secs())
                );
                break;
            }
        }
    }
    Ok(())
}
