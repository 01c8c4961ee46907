use clap::Subcommand;
use orthoptic_core::{App, ReminderScheduler};

#[derive(Subcommand)]
pub enum RemindAction {
    /// Store a reminder time and deliver one push right away
    Set {
        /// Time of day as HH:MM (24-hour)
        time: String,
    },
    /// Print a recurring local reminder until Ctrl-C
    Watch {
        /// Interval in seconds (defaults to notifications.reminder_interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },
}

pub fn run(action: RemindAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::bootstrap()?;
    let rt = tokio::runtime::Runtime::new()?;

    match action {
        RemindAction::Set { time } => {
            let reminder = rt.block_on(app.set_reminder(&time))?;
            println!("Reminder set for {}", reminder.time_of_day);
        }
        RemindAction::Watch { interval } => {
            if !app.config().notifications.enabled {
                println!("notifications are disabled (notifications.enabled = false)");
                return Ok(());
            }
            let interval = interval
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| app.reminder_interval());

            rt.block_on(async {
                let mut scheduler = ReminderScheduler::new();
                scheduler.start(interval, || async {
                    println!("Vision Therapy Reminder: it's time for your exercise!\x07");
                })?;
                tokio::signal::ctrl_c().await?;
                // Screen exit: the scheduler must be stopped before we
                // leave, never left running into the next entry.
                scheduler.stop().await;
                Ok::<(), Box<dyn std::error::Error>>(())
            })?;
            println!("reminder watch stopped");
        }
    }
    Ok(())
}
