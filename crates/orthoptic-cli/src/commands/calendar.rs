use chrono::{Datelike, Local, NaiveDate};
use clap::Subcommand;
use orthoptic_core::{day_status, App, DayStatus};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Show a month with completion markers
    Show {
        /// Month as YYYY-MM (defaults to the current month)
        month: Option<String>,
    },
}

pub fn run(action: CalendarAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::bootstrap()?;
    let rt = tokio::runtime::Runtime::new()?;

    match action {
        CalendarAction::Show { month } => {
            let today = Local::now().date_naive();
            let first = match month {
                Some(raw) => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
                    .map_err(|_| format!("invalid month '{raw}': expected YYYY-MM"))?,
                None => today.with_day(1).ok_or("could not compute first of month")?,
            };
            let completed = rt.block_on(app.completed_days())?;

            println!("{}", first.format("%B %Y"));
            println!("Mo Tu We Th Fr Sa Su");
            let mut line = "   ".repeat(first.weekday().num_days_from_monday() as usize);
            let mut date = first;
            while date.month() == first.month() {
                let marker = match day_status(date, today, &completed) {
                    DayStatus::Completed => '*',
                    DayStatus::Missed => '.',
                    DayStatus::Upcoming => ' ',
                };
                line.push_str(&format!("{:>2}{marker}", date.day()));
                if date.weekday().num_days_from_monday() == 6 {
                    println!("{}", line.trim_end());
                    line.clear();
                }
                date = match date.succ_opt() {
                    Some(next) => next,
                    None => break,
                };
            }
            if !line.is_empty() {
                println!("{}", line.trim_end());
            }
            println!("\n* completed   . missed");
        }
    }
    Ok(())
}
