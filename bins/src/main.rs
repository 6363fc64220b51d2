use std::{str::FromStr as _, sync::Arc};

use chrono::{Local, NaiveDate};
use dotenv::dotenv;
use eyre::{bail, eyre, Context, Result};
use ledger::{
    commands::{Command, CommandBus, CommandOutcome, Dispatcher},
    service::{
        calendar::{Calendar, ViewMode},
        notification::LogNotifier,
    },
    Ledger,
};
use log::{debug, info};
use model::{
    ids::{StudentId, TrainingId, WeekId},
    training::AttendanceStatus,
};
use storage::{rest::RestBackend, Storage};
use viewer::week::{render_week, WeekView};

const USAGE: &str = "usage:
  schedule-cli week [YYYY-MM-DD] [--templates]
  schedule-cli mark <training_id> <student_id> <STATUS> [YYYY-MM-DD]";

enum Cli {
    Week {
        date: NaiveDate,
        mode: ViewMode,
    },
    Mark {
        training_id: TrainingId,
        student_id: StudentId,
        status: AttendanceStatus,
        date: NaiveDate,
    },
}

impl Cli {
    fn parse(args: &[String]) -> Result<Cli> {
        let today = Local::now().date_naive();
        match args.first().map(String::as_str) {
            Some("week") => {
                let mut date = today;
                let mut mode = ViewMode::RealTrainings;
                for arg in &args[1..] {
                    if arg == "--templates" {
                        mode = ViewMode::Templates;
                    } else {
                        date = parse_date(arg)?;
                    }
                }
                Ok(Cli::Week { date, mode })
            }
            Some("mark") => {
                let [training_id, student_id, status, rest @ ..] = &args[1..] else {
                    bail!("{}", USAGE);
                };
                let date = match rest.first() {
                    Some(date) => parse_date(date)?,
                    None => today,
                };
                Ok(Cli::Mark {
                    training_id: TrainingId(
                        training_id.parse().context("training_id is not a number")?,
                    ),
                    student_id: StudentId(
                        student_id.parse().context("student_id is not a number")?,
                    ),
                    status: AttendanceStatus::from_str(status)
                        .map_err(|_| eyre!("Unknown status {}: {:?}", status, AttendanceStatus::list()))?,
                    date,
                })
            }
            _ => bail!("{}", USAGE),
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date {}, expected YYYY-MM-DD", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = dotenv();
    let env = env::Env::load().context("Failed to load config")?;
    pretty_env_logger::formatted_builder()
        .parse_filters(env.rust_log())
        .init();
    color_eyre::install()?;
    if let Err(err) = env_file {
        debug!(".env not loaded: {}", err);
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cli = Cli::parse(&args)?;

    info!("connecting to {}", env.api_url());
    let backend = RestBackend::new(env.api_url().clone(), env.api_token().map(ToOwned::to_owned))
        .context("Failed to create backend")?;
    let ledger = Ledger::new(Storage::new(Arc::new(backend)));
    let actor = env.actor();
    let today = Local::now().date_naive();

    match cli {
        Cli::Week { date, mode } => {
            let state = ledger.calendar.load_week(&actor, WeekId::new(date), mode).await;
            println!("{}", render_week(&state, &WeekView::for_actor(&actor, today, true)));
        }
        Cli::Mark {
            training_id,
            student_id,
            status,
            date,
        } => {
            let week = WeekId::new(date);
            let key = Calendar::query_key(&actor, week, ViewMode::RealTrainings);
            ledger
                .calendar
                .load_week(&actor, week, ViewMode::RealTrainings)
                .await;

            let (bus, _handle) =
                CommandBus::start(Dispatcher::new(ledger.clone(), Arc::new(LogNotifier)));
            let outcome = bus
                .request(
                    actor.clone(),
                    Command::MarkAttendance {
                        key,
                        training_id,
                        student_id,
                        status,
                    },
                )
                .await?;
            match outcome {
                CommandOutcome::Confirmed => println!("✅ Посещаемость отмечена"),
                CommandOutcome::RolledBack { error } => println!("❌ {}", error),
                CommandOutcome::Rejected(err) => println!("⚠️ {}", err.user_message()),
                CommandOutcome::AwaitingConfirmation(_) | CommandOutcome::Dismissed => {}
            }

            let state = ledger
                .calendar
                .load_week(&actor, week, ViewMode::RealTrainings)
                .await;
            println!("{}", render_week(&state, &WeekView::for_actor(&actor, today, true)));
        }
    }

    Ok(())
}
