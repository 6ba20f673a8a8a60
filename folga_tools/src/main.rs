use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use folga_core::calendar_date::parse_iso_date;
use folga_core::history::check_last_leave;
use folga_core::upcoming::upcoming_leaves;
use folga_core::{
    compute_window_observed, validate_observed, Policy, StaffLeaveHistory, TracingObserver,
    DEFAULT_MAX_CONSECUTIVE_WORKING_DAYS,
};
use folga_store::config::StoreConfig;
use folga_store::domain::models::{NewSchedule, Shift};
use folga_store::AppServices;

// Command-line arguments
#[derive(Parser)]
#[command(name = "folga_tools")]
#[command(version = "0.1.0")]
#[command(about = "Leave-day eligibility for monthly schedules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// SQLite database for the store-backed commands
    #[arg(long, global = true, env = "FOLGA_DATABASE_URL")]
    database_url: Option<String>,

    /// Write the JSON result here instead of stdout
    #[arg(short, long, global = true)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct PolicyArgs {
    #[arg(long)]
    month: u32,

    #[arg(long)]
    year: i32,

    /// Maximum consecutive working days
    #[arg(long, env = "FOLGA_MAX_WORKING_DAYS", default_value_t = DEFAULT_MAX_CONSECUTIVE_WORKING_DAYS)]
    max_days: u32,
}

impl PolicyArgs {
    fn policy(&self) -> Result<Policy> {
        Ok(Policy::new(self.month, self.year, self.max_days)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Days of the month the next leave may fall on
    Window {
        #[command(flatten)]
        policy: PolicyArgs,

        #[arg(long, value_parser = parse_date)]
        last_leave: Option<NaiveDate>,

        #[arg(long, default_value = "staff")]
        staff: String,
    },

    /// Accept or reject one proposed leave date
    Validate {
        #[command(flatten)]
        policy: PolicyArgs,

        #[arg(long, value_parser = parse_date)]
        last_leave: Option<NaiveDate>,

        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Days already taken by others, comma separated
        #[arg(long, value_delimiter = ',', value_parser = parse_date)]
        occupied: Vec<NaiveDate>,

        /// JSON array of taken days
        #[arg(long)]
        occupied_file: Option<PathBuf>,
    },

    /// Next dates open after a leave, from a date or a staff member's records
    Upcoming {
        #[arg(long, value_parser = parse_date)]
        leave_date: Option<NaiveDate>,

        #[arg(long)]
        staff: Option<i64>,

        #[arg(long, env = "FOLGA_MAX_WORKING_DAYS", default_value_t = DEFAULT_MAX_CONSECUTIVE_WORKING_DAYS)]
        max_days: u32,

        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },

    /// Check a historical last leave against a month
    CheckHistory {
        #[command(flatten)]
        policy: PolicyArgs,

        #[arg(long, value_parser = parse_date)]
        last_leave: NaiveDate,

        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },

    /// Month calendar of a staff member in a stored schedule
    Calendar {
        #[arg(long)]
        schedule: i64,

        #[arg(long)]
        staff: i64,
    },

    /// Staff standing, allocation summary and history warnings of a schedule
    Overview {
        #[arg(long)]
        schedule: i64,
    },

    /// Validate and record a leave
    RequestLeave {
        #[arg(long)]
        schedule: i64,

        #[arg(long)]
        staff: i64,

        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        #[arg(long)]
        justification: Option<String>,
    },

    /// Move a pending leave to another day
    UpdateLeave {
        #[arg(long)]
        leave: i64,

        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },

    /// Remove a pending leave
    DeleteLeave {
        #[arg(long)]
        leave: i64,
    },

    /// Register the last leave of a staff member without records
    RegisterLastLeave {
        #[arg(long)]
        staff: i64,

        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,

        /// Check the date against this schedule
        #[arg(long)]
        schedule: Option<i64>,

        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },

    AddDepartment {
        name: String,
    },

    Departments,

    AddStaff {
        #[arg(long)]
        department: i64,

        #[arg(long)]
        name: String,

        /// MORNING, AFTERNOON or NIGHT
        #[arg(long)]
        shift: Shift,
    },

    AddSchedule {
        #[arg(long)]
        department: i64,

        #[arg(long)]
        shift: Shift,

        #[arg(long)]
        month: u32,

        #[arg(long)]
        year: i32,

        #[arg(long)]
        leaves_allowed: u32,

        /// Defaults to FOLGA_MAX_WORKING_DAYS
        #[arg(long)]
        max_days: Option<u32>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    parse_iso_date(s).map_err(|e| e.to_string())
}

fn today_or(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| chrono::Local::now().date_naive())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn emit<T: Serialize>(value: &T, out: Option<&PathBuf>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => fs::write(path, text).with_context(|| format!("failed to write '{}'", path.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn read_occupied(path: &PathBuf) -> Result<Vec<NaiveDate>> {
    let text = fs::read_to_string(path).with_context(|| format!("could not read '{}'", path.display()))?;
    let raw: Vec<String> =
        serde_json::from_str(&text).with_context(|| format!("'{}' is not a JSON array of dates", path.display()))?;
    raw.iter()
        .map(|s| parse_iso_date(s).map_err(anyhow::Error::from))
        .collect()
}

async fn connect(cli: &Cli) -> Result<AppServices> {
    let mut config = StoreConfig::from_env();
    if let Some(url) = &cli.database_url {
        config.database_url = url.clone();
    }
    debug!(database_url = %config.database_url, max_connections = config.max_connections, "opening store");
    AppServices::connect(&config)
        .await
        .with_context(|| format!("could not open store at '{}'", config.database_url))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let out = cli.out.as_ref();

    // dispatch on the subcommand
    match &cli.command {
        Commands::Window { policy, last_leave, staff } => {
            let history = StaffLeaveHistory::new(staff.as_str(), *last_leave);
            let window = compute_window_observed(&policy.policy()?, &history, &TracingObserver)?;
            emit(&window, out)
        }

        Commands::Validate { policy, last_leave, date, occupied, occupied_file } => {
            let mut taken = occupied.clone();
            if let Some(path) = occupied_file {
                taken.extend(read_occupied(path)?);
            }
            let history = StaffLeaveHistory::new("staff", *last_leave);
            let result = validate_observed(&policy.policy()?, &history, *date, &taken, &TracingObserver)?;
            emit(&serde_json::json!({ "result": result, "message": result.message() }), out)
        }

        Commands::Upcoming { leave_date, staff, max_days, today } => {
            let today = today_or(*today);
            match (leave_date, staff) {
                (Some(leave_date), _) => {
                    let policy = Policy::new(leave_date.month(), leave_date.year(), *max_days)?;
                    emit(&upcoming_leaves(*leave_date, &policy, today)?, out)
                }
                (None, Some(staff)) => {
                    let services = connect(&cli).await?;
                    emit(&services.leaves().upcoming(*staff, today).await?, out)
                }
                (None, None) => bail!("pass --leave-date or --staff"),
            }
        }

        Commands::CheckHistory { policy, last_leave, today } => {
            let check = check_last_leave(&policy.policy()?, *last_leave, today_or(*today))?;
            emit(&check, out)
        }

        Commands::Calendar { schedule, staff } => {
            let services = connect(&cli).await?;
            emit(&services.leaves().calendar(*schedule, *staff).await?, out)
        }

        Commands::Overview { schedule } => {
            let services = connect(&cli).await?;
            emit(&services.leaves().overview(*schedule).await?, out)
        }

        Commands::RequestLeave { schedule, staff, date, justification } => {
            let services = connect(&cli).await?;
            let outcome = services
                .leaves()
                .request_leave(*schedule, *staff, *date, justification.clone())
                .await?;
            emit(&outcome, out)
        }

        Commands::UpdateLeave { leave, date } => {
            let services = connect(&cli).await?;
            emit(&services.leaves().update_leave(*leave, *date).await?, out)
        }

        Commands::DeleteLeave { leave } => {
            let services = connect(&cli).await?;
            emit(&services.leaves().delete_leave(*leave).await?, out)
        }

        Commands::RegisterLastLeave { staff, date, schedule, today } => {
            let services = connect(&cli).await?;
            let registration = services
                .leaves()
                .register_last_leave(*staff, *date, *schedule, today_or(*today))
                .await?;
            emit(&registration, out)
        }

        Commands::AddDepartment { name } => {
            let services = connect(&cli).await?;
            let id = services.schedule.create_department(name).await?;
            emit(&serde_json::json!({ "id": id }), out)
        }

        Commands::Departments => {
            let services = connect(&cli).await?;
            emit(&services.schedule.list_departments().await?, out)
        }

        Commands::AddStaff { department, name, shift } => {
            let services = connect(&cli).await?;
            let id = services.schedule.add_staff_member(*department, name, *shift).await?;
            emit(&serde_json::json!({ "id": id }), out)
        }

        Commands::AddSchedule { department, shift, month, year, leaves_allowed, max_days } => {
            // validate before touching the database
            let max_days = max_days.unwrap_or_else(|| StoreConfig::from_env().default_max_consecutive_working_days);
            Policy::new(*month, *year, max_days)?;

            let services = connect(&cli).await?;
            let id = services
                .schedule
                .create_schedule(&NewSchedule {
                    department_id: *department,
                    shift: *shift,
                    month: *month,
                    year: *year,
                    leaves_allowed: *leaves_allowed,
                    max_consecutive_working_days: max_days,
                })
                .await?;
            emit(&serde_json::json!({ "id": id }), out)
        }
    }
}
