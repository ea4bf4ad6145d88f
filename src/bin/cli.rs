use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use polars::prelude::{AnyValue, DataFrame, PlSmallStr, PolarsResult, Series};
use polars::prelude::{Column, IntoColumn, NamedFrom};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use study_planner::{
    AssignmentPolicy, CalendarWriter, DateRange, GeminiClient, GoogleCalendarClient, Record,
    RecordStore, Schedule, ScheduleParams, Settings, SqliteRecordStore, StudyPlan, StudyPlanner,
    Task, build_schedule, config::GEMINI_API_KEY, extract_date_range, logging, parse_task_list,
    record_task, save_plan_to_csv, save_plan_to_json,
};

/// Interactive study planner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a planner.toml settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite file holding recorded tasks
    #[arg(long)]
    db: Option<PathBuf>,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| "expected YYYY-MM-DD".to_string())
}

struct Session {
    tasks: Vec<Task>,
    params: ScheduleParams,
    schedule: Option<Schedule>,
    plan: Option<StudyPlan>,
    today: NaiveDate,
    store: SqliteRecordStore,
    generator: Option<GeminiClient>,
    calendar: Option<GoogleCalendarClient>,
    pacing: Duration,
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cell = |col: &Column, row_idx: usize| -> String {
        match col.get(row_idx) {
            Ok(AnyValue::Null) | Err(_) => String::new(),
            Ok(AnyValue::String(s)) => s.to_string(),
            Ok(av) => av.to_string(),
        }
    };

    // Compute column widths
    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for (ci, col) in columns.iter().enumerate() {
        for row_idx in 0..df.height() {
            widths[ci] = widths[ci].max(cell(col, row_idx).chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');

    out.push('|');
    for (i, name) in col_names.iter().enumerate() {
        out.push_str(&format!(" {:<width$} |", name, width = widths[i]));
    }
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');

    for row_idx in 0..df.height() {
        out.push('|');
        for (ci, col) in columns.iter().enumerate() {
            out.push_str(&format!(" {:<width$} |", cell(col, row_idx), width = widths[ci]));
        }
        out.push('\n');
    }

    out.push_str(&sep);
    out.push('\n');
    out
}

fn records_dataframe(records: &[Record]) -> PolarsResult<DataFrame> {
    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    let tasks: Vec<&str> = records.iter().map(|r| r.task.as_str()).collect();
    let starts: Vec<&str> = records.iter().map(|r| r.start_date.as_str()).collect();
    let ends: Vec<&str> = records.iter().map(|r| r.end_date.as_str()).collect();
    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("task"), tasks).into_column(),
        Series::new(PlSmallStr::from_static("start_date"), starts).into_column(),
        Series::new(PlSmallStr::from_static("end_date"), ends).into_column(),
    ])
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  courses <a, b, c>                  Set the comma-separated course/task list\n  start <YYYY-MM-DD>                 Set the schedule start date\n  days <n>                           Set the horizon in days\n  hours <float>                      Set study hours per day\n  policy <cycle|exhaust>             Repeat courses or stop once each has a day\n  params                             Show current parameters\n  draft                              Build the schedule without AI tips\n  generate                           Build the schedule with AI plans for each day\n  show                               Show the current schedule and plans\n  export <path.csv|path.json>        Save the current plan\n  extract <text...>                  Extract a date range from text\n  record <text...> [@ <when>]        Store a task; dates come from <when> or the text\n  records                            List stored tasks\n  suggest <text...>                  Ask for scheduling advice on a task\n  quit|exit                          Exit"
    );
}

fn print_params(session: &Session) {
    let courses = session
        .tasks
        .iter()
        .map(|t| t.description.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    println!("Courses            : {}", courses);
    println!("Start date         : {}", session.params.start_date);
    println!("Horizon (days)     : {}", session.params.horizon_days);
    println!("Hours per day      : {}", session.params.hours_per_day);
    println!("Policy             : {}", session.params.policy);
}

fn print_schedule(session: &Session) {
    let Some(schedule) = &session.schedule else {
        println!("No schedule yet. Use 'draft' or 'generate'.");
        return;
    };
    match schedule.to_dataframe() {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error: {}", e),
    }
    if let Some(plan) = &session.plan {
        for day in plan.days.iter().filter(|d| !d.plan.is_empty()) {
            println!("Day {} ({}) - {}", day.day, day.date, day.course);
            println!("{}", day.plan);
            println!("---");
        }
    }
}

fn missing_key_message() -> String {
    format!("{GEMINI_API_KEY} is not set; add it to the environment or secrets.toml first.")
}

/// Returns `false` when the session should end.
async fn handle_command(session: &mut Session, input: &str) -> bool {
    let (cmd, rest) = match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    };

    match cmd {
        "help" => print_help(),
        "quit" | "exit" => return false,
        "params" => print_params(session),
        "courses" => {
            let tasks = parse_task_list(rest);
            if tasks.is_empty() {
                println!("Usage: courses <a, b, c>");
            } else {
                println!("{} course(s) set.", tasks.len());
                session.tasks = tasks;
            }
        }
        "start" => match parse_date(rest) {
            Ok(date) => {
                session.params.start_date = date;
                println!("Start date set to {}.", date);
            }
            Err(_) => println!("Invalid date (YYYY-MM-DD)"),
        },
        "days" => match rest.parse::<u32>() {
            Ok(days) => {
                session.params.horizon_days = days;
                println!("Horizon set to {} day(s).", days);
            }
            Err(_) => println!("Invalid number of days"),
        },
        "hours" => match rest.parse::<f64>() {
            Ok(hours) => {
                session.params.hours_per_day = hours;
                println!("Hours per day set to {}.", hours);
            }
            Err(_) => println!("Invalid float"),
        },
        "policy" => match rest.parse::<AssignmentPolicy>() {
            Ok(policy) => {
                session.params.policy = policy;
                println!("Policy set to {}.", policy);
            }
            Err(e) => println!("Error: {}", e),
        },
        "draft" | "generate" => {
            let generator = if cmd == "generate" {
                match &session.generator {
                    Some(generator) => Some(generator),
                    None => {
                        println!("{}", missing_key_message());
                        return true;
                    }
                }
            } else {
                None
            };
            let schedule = match build_schedule(&session.tasks, &session.params) {
                Ok(schedule) => schedule,
                Err(e) => {
                    println!("Cannot build schedule: {}", e);
                    return true;
                }
            };
            let plan = match generator {
                Some(generator) => {
                    println!("Generating plans for {} day(s)...", schedule.len());
                    StudyPlanner::new(generator)
                        .with_pacing(session.pacing)
                        .plan(&schedule)
                        .await
                }
                None => StudyPlan::without_tips(&schedule),
            };
            println!("Schedule ready ({})", schedule.summary().to_cli_summary());
            session.schedule = Some(schedule);
            session.plan = Some(plan);
            print_schedule(session);
        }
        "show" => print_schedule(session),
        "export" => {
            let Some(plan) = &session.plan else {
                println!("No schedule yet. Use 'draft' or 'generate'.");
                return true;
            };
            let path = if rest.is_empty() {
                PathBuf::from(plan.export_file_name())
            } else {
                PathBuf::from(rest)
            };
            let result = if path.extension().is_some_and(|ext| ext == "json") {
                save_plan_to_json(plan, &path)
            } else {
                save_plan_to_csv(plan, &path)
            };
            match result {
                Ok(()) => println!("Exported {} row(s) to {}", plan.days.len(), path.display()),
                Err(e) => println!("Export failed: {}", e),
            }
        }
        "extract" => {
            if rest.is_empty() {
                println!("Usage: extract <text...>");
            } else {
                let range = extract_date_range(rest, session.today);
                print_range(&range);
            }
        }
        "record" => {
            if rest.is_empty() {
                println!("Usage: record <text...>");
                return true;
            }
            let task = match rest.split_once(" @ ") {
                Some((text, when)) => Task::new(text).with_date_hint(when),
                None => Task::new(rest),
            };
            let calendar = session
                .calendar
                .as_ref()
                .map(|c| c as &dyn CalendarWriter);
            match record_task(&session.store, calendar, &task, None, session.today).await {
                Ok(outcome) => {
                    println!(
                        "Recorded task {}: {} ({} -> {})",
                        outcome.record.id,
                        outcome.record.task,
                        outcome.record.start_date,
                        outcome.record.end_date
                    );
                    if let Some(id) = outcome.event_id {
                        println!("Calendar event created: {}", id);
                    }
                    if let Some(err) = outcome.calendar_error {
                        println!("Calendar update failed: {}", err);
                    }
                }
                Err(e) => println!("Error: {}", e),
            }
        }
        "records" => match session.store.list() {
            Ok(records) if records.is_empty() => println!("No records stored."),
            Ok(records) => match records_dataframe(&records) {
                Ok(df) => println!("{}", render_df_as_text_table(&df)),
                Err(e) => println!("Error: {}", e),
            },
            Err(e) => println!("Error: {}", e),
        },
        "suggest" => {
            if rest.is_empty() {
                println!("Usage: suggest <text...>");
                return true;
            }
            let Some(generator) = &session.generator else {
                println!("{}", missing_key_message());
                return true;
            };
            let existing = match session.store.list() {
                Ok(records) => records,
                Err(e) => {
                    println!("Error: {}", e);
                    return true;
                }
            };
            let suggestion = StudyPlanner::new(generator).suggest(rest, &existing).await;
            println!("{}", suggestion);
        }
        _ => println!("Unknown command. Type 'help'."),
    }
    true
}

fn print_range(range: &DateRange) {
    let source = serde_json::to_value(range.source)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    println!("start={} end={} ({})", range.start, range.end, source);
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(db) = args.db {
        settings.store.path = db;
    }
    let secrets = settings.load_secrets()?;
    let store = SqliteRecordStore::new(&settings.store.path)
        .with_context(|| format!("opening record store {}", settings.store.path.display()))?;

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let params = ScheduleParams::starting(today)
        .with_horizon(settings.schedule.horizon_days)
        .with_hours_per_day(settings.schedule.hours_per_day)
        .with_policy(settings.schedule.policy);

    let mut session = Session {
        tasks: Vec::new(),
        params,
        schedule: None,
        plan: None,
        today,
        store,
        generator: GeminiClient::from_settings(&settings.generation, &secrets)?,
        calendar: GoogleCalendarClient::from_settings(&settings.calendar, &secrets)?,
        pacing: Duration::from_millis(settings.generation.pacing_ms),
    };

    println!("Study Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if !handle_command(&mut session, input).await {
            break;
        }
    }
    Ok(())
}
