use super::PersistenceResult;
use crate::planner::{PlannedDay, StudyPlan};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct PlanCsvRecord<'a> {
    #[serde(rename = "Day")]
    day: u32,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Course")]
    course: &'a str,
    #[serde(rename = "Plan")]
    plan: &'a str,
}

impl<'a> From<&'a PlannedDay> for PlanCsvRecord<'a> {
    fn from(day: &'a PlannedDay) -> Self {
        Self {
            day: day.day,
            date: super::format_date(day.date),
            course: &day.course,
            plan: &day.plan,
        }
    }
}

/// Write `Day,Date,Course,Plan` rows for every planned day.
pub fn write_plan_csv<W: Write>(plan: &StudyPlan, writer: W) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if plan.days.is_empty() {
        writer.write_record(["Day", "Date", "Course", "Plan"])?;
    }
    for day in &plan.days {
        writer.serialize(PlanCsvRecord::from(day))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn plan_to_csv_string(plan: &StudyPlan) -> PersistenceResult<String> {
    let mut buffer = Vec::new();
    write_plan_csv(plan, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|err| super::PersistenceError::InvalidData(format!("csv is not utf-8: {err}")))
}

pub fn save_plan_to_csv<P: AsRef<Path>>(plan: &StudyPlan, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    write_plan_csv(plan, file)
}

pub fn save_plan_to_json<P: AsRef<Path>>(plan: &StudyPlan, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, plan)?;
    Ok(())
}
