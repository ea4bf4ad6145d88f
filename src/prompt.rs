use crate::persistence::Record;

/// Instruction for one day of a study plan.
pub fn study_plan_prompt(day: u32, course: &str) -> String {
    format!(
        "Create a study plan for Day {day} for the course: {course}.\n\
         - Include a clear goal for the day.\n\
         - Add a review task to reinforce learning.\n\
         - Provide a suggestion for better understanding (e.g., practical applications, tips).\n"
    )
}

/// Instruction asking how to fit `task` around the events already on record.
pub fn task_suggestion_prompt(task: &str, existing: &[Record]) -> String {
    let mut prompt = format!(
        "I need to schedule the following task: {task}.\n\
         Suggest when to work on it and how to break it into manageable steps.\n\
         Existing events:\n"
    );
    if existing.is_empty() {
        prompt.push_str("No existing events.\n");
    } else {
        for record in existing {
            prompt.push_str(&format!(
                "- {} ({} → {})\n",
                record.task, record.start_date, record.end_date
            ));
        }
    }
    prompt.push_str("Avoid overlapping with the existing events where possible.\n");
    prompt
}
