//! Suggest analysis questions a semantics can answer.

use crate::error::{AgentError, Result};
use crate::prompt::{constants, values, PromptTemplate};
use llm::{ChatModel, ChatRequest, Message};
use pulse::Semantics;
use tracing::debug;

pub const DEFAULT_SUGGESTION_COUNT: usize = 7;

/// Render the suggestion prompt for `semantics`.
pub fn suggest_prompt(semantics: &Semantics, count: usize) -> Result<String> {
    let raw_table_ids: Vec<&str> = semantics
        .filter_tables()
        .iter()
        .map(|c| c.display_id())
        .collect();
    let predefined_sql_ids: Vec<&str> = semantics
        .filter_endpoints()
        .iter()
        .map(|c| c.display_id())
        .collect();

    PromptTemplate::from_template(constants::SUGGEST_QUESTIONS).format(&values([
        ("cubes_yaml", semantics.view().to_text()?),
        ("raw_table_ids", raw_table_ids.join(", ")),
        ("predefined_sql_ids", predefined_sql_ids.join(", ")),
        ("count", count.to_string()),
    ]))
}

/// Ask the model for `count` questions. Returns its text unchanged.
pub async fn suggest_questions(
    llm: &dyn ChatModel,
    semantics: &Semantics,
    count: usize,
) -> Result<String> {
    if count == 0 {
        return Err(AgentError::Config(
            "Suggestion count must be greater than 0".to_string(),
        ));
    }
    let prompt = suggest_prompt(semantics, count)?;
    debug!(count, cubes = semantics.len(), "Suggesting questions");

    let response = llm
        .chat(ChatRequest::new(vec![Message::human(prompt)]).with_temperature(0.0))
        .await?;
    Ok(response.message.content)
}

/// Split a suggestion answer into questions, dropping list markers.
pub fn split_suggestions(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches(['.', ')', '-', '*'])
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
