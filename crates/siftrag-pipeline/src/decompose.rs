use tracing::{debug, info};

use siftrag_core::error::Result;
use siftrag_core::traits::TextCompletion;
use siftrag_core::types::SubQuery;

pub fn decomposition_prompt(query: &str) -> String {
    format!(
        "Break down the following complex query into simple, atomic sub-questions.\n\
         Each sub-question should focus on one specific aspect and be answerable independently.\n\n\
         Complex Query: {query}\n\n\
         Sub-questions (one per line, numbered):\n"
    )
}

/// Numbered lines of a completion, with the `N.` marker stripped.
///
/// A line counts when it is not blank and one of its first three characters
/// is a digit. Everything after the first `.` is kept (the whole line when
/// there is no `.`); lines that end up empty are skipped.
pub fn parse_sub_questions(text: &str) -> Vec<String> {
    text.trim()
        .lines()
        .filter(|line| !line.trim().is_empty() && line.chars().take(3).any(|c| c.is_ascii_digit()))
        .map(|line| line.split_once('.').map_or(line, |(_, rest)| rest).trim())
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits `query` into sub-questions with one completion call.
///
/// Never returns an empty list: when nothing parses, the original query is
/// the only sub-question. Completion errors propagate unchanged.
pub async fn decompose<C>(query: &str, completion: &C) -> Result<Vec<SubQuery>>
where
    C: TextCompletion + ?Sized,
{
    let raw = completion.complete(&decomposition_prompt(query)).await?;
    let mut subs: Vec<SubQuery> = parse_sub_questions(&raw).into_iter().map(SubQuery::new).collect();
    if subs.is_empty() {
        debug!("no numbered sub-questions in completion; using the query itself");
        subs.push(SubQuery::new(query));
    }
    info!(count = subs.len(), "decomposed query");
    for (i, sq) in subs.iter().enumerate() { debug!("  {}. {}", i + 1, sq); }
    Ok(subs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_text_after_first_period() {
        assert_eq!(parse_sub_questions("1. Who won? 2.5 goals."), vec!["Who won? 2.5 goals."]);
    }

    #[test]
    fn unpunctuated_numbered_line_is_kept_whole() {
        assert_eq!(parse_sub_questions("10) Which striker"), vec!["10) Which striker"]);
    }

    #[test]
    fn digit_past_third_char_does_not_count() {
        assert!(parse_sub_questions("Top 5 scorers").is_empty());
        assert!(parse_sub_questions("1.   \n\n").is_empty());
    }
}
