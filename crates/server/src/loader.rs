//! Seeds questions from a plain-text file.
//!
//! ```text
//! # comment
//! What's up?
//! - Not much
//! - The sky
//! ```
//!
//! A non-dash line starts a question, `- ` lines add choices to it.

use crate::error::AppError;
use crate::models::{ChoiceInsert, QuestionInsert};
use crate::store::{ChoiceCommon, QuestionCommon, Store};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSeed {
    pub question_text: String,
    pub choices: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<String>,
}

pub fn parse(content: &str) -> Result<Vec<PollSeed>, AppError> {
    let mut seeds: Vec<PollSeed> = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.strip_prefix('-') {
            Some(choice) => {
                let seed = seeds
                    .last_mut()
                    .ok_or_else(|| AppError::Constraint(format!("line {}: choice before any question", number + 1)))?;
                seed.choices.push(choice.trim().to_string());
            }
            None => seeds.push(PollSeed {
                question_text: line.to_string(),
                choices: Vec::new(),
            }),
        }
    }
    Ok(seeds)
}

/// Inserts every seed whose text is not stored yet, published at `now`.
pub async fn load<S: Store>(store: &S, seeds: Vec<PollSeed>, now: DateTime<Utc>) -> Result<LoadReport, AppError> {
    let mut report = LoadReport::default();
    for seed in seeds {
        if store.question_text_exists(&seed.question_text).await? {
            report.skipped.push(seed.question_text);
            continue;
        }
        let question = store
            .insert_question(QuestionInsert {
                question_text: seed.question_text,
                pub_text: now,
            })
            .await?;
        for choice_text in seed.choices {
            store
                .insert_choice(ChoiceInsert {
                    question_id: question.id,
                    choice_text,
                    votes: 0,
                })
                .await?;
        }
        tracing::debug!(question = question.id, "loaded question");
        report.loaded.push(question.question_text);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const SAMPLE: &str = "
# polls for the demo
What is new?
- Not much
-   The sky

Favourite colour?
- Blue
";

    #[test]
    fn groups_choices_under_their_question() {
        let seeds = parse(SAMPLE).unwrap();
        assert_eq!(
            seeds,
            vec![
                PollSeed {
                    question_text: "What is new?".into(),
                    choices: vec!["Not much".into(), "The sky".into()],
                },
                PollSeed {
                    question_text: "Favourite colour?".into(),
                    choices: vec!["Blue".into()],
                },
            ]
        );
    }

    #[test]
    fn choice_without_question_is_an_error() {
        assert!(matches!(parse("- lonely"), Err(AppError::Constraint(_))));
    }

    #[tokio::test]
    async fn skips_questions_already_stored() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = load(&store, parse(SAMPLE).unwrap(), now).await.unwrap();
        assert_eq!(first.loaded.len(), 2);

        let again = load(&store, parse(SAMPLE).unwrap(), now).await.unwrap();
        assert!(again.loaded.is_empty());
        assert_eq!(again.skipped, vec!["What is new?", "Favourite colour?"]);

        let stored = store.query_questions(&Default::default()).await.unwrap();
        assert_eq!(stored.len(), 2);
        let choices = store.choices_of(stored[1].id).await.unwrap();
        assert_eq!(choices.len(), 2);
    }
}
