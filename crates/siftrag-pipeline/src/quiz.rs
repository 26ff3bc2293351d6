use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use siftrag_core::error::{Error, Result};
use siftrag_core::traits::TextCompletion;
use siftrag_core::types::Chunk;

/// What kind of questions to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizKind {
    /// Multiple choice or fill-in-the-blank.
    #[default]
    Quiz,
    /// Subjective, open-ended.
    Assignment,
    /// A mix of both.
    Test,
}

impl QuizKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizKind::Quiz => "quiz",
            QuizKind::Assignment => "assignment",
            QuizKind::Test => "test",
        }
    }
}

impl fmt::Display for QuizKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for QuizKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiz" => Ok(QuizKind::Quiz),
            "assignment" => Ok(QuizKind::Assignment),
            "test" => Ok(QuizKind::Test),
            other => Err(format!("unknown question type '{other}' (expected quiz, assignment or test)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}' (expected easy, medium or hard)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub topic: String,
    pub kind: QuizKind,
    pub difficulty: Difficulty,
    pub count: usize,
}

impl QuizRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self { topic: topic.into(), kind: QuizKind::default(), difficulty: Difficulty::default(), count: 5 }
    }
}

/// Generated questions as the model wrote them, plus the documents they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quiz {
    pub topic: String,
    pub kind: QuizKind,
    pub difficulty: Difficulty,
    pub count: usize,
    pub content: String,
    /// Distinct `source_ref`s of the context chunks, first occurrence first.
    pub sources: Vec<String>,
}

pub fn quiz_prompt(context: &str, kind: QuizKind, difficulty: Difficulty, count: usize) -> String {
    format!(
        "You are an expert educational content generator.\n\n\
         Based on the content below:\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\n\
         Generate {count} {kind} questions of {difficulty} difficulty.\n\n\
         Rules:\n\
         - For 'quiz': generate MCQs or fill-in-the-blanks.\n\
         - For 'assignment': generate subjective, open-ended questions.\n\
         - For 'test': generate a mix of question types.\n\
         - Include the answer and a short explanation for each question.\n\n\
         Output format:\n\
         1. Question\n\
         Answer:\n\
         Explanation:\n\n\
         Now start generating:"
    )
}

/// Questions about `request.topic` written from `chunks`.
///
/// Fails with `UnsupportedInput` before calling the model when there are no
/// chunks or no questions were asked for.
pub async fn generate_quiz<C>(chunks: &[Chunk], request: &QuizRequest, completion: &C) -> Result<Quiz>
where
    C: TextCompletion + ?Sized,
{
    if request.count == 0 {
        return Err(Error::UnsupportedInput("question count must be at least 1".into()));
    }
    if chunks.is_empty() {
        return Err(Error::UnsupportedInput(format!("no relevant content found for '{}'", request.topic)));
    }

    let context = chunks.iter().map(Chunk::text).collect::<Vec<_>>().join("\n");
    let mut sources: Vec<String> = Vec::new();
    for chunk in chunks {
        if !sources.iter().any(|s| s == chunk.source_ref()) {
            sources.push(chunk.source_ref().to_string());
        }
    }

    let content = completion.complete(&quiz_prompt(&context, request.kind, request.difficulty, request.count)).await?;
    info!(topic = %request.topic, kind = %request.kind, difficulty = %request.difficulty, count = request.count, "quiz generated");
    Ok(Quiz {
        topic: request.topic.clone(),
        kind: request.kind,
        difficulty: request.difficulty,
        count: request.count,
        content,
        sources,
    })
}
