//! siftrag-pipeline
//!
//! Question answering on top of hybrid retrieval: decomposition of a complex
//! question into sub-questions, the per-sub-question evidence pipeline
//! (retrieve, compress, rerank), cited answer synthesis, quiz generation
//! from retrieved chunks, and an OpenAI-compatible completion client.

pub mod answer;
pub mod decompose;
pub mod evidence;
pub mod llm;
pub mod orchestrator;
pub mod quiz;
pub mod report;

pub use answer::{combine_answers, generate_answer, Answer, NO_INFORMATION_ANSWER};
pub use decompose::{decompose, parse_sub_questions};
pub use evidence::{Evidence, EvidencePipeline, PipelineOptions};
pub use llm::OpenAiCompatible;
pub use orchestrator::Orchestrator;
pub use quiz::{generate_quiz, Difficulty, Quiz, QuizKind, QuizRequest};
pub use report::{QueryReport, StageCounts, SubAnswer, SubQuestionOutcome};
