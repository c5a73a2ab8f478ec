//! Quiz generation: extract, retrieve context, generate questions.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::extract::{TextExtractor, extract_blocking};
use crate::models::{Difficulty, Question, normalize_questions};
use crate::services::{DocumentIngestor, GenerationClient, Retriever};
use crate::utils::{document_identifier, source_name, truncate_chars};

/// Retrieval query used to gather quiz material.
pub const CONTEXT_QUERY: &str = "main concepts and topics";
pub const CONTEXT_CHUNKS: u64 = 5;
pub const CONTEXT_MAX_CHARS: usize = 3000;
pub const NO_CONTEXT_MARKER: &str = "No specific context available. Please use general knowledge.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub document_path: PathBuf,
    /// Defaults to the canonical document path.
    pub document_identifier: Option<String>,
    pub num_questions: u32,
    pub difficulty: Difficulty,
    /// Mix open-response questions in with the multiple-choice ones.
    pub include_subjective: bool,
    pub time_limit_secs: u64,
    /// Drop previously ingested chunks of this document before ingesting.
    pub replace: bool,
}

impl QuizRequest {
    pub fn new(document_path: impl Into<PathBuf>) -> Self {
        Self {
            document_path: document_path.into(),
            document_identifier: None,
            num_questions: 5,
            difficulty: Difficulty::default(),
            include_subjective: false,
            time_limit_secs: 600,
            replace: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStage {
    Extract,
    RetrieveContext,
    GenerateQuestions,
    Done,
}

/// State of one quiz run; created fresh per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizState {
    pub request: QuizRequest,
    pub document_identifier: String,
    #[serde(skip)]
    pub extracted_text: String,
    pub context: String,
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub stage: QuizStage,
}

impl QuizState {
    pub fn new(request: QuizRequest) -> Self {
        let document_identifier = request
            .document_identifier
            .clone()
            .unwrap_or_else(|| document_identifier(&request.document_path));
        Self {
            request,
            document_identifier,
            extracted_text: String::new(),
            context: String::new(),
            questions: Vec::new(),
            current_question_index: 0,
            stage: QuizStage::Extract,
        }
    }
}

#[derive(Clone)]
pub struct QuizWorkflow {
    extractor: Arc<dyn TextExtractor>,
    ingestor: DocumentIngestor,
    retriever: Retriever,
    generation: GenerationClient,
}

impl QuizWorkflow {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        ingestor: DocumentIngestor,
        retriever: Retriever,
        generation: GenerationClient,
    ) -> Self {
        Self {
            extractor,
            ingestor,
            retriever,
            generation,
        }
    }

    /// Run every stage to completion. Upstream failures are absorbed: the
    /// result always holds at least one question.
    pub async fn run(&self, request: QuizRequest) -> QuizState {
        let mut state = QuizState::new(request);
        while state.stage != QuizStage::Done {
            self.step(&mut state).await;
        }
        state
    }

    async fn step(&self, state: &mut QuizState) {
        tracing::debug!(stage = ?state.stage, document = %state.document_identifier, "quiz stage");
        state.stage = match state.stage {
            QuizStage::Extract => {
                self.extract(state).await;
                QuizStage::RetrieveContext
            }
            QuizStage::RetrieveContext => {
                self.retrieve_context(state).await;
                QuizStage::GenerateQuestions
            }
            QuizStage::GenerateQuestions => {
                self.generate_questions(state).await;
                QuizStage::Done
            }
            QuizStage::Done => QuizStage::Done,
        };
    }

    async fn extract(&self, state: &mut QuizState) {
        let path = state.request.document_path.clone();
        state.extracted_text =
            match extract_blocking(Arc::clone(&self.extractor), path.clone()).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "text extraction failed");
                    String::new()
                }
            };

        let source = source_name(&path);
        let result = if state.request.replace {
            self.ingestor
                .replace(&state.document_identifier, &state.extracted_text, Some(&source))
                .await
        } else {
            self.ingestor
                .ingest(&state.document_identifier, &state.extracted_text, Some(&source))
                .await
        };
        if let Err(e) = result {
            tracing::warn!(document = %state.document_identifier, error = %e, "ingestion failed");
        }
    }

    async fn retrieve_context(&self, state: &mut QuizState) {
        let context = self
            .retriever
            .context(
                CONTEXT_QUERY,
                &state.document_identifier,
                CONTEXT_CHUNKS,
                NO_CONTEXT_MARKER,
            )
            .await;
        state.context = if context.trim().is_empty() {
            NO_CONTEXT_MARKER.to_string()
        } else {
            truncate_chars(&context, CONTEXT_MAX_CHARS).to_string()
        };
    }

    async fn generate_questions(&self, state: &mut QuizState) {
        let prompt = build_prompt(&state.request, &state.context);
        let generated = self.generation.generate_structured(&prompt).await;
        state.questions = normalize_questions(generated, state.request.difficulty);
        state.current_question_index = 0;
    }
}

fn build_prompt(request: &QuizRequest, context: &str) -> String {
    let difficulty = request.difficulty;
    let count = request.num_questions;

    let (task, type_rule) = if request.include_subjective {
        (
            format!(
                "generate {} questions, mixing multiple choice (MCQ) and open-response (Subjective) questions",
                count
            ),
            "Subjective questions have no options; put a model answer in correct_answer and set type to \"Subjective\".\n",
        )
    } else {
        (format!("generate {} multiple choice questions", count), "")
    };

    format!(
        r#"Based on the following context from the uploaded document, {task}.
Difficulty level: {difficulty}

For {difficulty} difficulty:
- Easy: {easy}
- Medium: {medium}
- Hard: {hard}

Context from uploaded document:
{context}

Output format (JSON array):
[
    {{
        "id": 1,
        "text": "Question text",
        "options": ["Option A", "Option B", "Option C", "Option D"],
        "correct_answer": "Correct Option Text (must match one of the options exactly)",
        "explanation": "Why this is correct",
        "difficulty": "{difficulty}",
        "type": "MCQ",
        "topic": "Topic Name"
    }}
]

IMPORTANT: The correct_answer must EXACTLY match one of the options in the options array.
{type_rule}Generate questions ONLY from the provided context, not from general knowledge.
"#,
        easy = Difficulty::Easy.guidance(),
        medium = Difficulty::Medium.guidance(),
        hard = Difficulty::Hard.guidance(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FALLBACK_TOPIC, QuestionType};
    use crate::test_support::{FailingGenerator, ScriptedGenerator, StaticExtractor, memory_index};

    const BIOLOGY: &str = "Mitochondria are the membrane-bound organelles that produce most ATP.\n\n\
        Ribosomes translate messenger RNA into chains of amino acids.\n\n\
        Page 4";

    const TWO_QUESTIONS: &str = r#"```json
[
  {"id": 7, "text": "Which organelle produces ATP?", "options": ["Ribosome", "Mitochondrion"],
   "correct_answer": "Mitochondrion", "explanation": "Respiration.", "difficulty": "Easy",
   "type": "MCQ", "topic": "Organelles"},
  {"id": 9, "text": "What do ribosomes make?", "options": ["Proteins", "Lipids"],
   "correct_answer": "Proteins", "explanation": "Translation.", "difficulty": "Easy",
   "type": "MCQ", "topic": "Translation"}
]
```"#;

    async fn workflow(
        text: &str,
        generator: Arc<dyn crate::services::TextGenerator>,
    ) -> (QuizWorkflow, crate::services::EmbeddingIndex) {
        let index = memory_index();
        index.ensure_ready().await.unwrap();
        let workflow = QuizWorkflow::new(
            Arc::new(StaticExtractor::new(text)),
            DocumentIngestor::new(index.clone()),
            Retriever::new(index.clone()),
            GenerationClient::new(generator),
        );
        (workflow, index)
    }

    fn request(difficulty: Difficulty) -> QuizRequest {
        QuizRequest {
            document_identifier: Some("bio.pdf".to_string()),
            difficulty,
            ..QuizRequest::new("bio.pdf")
        }
    }

    #[tokio::test]
    async fn test_generates_questions_from_context() {
        let generator = Arc::new(ScriptedGenerator::new([TWO_QUESTIONS]));
        let (workflow, index) = workflow(BIOLOGY, generator.clone()).await;

        let state = workflow.run(request(Difficulty::Easy)).await;
        assert_eq!(state.stage, QuizStage::Done);
        assert_eq!(state.current_question_index, 0);
        let ids: Vec<u32> = state.questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(state.context.contains("Mitochondria"));

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("generate 5 multiple choice questions"));
        assert!(prompt.contains("Difficulty level: Easy"));
        assert!(prompt.contains("Ribosomes translate"));
        assert!(prompt.contains("correct_answer must EXACTLY match"));

        assert_eq!(index.stats().await.unwrap().unwrap().points_count, 2);
    }

    #[tokio::test]
    async fn test_source_is_file_name() {
        let generator = Arc::new(ScriptedGenerator::new([TWO_QUESTIONS]));
        let (workflow, index) = workflow(BIOLOGY, generator).await;
        workflow
            .run(QuizRequest {
                document_identifier: Some("bio".to_string()),
                ..QuizRequest::new("/course/week1/bio.pdf")
            })
            .await;

        let hits = index.search("ATP", 5, Some("bio")).await.unwrap();
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.metadata["source"] == "bio.pdf"));
    }

    #[tokio::test]
    async fn test_no_context_uses_marker() {
        let generator = Arc::new(ScriptedGenerator::new([TWO_QUESTIONS]));
        let (workflow, _) = workflow("Too short.", generator.clone()).await;

        let state = workflow.run(request(Difficulty::Medium)).await;
        assert_eq!(state.context, NO_CONTEXT_MARKER);
        assert!(generator.prompts()[0].contains(NO_CONTEXT_MARKER));
    }

    #[tokio::test]
    async fn test_generation_failure_yields_fallback() {
        let (workflow, _) = workflow(BIOLOGY, Arc::new(FailingGenerator)).await;
        let state = workflow.run(request(Difficulty::Hard)).await;

        assert_eq!(state.questions.len(), 1);
        let q = &state.questions[0];
        assert_eq!(q.topic, FALLBACK_TOPIC);
        assert_eq!(q.difficulty, "Hard");
        assert_eq!(q.correct_answer, "A");
    }

    #[tokio::test]
    async fn test_non_list_output_yields_fallback() {
        let generator = Arc::new(ScriptedGenerator::new([r#"{"questions": []}"#]));
        let (workflow, _) = workflow(BIOLOGY, generator).await;
        let state = workflow.run(request(Difficulty::Medium)).await;
        assert_eq!(state.questions.len(), 1);
        assert!(state.questions[0].is_fallback());
    }

    #[tokio::test]
    async fn test_invalid_mcq_dropped() {
        let output = r#"[
            {"text": "Bad", "options": ["A", "B"], "correct_answer": "C", "type": "MCQ"},
            {"text": "Good", "options": ["A", "B"], "correct_answer": "B", "type": "MCQ"}
        ]"#;
        let (workflow, _) = workflow(BIOLOGY, Arc::new(ScriptedGenerator::new([output]))).await;
        let state = workflow.run(request(Difficulty::Medium)).await;
        assert_eq!(state.questions.len(), 1);
        assert_eq!(state.questions[0].text, "Good");
        assert_eq!(state.questions[0].id, 1);
    }

    #[tokio::test]
    async fn test_context_is_truncated() {
        let long_para = "x".repeat(2000);
        let text = format!("{}\n\n{}", long_para, long_para);
        let generator = Arc::new(ScriptedGenerator::new([TWO_QUESTIONS]));
        let (workflow, _) = workflow(&text, generator).await;
        let state = workflow.run(request(Difficulty::Medium)).await;
        assert_eq!(state.context.chars().count(), CONTEXT_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_subjective_mix() {
        let output = r#"[
            {"text": "Explain osmosis.", "correct_answer": "Water diffusion.", "type": "Subjective"}
        ]"#;
        let generator = Arc::new(ScriptedGenerator::new([output]));
        let (workflow, _) = workflow(BIOLOGY, generator.clone()).await;
        let state = workflow
            .run(QuizRequest {
                include_subjective: true,
                ..request(Difficulty::Medium)
            })
            .await;
        assert_eq!(state.questions[0].question_type, QuestionType::Subjective);
        assert!(generator.prompts()[0].contains("open-response (Subjective)"));
    }

    #[tokio::test]
    async fn test_replace_reingests_cleanly() {
        let generator = Arc::new(ScriptedGenerator::new([TWO_QUESTIONS, TWO_QUESTIONS]));
        let (workflow, index) = workflow(BIOLOGY, generator).await;
        workflow.run(request(Difficulty::Easy)).await;
        workflow
            .run(QuizRequest {
                replace: true,
                ..request(Difficulty::Easy)
            })
            .await;
        assert_eq!(index.stats().await.unwrap().unwrap().points_count, 2);
    }
}
