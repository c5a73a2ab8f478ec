//! Generated question records and their normalization.

use serde::{Deserialize, Serialize};

/// Topic label carried by the synthetic question emitted when generation fails.
pub const FALLBACK_TOPIC: &str = "Error";

const FALLBACK_TEXT: &str =
    "Could not generate questions from the uploaded document. Please check the PDF content.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// What the level asks of the student, used inside prompts.
    pub fn guidance(self) -> &'static str {
        match self {
            Difficulty::Easy => "Basic recall and understanding questions",
            Difficulty::Medium => "Application and analysis questions",
            Difficulty::Hard => "Complex synthesis and evaluation questions",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("unknown difficulty: {}", s)),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "MCQ", alias = "mcq")]
    Mcq,
    #[serde(rename = "Subjective", alias = "subjective")]
    Subjective,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::Mcq => write!(f, "MCQ"),
            QuestionType::Subjective => write!(f, "Subjective"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub topic: String,
}

/// Shape accepted from the generation service; ids and types are untrusted.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    text: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    correct_answer: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default, rename = "type")]
    question_type: Option<QuestionType>,
    #[serde(default)]
    topic: String,
}

impl Question {
    /// The visible placeholder returned when no usable questions were generated.
    pub fn generation_fallback(difficulty: Difficulty) -> Self {
        Self {
            id: 1,
            text: FALLBACK_TEXT.to_string(),
            options: Some(vec![
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ]),
            correct_answer: "A".to_string(),
            explanation: "Error in generation.".to_string(),
            difficulty: difficulty.to_string(),
            question_type: QuestionType::Mcq,
            topic: FALLBACK_TOPIC.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.topic == FALLBACK_TOPIC && self.text == FALLBACK_TEXT
    }

    /// Parse one generated element. Returns `None` for anything unusable.
    pub fn from_generated(value: &serde_json::Value, difficulty: Difficulty) -> Option<Self> {
        let raw: RawQuestion = serde_json::from_value(value.clone()).ok()?;
        let options = raw.options.filter(|opts| !opts.is_empty());
        let question_type = raw.question_type.unwrap_or(if options.is_some() {
            QuestionType::Mcq
        } else {
            QuestionType::Subjective
        });

        let question = Self {
            id: 0,
            text: raw.text.trim().to_string(),
            options: match question_type {
                QuestionType::Mcq => options,
                QuestionType::Subjective => None,
            },
            correct_answer: raw.correct_answer,
            explanation: raw.explanation,
            difficulty: raw
                .difficulty
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| difficulty.to_string()),
            question_type,
            topic: raw.topic,
        };

        question.is_valid().then_some(question)
    }

    /// A multiple-choice answer must equal one option byte-for-byte.
    pub fn is_valid(&self) -> bool {
        if self.text.is_empty() {
            return false;
        }
        match self.question_type {
            QuestionType::Mcq => self
                .options
                .as_ref()
                .is_some_and(|opts| opts.iter().any(|o| *o == self.correct_answer)),
            QuestionType::Subjective => true,
        }
    }
}

/// Turn a structured generation result into the final question list.
///
/// Anything that is not a JSON array yields the single fallback question. Invalid
/// elements are dropped; ids are reassigned `1..=N` in order.
pub fn normalize_questions(
    generated: Option<serde_json::Value>,
    difficulty: Difficulty,
) -> Vec<Question> {
    let mut questions: Vec<Question> = match generated {
        Some(serde_json::Value::Array(items)) => {
            let total = items.len();
            let parsed: Vec<Question> = items
                .iter()
                .filter_map(|item| Question::from_generated(item, difficulty))
                .collect();
            if parsed.len() < total {
                tracing::warn!(
                    dropped = total - parsed.len(),
                    total,
                    "discarded invalid generated questions"
                );
            }
            parsed
        }
        Some(other) => {
            tracing::warn!(kind = json_kind(&other), "structured output was not a list");
            Vec::new()
        }
        None => Vec::new(),
    };

    if questions.is_empty() {
        questions.push(Question::generation_fallback(difficulty));
    }

    for (idx, question) in questions.iter_mut().enumerate() {
        question.id = idx as u32 + 1;
    }

    questions
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
