//! Quiz grading: per-answer checks and the end-of-quiz report.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const UNKNOWN_TOPIC: &str = "Unknown";
const MAX_WEAK_AREAS: usize = 3;

/// One answered question as submitted by the student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Explicit verdict; when absent it is derived from the two answers.
    #[serde(default, alias = "correct", skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub time_taken: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeakArea {
    pub topic: String,
    pub mistakes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizReport {
    /// Percentage of correct answers, 0 for an empty quiz
    pub score: f64,
    pub correct: usize,
    pub total: usize,
    pub time_taken: u64,
    pub weak_areas: Vec<WeakArea>,
}

/// Answers are compared verbatim.
pub fn check_answer(user_answer: &str, correct_answer: &str) -> bool {
    user_answer == correct_answer
}

impl QuizResult {
    /// The explicit verdict, else an exact comparison of the submitted and
    /// expected answers, else incorrect.
    pub fn is_correct(&self) -> bool {
        match (self.is_correct, &self.user_answer, &self.correct_answer) {
            (Some(verdict), _, _) => verdict,
            (None, Some(user), Some(expected)) => check_answer(user, expected),
            _ => false,
        }
    }
}

impl QuizReport {
    pub fn from_results(results: &[QuizResult]) -> Self {
        let total = results.len();
        let correct = results.iter().filter(|r| r.is_correct()).count();
        let score = if total > 0 {
            correct as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        let time_taken = results.iter().map(|r| r.time_taken).sum();

        // (mistakes, first appearance) so ties keep submission order
        let mut counts: HashMap<&str, (u32, usize)> = HashMap::new();
        for (idx, result) in results.iter().enumerate().filter(|(_, r)| !r.is_correct()) {
            let topic = result
                .topic
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(UNKNOWN_TOPIC);
            counts.entry(topic).or_insert((0, idx)).0 += 1;
        }

        let mut weak: Vec<(&str, (u32, usize))> = counts.into_iter().collect();
        weak.sort_by(|a, b| b.1.0.cmp(&a.1.0).then_with(|| a.1.1.cmp(&b.1.1)));

        let weak_areas = weak
            .into_iter()
            .take(MAX_WEAK_AREAS)
            .map(|(topic, (mistakes, _))| WeakArea {
                topic: topic.to_string(),
                mistakes,
            })
            .collect();

        Self {
            score,
            correct,
            total,
            time_taken,
            weak_areas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrong(topic: Option<&str>) -> QuizResult {
        QuizResult {
            is_correct: Some(false),
            topic: topic.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_report_scores_and_weak_areas() {
        let results: Vec<QuizResult> = serde_json::from_str(
            r#"[{"correct": true}, {"correct": false, "topic": "A"}, {"correct": false, "topic": "A"}]"#,
        )
        .unwrap();

        let report = QuizReport::from_results(&results);
        assert_eq!(report.total, 3);
        assert_eq!(report.correct, 1);
        assert!((report.score - 33.333).abs() < 0.01);
        assert_eq!(format!("{:.1}", report.score), "33.3");
        assert_eq!(
            report.weak_areas,
            vec![WeakArea {
                topic: "A".to_string(),
                mistakes: 2
            }]
        );
    }

    #[test]
    fn test_empty_results() {
        let report = QuizReport::from_results(&[]);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.total, 0);
        assert!(report.weak_areas.is_empty());
    }

    #[test]
    fn test_weak_areas_capped_and_ordered() {
        let results = vec![
            wrong(Some("B")),
            wrong(Some("C")),
            wrong(Some("C")),
            wrong(None),
            wrong(Some("D")),
            wrong(Some("")),
        ];
        let report = QuizReport::from_results(&results);
        let topics: Vec<&str> = report.weak_areas.iter().map(|w| w.topic.as_str()).collect();
        assert_eq!(topics, vec!["C", "Unknown", "B"]);
        assert_eq!(report.weak_areas[1].mistakes, 2);
    }

    #[test]
    fn test_time_is_summed() {
        let results = vec![
            QuizResult {
                is_correct: Some(true),
                time_taken: 12,
                ..Default::default()
            },
            QuizResult {
                time_taken: 30,
                ..wrong(Some("A"))
            },
        ];
        assert_eq!(QuizReport::from_results(&results).time_taken, 42);
    }

    #[test]
    fn test_check_answer_is_exact() {
        assert!(check_answer("ATP", "ATP"));
        assert!(!check_answer("atp", "ATP"));
        assert!(!check_answer("ATP ", "ATP"));
    }

    #[test]
    fn test_verdict_derived_from_answers() {
        let results: Vec<QuizResult> = serde_json::from_str(
            r#"[{"user_answer": "Mitochondrion", "correct_answer": "Mitochondrion"},
                {"user_answer": "Nucleus", "correct_answer": "Mitochondrion", "topic": "Organelles"},
                {"user_answer": "Nucleus", "correct_answer": "Mitochondrion", "is_correct": true},
                {"topic": "Unanswered"}]"#,
        )
        .unwrap();

        assert!(results[0].is_correct());
        assert!(!results[1].is_correct());
        assert!(results[2].is_correct());
        assert!(!results[3].is_correct());

        let report = QuizReport::from_results(&results);
        assert_eq!(report.correct, 2);
        assert_eq!(report.weak_areas[0].topic, "Organelles");
    }
}
