use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single multiple-choice quiz question.
///
/// `options` order is significant for display; it is only ever changed by the
/// client-side shuffle, never by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    /// Must be byte-for-byte one of `options`.
    pub correct_answer: String,
}

/// Cumulative play statistics, persisted locally as a JSON blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub quizzes_played: u64,
    pub questions_answered: u64,
    pub correct_answers: u64,
    pub highest_streak: u32,
    pub highest_score: u64,
    pub last_played: Option<DateTime<Utc>>,
}

/// The numbers a single completed quiz contributes to [`Stats`].
#[derive(Debug, Clone, Copy)]
pub struct QuizOutcome {
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub best_streak: u32,
    pub score: u64,
}

impl Stats {
    /// Fold one completed quiz into the cumulative counters.
    pub fn record(&mut self, outcome: QuizOutcome) {
        self.quizzes_played += 1;
        self.questions_answered += u64::from(outcome.questions_answered);
        self.correct_answers += u64::from(outcome.correct_answers);
        self.highest_streak = self.highest_streak.max(outcome.best_streak);
        self.highest_score = self.highest_score.max(outcome.score);
        self.last_played = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_and_keeps_maxima() {
        let mut stats = Stats::default();
        stats.record(QuizOutcome {
            questions_answered: 10,
            correct_answers: 7,
            best_streak: 5,
            score: 700,
        });
        stats.record(QuizOutcome {
            questions_answered: 5,
            correct_answers: 5,
            best_streak: 3,
            score: 500,
        });

        assert_eq!(stats.quizzes_played, 2);
        assert_eq!(stats.questions_answered, 15);
        assert_eq!(stats.correct_answers, 12);
        assert_eq!(stats.highest_streak, 5, "lower streak must not overwrite");
        assert_eq!(stats.highest_score, 700);
        assert!(stats.last_played.is_some());
    }

    #[test]
    fn question_serializes_camel_case() {
        let q = Question {
            question: "Capital of France?".to_string(),
            options: vec!["Paris".to_string(), "Lyon".to_string()],
            correct_answer: "Paris".to_string(),
        };
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("correctAnswer").is_some());
        assert!(json.get("correct_answer").is_none());
    }
}
