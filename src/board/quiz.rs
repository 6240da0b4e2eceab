use std::collections::HashMap;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::{BoardError, BoardResult};
use crate::QuizId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub question: String,
    pub options: Vec<String>,
    /// 0-based index into `options`
    pub answer: usize,
}

impl Quiz {
    pub fn is_correct(&self, selection: usize) -> bool {
        selection == self.answer
    }

    pub fn prompt(&self) -> QuizPrompt {
        QuizPrompt {
            question: self.question.clone(),
            options: self.options.clone(),
        }
    }
}

/// What the client is shown. Never carries the answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizPrompt {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct QuizBank {
    quizzes: HashMap<QuizId, Quiz>,
}

impl QuizBank {
    pub fn from_quizzes(quizzes: Vec<Quiz>) -> BoardResult<Self> {
        if let Some(id) = quizzes.iter().map(|q| q.id).duplicates().next() {
            return Err(BoardError::Quiz {
                details: format!("duplicate quiz id {id}"),
            });
        }
        if let Some(quiz) = quizzes.iter().find(|q| q.answer >= q.options.len()) {
            return Err(BoardError::Quiz {
                details: format!(
                    "quiz {} has answer {} but only {} options",
                    quiz.id,
                    quiz.answer,
                    quiz.options.len()
                ),
            });
        }
        Ok(Self {
            quizzes: quizzes.into_iter().map(|q| (q.id, q)).collect(),
        })
    }

    pub fn parse(raw: &str) -> BoardResult<Self> {
        let quizzes: Vec<Quiz> = serde_json::from_str(raw).map_err(|e| BoardError::Quiz {
            details: e.to_string(),
        })?;
        Self::from_quizzes(quizzes)
    }

    pub fn load(path: impl AsRef<Path>) -> BoardResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| BoardError::Read {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        let bank = Self::parse(&raw)?;
        log::info!("❓ Loaded {} quizzes from {}", bank.len(), path.display());
        Ok(bank)
    }

    pub fn get(&self, id: QuizId) -> Option<&Quiz> {
        self.quizzes.get(&id)
    }

    pub fn prompt(&self, id: QuizId) -> Option<QuizPrompt> {
        self.get(id).map(Quiz::prompt)
    }

    pub fn len(&self) -> usize {
        self.quizzes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIZZES: &str = r#"[
        {"id": 1, "question": "Capital of Japan?", "options": ["Osaka", "Tokyo", "Kyoto"], "answer": 1},
        {"id": 2, "question": "1 + 1?", "options": ["2", "3"], "answer": 0}
    ]"#;

    #[test]
    fn test_parse_and_lookup() {
        let bank = QuizBank::parse(QUIZZES).unwrap();
        assert_eq!(bank.len(), 2);
        let quiz = bank.get(1).unwrap();
        assert!(quiz.is_correct(1));
        assert!(!quiz.is_correct(0));
        assert!(bank.get(3).is_none());
    }

    #[test]
    fn test_prompt_omits_answer() {
        let bank = QuizBank::parse(QUIZZES).unwrap();
        let prompt = serde_json::to_value(bank.prompt(2).unwrap()).unwrap();
        assert_eq!(
            prompt,
            serde_json::json!({"question": "1 + 1?", "options": ["2", "3"]})
        );
    }

    #[test]
    fn test_rejects_bad_quiz_files() {
        let duplicate = r#"[
            {"id": 1, "question": "a", "options": ["x"], "answer": 0},
            {"id": 1, "question": "b", "options": ["y"], "answer": 0}
        ]"#;
        assert!(QuizBank::parse(duplicate).is_err());

        let out_of_range = r#"[{"id": 1, "question": "a", "options": ["x"], "answer": 3}]"#;
        assert!(QuizBank::parse(out_of_range).is_err());

        assert!(matches!(QuizBank::parse("[{"), Err(BoardError::Quiz { .. })));
    }
}
