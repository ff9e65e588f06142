//! Scoring for submitted exams.
//!
//! Scoring is pure: it reads a question list and an answer sheet and
//! produces an [`ExamResult`] without touching session state.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::types::{AnswerOutcome, ExamResult, Question, QuestionReview};

/// Compare a selected option against the designated correct option.
///
/// Equality is over the full option text. Options that merely share a
/// prefix ("Paris" vs "Parma") are distinct answers.
pub fn is_correct(selected: &str, correct: &str) -> bool {
    selected == correct
}

/// Rounded percent of correct answers; 0 when there are no questions.
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}

/// Score an answer sheet against its question list.
///
/// `answers` is keyed by 1-based question position. Positions without an
/// entry count as unanswered, which is indistinguishable from wrong for
/// the percentage but reported separately in the breakdown.
pub fn score_answers(
    questions: &[Question],
    answers: &BTreeMap<usize, String>,
    time_spent_secs: u32,
) -> ExamResult {
    let total = questions.len();
    let mut answered = 0;
    let mut correct = 0;
    let mut breakdown = Vec::with_capacity(total);

    for (idx, question) in questions.iter().enumerate() {
        let position = idx + 1;
        let selected = answers.get(&position);
        let outcome = match selected {
            None => AnswerOutcome::Unanswered,
            Some(choice) if is_correct(choice, &question.correct_answer) => {
                answered += 1;
                correct += 1;
                AnswerOutcome::Correct
            }
            Some(_) => {
                answered += 1;
                AnswerOutcome::Incorrect
            }
        };
        breakdown.push(QuestionReview {
            position,
            question_id: question.id.clone(),
            outcome,
            selected: selected.cloned(),
            correct_answer: question.correct_answer.clone(),
            topic: question.topic.clone(),
        });
    }

    ExamResult {
        total_questions: total,
        answered_count: answered,
        correct_count: correct,
        percentage: percentage(correct, total),
        time_spent_secs,
        submitted_at: Utc::now(),
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn question(id: &str, correct: &str, distractor: &str) -> Question {
        Question::new(
            id,
            format!("which one is {correct}?"),
            vec![correct.to_string(), distractor.to_string()],
            correct,
        )
    }

    fn sheet(entries: &[(usize, &str)]) -> BTreeMap<usize, String> {
        entries
            .iter()
            .map(|(pos, choice)| (*pos, choice.to_string()))
            .collect()
    }

    #[test]
    fn full_text_equality_not_first_character() {
        // Options sharing a first letter must not be confused.
        assert!(is_correct("Paris", "Paris"));
        assert!(!is_correct("Parma", "Paris"));
        assert!(!is_correct("P", "Paris"));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        assert!(!is_correct("paris", "Paris"));
    }

    #[test]
    fn distractor_with_shared_prefix_scores_incorrect() {
        let questions = vec![question("q1", "Photosynthesis", "Phototropism")];
        let answers = sheet(&[(1, "Phototropism")]);

        let result = score_answers(&questions, &answers, 60);

        assert_eq!(result.correct_count, 0);
        assert_eq!(result.answered_count, 1);
        assert_eq!(result.breakdown[0].outcome, AnswerOutcome::Incorrect);
    }

    #[test]
    fn unanswered_questions_count_against_percentage() {
        let questions: Vec<Question> = (1..=4)
            .map(|n| question(&format!("q{n}"), "right", "wrong"))
            .collect();
        let answers = sheet(&[(1, "right"), (3, "right")]);

        let result = score_answers(&questions, &answers, 120);

        assert_eq!(result.total_questions, 4);
        assert_eq!(result.answered_count, 2);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.percentage, 50);
        assert_eq!(result.breakdown[1].outcome, AnswerOutcome::Unanswered);
        assert_eq!(result.breakdown[3].outcome, AnswerOutcome::Unanswered);
    }

    #[test]
    fn percentage_rounds_to_nearest_integer() {
        // 12 of 18 is 66.67%, rounded up.
        assert_eq!(percentage(12, 18), 67);
        // 1 of 3 is 33.33%, rounded down.
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(0, 25), 0);
        assert_eq!(percentage(25, 25), 100);
    }

    #[test]
    fn empty_exam_scores_zero_percent() {
        let result = score_answers(&[], &BTreeMap::new(), 0);

        assert_eq!(result.total_questions, 0);
        assert_eq!(result.percentage, 0);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn breakdown_preserves_question_order() {
        let questions = vec![
            question("first", "a", "b"),
            question("second", "c", "d"),
            question("third", "e", "f"),
        ];
        let answers = sheet(&[(3, "e"), (1, "b")]);

        let result = score_answers(&questions, &answers, 30);

        let ids: Vec<&str> = result
            .breakdown
            .iter()
            .map(|r| r.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert_eq!(result.breakdown[0].outcome, AnswerOutcome::Incorrect);
        assert_eq!(result.breakdown[0].selected.as_deref(), Some("b"));
        assert_eq!(result.breakdown[2].outcome, AnswerOutcome::Correct);
        assert!(result.breakdown[2].is_correct());
    }
}
