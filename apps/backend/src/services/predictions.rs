//! Score predictions from exam history.
//!
//! Predictions are computed from past attempts alone: a recency-weighted
//! average of percentages, a coarse trend, and per-topic readiness
//! aggregated from attempt breakdowns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{AnswerOutcome, DbExamAttempt};

/// Direction the candidate's scores are moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Steady,
    Unknown,
}

/// Aggregate accuracy for one topic across all attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicReadiness {
    pub topic: String,
    pub total: usize,
    pub correct: usize,
    /// Rounded percent in [0, 100].
    pub accuracy: u32,
}

/// Readiness view for one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub course: String,
    /// Recency-weighted expected score; None with no history.
    pub predicted_score: Option<u32>,
    pub trend: Trend,
    pub attempts_considered: usize,
    /// Weakest topics first.
    pub topics: Vec<TopicReadiness>,
}

/// Scores closer together than this count as steady.
const TREND_THRESHOLD: f64 = 3.0;

/// Compute a prediction from attempts ordered newest first (the order
/// the attempt repository returns).
pub fn predict(course: &str, attempts: &[DbExamAttempt]) -> Prediction {
    // Work oldest-to-newest so recency weights line up.
    let chronological: Vec<&DbExamAttempt> = attempts.iter().rev().collect();

    let predicted_score = weighted_score(&chronological);
    let trend = trend(&chronological);
    let topics = topic_readiness(&chronological);

    Prediction {
        course: course.to_string(),
        predicted_score,
        trend,
        attempts_considered: attempts.len(),
        topics,
    }
}

fn weighted_score(chronological: &[&DbExamAttempt]) -> Option<u32> {
    if chronological.is_empty() {
        return None;
    }
    let mut weight_sum = 0.0;
    let mut total = 0.0;
    for (idx, attempt) in chronological.iter().enumerate() {
        let weight = (idx + 1) as f64;
        weight_sum += weight;
        total += weight * attempt.percentage as f64;
    }
    Some((total / weight_sum).round() as u32)
}

fn trend(chronological: &[&DbExamAttempt]) -> Trend {
    if chronological.len() < 2 {
        return Trend::Unknown;
    }
    let mid = chronological.len() / 2;
    let earlier = average(&chronological[..mid]);
    let later = average(&chronological[mid..]);
    let delta = later - earlier;
    if delta >= TREND_THRESHOLD {
        Trend::Improving
    } else if delta <= -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Steady
    }
}

fn average(attempts: &[&DbExamAttempt]) -> f64 {
    if attempts.is_empty() {
        return 0.0;
    }
    let sum: f64 = attempts.iter().map(|a| a.percentage as f64).sum();
    sum / attempts.len() as f64
}

fn topic_readiness(chronological: &[&DbExamAttempt]) -> Vec<TopicReadiness> {
    let mut by_topic: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for attempt in chronological {
        for review in attempt.breakdown.0.iter() {
            let Some(topic) = review.topic.as_deref() else {
                continue;
            };
            let entry = by_topic.entry(topic.to_string()).or_insert((0, 0));
            entry.1 += 1;
            if review.outcome == AnswerOutcome::Correct {
                entry.0 += 1;
            }
        }
    }

    let mut topics: Vec<TopicReadiness> = by_topic
        .into_iter()
        .map(|(topic, (correct, total))| TopicReadiness {
            topic,
            total,
            correct,
            accuracy: exam_core::percentage(correct, total),
        })
        .collect();
    topics.sort_by(|a, b| a.accuracy.cmp(&b.accuracy).then(a.topic.cmp(&b.topic)));
    topics
}
