//! Test fixtures and factory functions for creating test data.

use chrono::Utc;
use serde_json::json;
use sqlx::types::Json;
use uuid::Uuid;

use studydesk_backend::models::DbQuestion;

/// Build a stored question for seeding. Question `n` asks "question n"
/// and its right answer is "correct n". Timestamps are staggered so the
/// pool query returns questions in seeding order.
pub fn db_question(user_id: Uuid, course: &str, n: usize) -> DbQuestion {
    DbQuestion {
        id: Uuid::new_v4(),
        user_id,
        course: course.to_string(),
        material_id: None,
        text: format!("question {}", n),
        options: Json(vec![
            format!("correct {}", n),
            format!("wrong {}a", n),
            format!("wrong {}b", n),
            format!("wrong {}c", n),
        ]),
        correct_answer: format!("correct {}", n),
        topic: Some("seeded".to_string()),
        difficulty: None,
        confidence: None,
        origin: "uploaded".to_string(),
        created_at: Utc::now() + chrono::Duration::milliseconds(n as i64),
    }
}

/// Generate a unique course code so tests never share a pool.
pub fn unique_course(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().to_string()[..8])
}

/// Create a user register request body.
pub fn register_request(name: Option<&str>) -> serde_json::Value {
    match name {
        Some(n) => json!({ "name": n }),
        None => json!({}),
    }
}

/// Create a start exam request body.
pub fn start_exam_request(course: &str, time_limit_minutes: Option<u32>) -> serde_json::Value {
    json!({ "course": course, "time_limit_minutes": time_limit_minutes })
}

/// Create an answer request body.
pub fn answer_request(option: &str) -> serde_json::Value {
    json!({ "option": option })
}

/// Create a goto request body.
pub fn goto_request(question: i64) -> serde_json::Value {
    json!({ "question": question })
}

/// Create a material upload request body.
pub fn upload_material_request(course: &str, title: &str, content: &str) -> serde_json::Value {
    json!({
        "course": course,
        "title": title,
        "file_name": format!("{}.txt", title.to_lowercase().replace(' ', "-")),
        "content": content,
    })
}

/// Create a deck create request body.
pub fn create_deck_request(course: &str, name: &str) -> serde_json::Value {
    json!({ "course": course, "name": name })
}

/// Create a deck generate request body.
pub fn generate_deck_request(material_id: &str, name: Option<&str>) -> serde_json::Value {
    json!({ "material_id": material_id, "name": name })
}

/// Create a flashcard add request body.
pub fn add_card_request(front: &str, back: &str) -> serde_json::Value {
    json!({ "front": front, "back": back })
}

/// Create a predictions generate request body.
pub fn generate_predictions_request(course: &str, count: Option<usize>) -> serde_json::Value {
    json!({ "course": course, "count": count })
}

/// Create a tutor chat request body.
pub fn tutor_chat_request(course: &str, message: &str) -> serde_json::Value {
    json!({ "course": course, "message": message })
}
