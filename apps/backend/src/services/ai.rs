//! Client for the AI functions service.
//!
//! The functions service exposes four endpoints: question generation,
//! question extraction from uploaded material, flashcard generation,
//! and tutor chat. All calls are authenticated with an API key header
//! and exchange JSON bodies. Question generation sends
//! `{course, material_refs[], count}` and both question endpoints
//! answer `{predictions: [...]}`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("AI service returned status {0}")]
    Status(u16),
    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// One question as returned by the AI service. The wire field for the
/// prompt is `question`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(rename = "question")]
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl GeneratedQuestion {
    /// A usable question has a prompt, at least two options, and names
    /// one of its options as the correct answer.
    pub fn is_well_formed(&self) -> bool {
        !self.text.trim().is_empty()
            && self.options.len() >= 2
            && self.options.contains(&self.correct_answer)
    }
}

/// One flashcard as returned by the AI service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub front: String,
    pub back: String,
}

/// One prior turn passed to the tutor endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorTurn {
    pub role: String,
    pub content: String,
}

/// Interface to the AI functions service
#[async_trait]
pub trait AiService: Send + Sync {
    /// Generate fresh questions for a course, grounded in the given
    /// uploaded-material references (storage keys)
    async fn generate_questions(
        &self,
        course: &str,
        material_refs: &[String],
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, AiError>;

    /// Extract questions from uploaded material text
    async fn extract_questions(
        &self,
        course: &str,
        material: &str,
    ) -> Result<Vec<GeneratedQuestion>, AiError>;

    /// Generate flashcards from material text
    async fn generate_flashcards(
        &self,
        course: &str,
        material: &str,
    ) -> Result<Vec<GeneratedCard>, AiError>;

    /// Get a tutor reply given recent conversation history
    async fn tutor_reply(
        &self,
        course: &str,
        history: &[TutorTurn],
        message: &str,
    ) -> Result<String, AiError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    course: &'a str,
    material_refs: &'a [String],
    count: usize,
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    course: &'a str,
    material: &'a str,
}

#[derive(Serialize)]
struct TutorRequest<'a> {
    course: &'a str,
    history: &'a [TutorTurn],
    message: &'a str,
}

/// Both question endpoints answer with a `predictions` envelope.
#[derive(Deserialize)]
struct QuestionsResponse {
    predictions: Vec<GeneratedQuestion>,
}

#[derive(Deserialize)]
struct CardsResponse {
    cards: Vec<GeneratedCard>,
}

#[derive(Deserialize)]
struct TutorResponse {
    reply: String,
}

/// HTTP client against the AI functions service
pub struct HttpAiService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Bound on any single call to the functions service.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

impl HttpAiService {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client with static configuration");
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Create from environment variables.
    ///
    /// Required env vars:
    /// - AI_FUNCTIONS_URL: Base URL of the functions service
    /// - AI_FUNCTIONS_KEY: API key
    pub fn from_env() -> Result<Self, AiError> {
        let base_url = std::env::var("AI_FUNCTIONS_URL")
            .map_err(|_| AiError::Config("AI_FUNCTIONS_URL not set".to_string()))?;
        let api_key = std::env::var("AI_FUNCTIONS_KEY")
            .map_err(|_| AiError::Config("AI_FUNCTIONS_KEY not set".to_string()))?;

        Ok(Self::new(base_url, api_key))
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, AiError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Status(status.as_u16()));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl AiService for HttpAiService {
    async fn generate_questions(
        &self,
        course: &str,
        material_refs: &[String],
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, AiError> {
        let request = GenerateRequest {
            course,
            material_refs,
            count,
        };
        let response: QuestionsResponse = self.post_json("generate-questions", &request).await?;
        tracing::debug!(
            "AI generated {} questions for course {}",
            response.predictions.len(),
            course
        );
        Ok(response.predictions)
    }

    async fn extract_questions(
        &self,
        course: &str,
        material: &str,
    ) -> Result<Vec<GeneratedQuestion>, AiError> {
        let request = ExtractRequest { course, material };
        let response: QuestionsResponse = self.post_json("extract-questions", &request).await?;
        Ok(response.predictions)
    }

    async fn generate_flashcards(
        &self,
        course: &str,
        material: &str,
    ) -> Result<Vec<GeneratedCard>, AiError> {
        let request = ExtractRequest { course, material };
        let response: CardsResponse = self.post_json("generate-flashcards", &request).await?;
        tracing::debug!(
            "AI generated {} flashcards for course {}",
            response.cards.len(),
            course
        );
        Ok(response.cards)
    }

    async fn tutor_reply(
        &self,
        course: &str,
        history: &[TutorTurn],
        message: &str,
    ) -> Result<String, AiError> {
        let request = TutorRequest {
            course,
            history,
            message,
        };
        let response: TutorResponse = self.post_json("tutor-chat", &request).await?;
        Ok(response.reply)
    }
}

/// Canned AI service for tests. Answers every call from fixed data, or
/// fails every call when built with [`ScriptedAiService::failing`].
pub struct ScriptedAiService {
    fail: bool,
}

impl ScriptedAiService {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A service whose every call returns an upstream error.
    pub fn failing() -> Self {
        Self { fail: true }
    }

    fn question(course: &str, n: usize) -> GeneratedQuestion {
        GeneratedQuestion {
            text: format!("{} generated question {}", course, n),
            options: vec![
                format!("generated answer {}", n),
                "some other answer".to_string(),
                "a third answer".to_string(),
                "a fourth answer".to_string(),
            ],
            correct_answer: format!("generated answer {}", n),
            topic: Some("generated".to_string()),
            difficulty: Some("medium".to_string()),
            confidence: Some(0.5),
        }
    }
}

impl Default for ScriptedAiService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiService for ScriptedAiService {
    async fn generate_questions(
        &self,
        course: &str,
        _material_refs: &[String],
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>, AiError> {
        if self.fail {
            return Err(AiError::Status(503));
        }
        Ok((1..=count).map(|n| Self::question(course, n)).collect())
    }

    async fn extract_questions(
        &self,
        course: &str,
        _material: &str,
    ) -> Result<Vec<GeneratedQuestion>, AiError> {
        if self.fail {
            return Err(AiError::Status(503));
        }
        Ok((1..=5).map(|n| Self::question(course, n)).collect())
    }

    async fn generate_flashcards(
        &self,
        _course: &str,
        _material: &str,
    ) -> Result<Vec<GeneratedCard>, AiError> {
        if self.fail {
            return Err(AiError::Status(503));
        }
        Ok(vec![
            GeneratedCard {
                front: "What produces ATP?".to_string(),
                back: "Mitochondria".to_string(),
            },
            GeneratedCard {
                front: "What pairs with adenine?".to_string(),
                back: "Thymine".to_string(),
            },
        ])
    }

    async fn tutor_reply(
        &self,
        _course: &str,
        history: &[TutorTurn],
        message: &str,
    ) -> Result<String, AiError> {
        if self.fail {
            return Err(AiError::Status(503));
        }
        Ok(format!(
            "You asked: {} (after {} earlier turns)",
            message,
            history.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn question_body() -> serde_json::Value {
        json!({
            "predictions": [
                {
                    "question": "What organelle produces ATP?",
                    "options": ["Mitochondria", "Ribosome", "Nucleus", "Golgi body"],
                    "correct_answer": "Mitochondria",
                    "topic": "Cell biology",
                    "difficulty": "easy",
                    "confidence": 0.92
                },
                {
                    "question": "Which base pairs with adenine in DNA?",
                    "options": ["Thymine", "Cytosine", "Guanine", "Uracil"],
                    "correct_answer": "Thymine"
                }
            ]
        })
    }

    #[tokio::test]
    async fn generate_questions_sends_refs_and_parses_predictions() {
        let server = MockServer::start().await;
        // Unless the request carries the material refs, the mock does
        // not match and the call fails.
        Mock::given(method("POST"))
            .and(path("/generate-questions"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(json!({
                "course": "BIO-101",
                "material_refs": ["user/material/notes.txt"],
                "count": 21
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(question_body()))
            .mount(&server)
            .await;

        let service = HttpAiService::new(server.uri(), "test-key");
        let refs = vec!["user/material/notes.txt".to_string()];
        let questions = service.generate_questions("BIO-101", &refs, 21).await.unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "What organelle produces ATP?");
        assert_eq!(questions[0].correct_answer, "Mitochondria");
        assert_eq!(questions[0].topic.as_deref(), Some("Cell biology"));
        assert_eq!(questions[1].topic, None);
    }

    #[tokio::test]
    async fn extract_questions_hits_extract_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract-questions"))
            .and(body_partial_json(json!({ "course": "BIO-101" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(question_body()))
            .mount(&server)
            .await;

        let service = HttpAiService::new(server.uri(), "test-key");
        let questions = service
            .extract_questions("BIO-101", "The mitochondria is the powerhouse of the cell.")
            .await
            .unwrap();

        assert_eq!(questions.len(), 2);
    }

    #[tokio::test]
    async fn generate_flashcards_parses_cards() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate-flashcards"))
            .and(body_partial_json(json!({ "course": "BIO-101" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cards": [
                    { "front": "What produces ATP?", "back": "Mitochondria" }
                ]
            })))
            .mount(&server)
            .await;

        let service = HttpAiService::new(server.uri(), "test-key");
        let cards = service
            .generate_flashcards("BIO-101", "lecture notes")
            .await
            .unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].back, "Mitochondria");
    }

    #[tokio::test]
    async fn tutor_reply_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tutor-chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "reply": "Think about ATP." })),
            )
            .mount(&server)
            .await;

        let service = HttpAiService::new(server.uri(), "test-key");
        let history = vec![TutorTurn {
            role: "user".to_string(),
            content: "What does the mitochondria do?".to_string(),
        }];
        let reply = service
            .tutor_reply("BIO-101", &history, "Can you give me a hint?")
            .await
            .unwrap();

        assert_eq!(reply, "Think about ATP.");
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate-questions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = HttpAiService::new(server.uri(), "test-key");
        let err = service.generate_questions("BIO-101", &[], 25).await.unwrap_err();

        assert!(matches!(err, AiError::Status(500)));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate-questions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let service = HttpAiService::new(server.uri(), "test-key");
        let err = service.generate_questions("BIO-101", &[], 25).await.unwrap_err();

        assert!(matches!(err, AiError::InvalidResponse(_)));
    }

    #[test]
    fn well_formed_requires_correct_answer_among_options() {
        let mut question = GeneratedQuestion {
            text: "Pick one".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            correct_answer: "a".to_string(),
            topic: None,
            difficulty: None,
            confidence: None,
        };
        assert!(question.is_well_formed());

        question.correct_answer = "c".to_string();
        assert!(!question.is_well_formed());

        question.correct_answer = "a".to_string();
        question.options = vec!["a".to_string()];
        assert!(!question.is_well_formed());

        question.options = vec!["a".to_string(), "b".to_string()];
        question.text = "   ".to_string();
        assert!(!question.is_well_formed());
    }
}
