//! HTTP implementation of the athena backend API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use athena_core::error::BackendError;
use athena_core::model::{Grade, OptionLabel, Question, QuestionId};
use athena_core::scrape::ScrapeRequest;
use athena_core::traits::{
    BackendResult, ExplanationRequest, LockScope, QuizBackend, QuizSetDetails, QuizSetRef,
    QuizSetScore, ScoreUpdate, ScrapeResponse,
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend client speaking the athena REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> BackendResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// `base_url` must be an absolute http(s) URL, e.g.
    /// `http://localhost:5000/api`.
    pub fn with_timeout(base_url: &str, timeout_secs: u64) -> BackendResult<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(BackendError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base.to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> BackendResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout_secs)
            } else {
                BackendError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status < 400 {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or(body);
        if status == 404 {
            Err(BackendError::NotFound(message))
        } else {
            Err(BackendError::Api { status, message })
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        let response = self.send(self.client.get(self.url(path))).await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> BackendResult<T> {
        let response = self
            .send(self.client.post(self.url(path)).json(body))
            .await?;
        decode(response).await
    }

    /// POST where only the status matters.
    async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> BackendResult<()> {
        self.send(self.client.post(self.url(path)).json(body))
            .await
            .map(drop)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> BackendResult<T> {
    response
        .json()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// `NotFound` as `None`, for lookups where absence is normal.
fn optional<T>(result: BackendResult<T>) -> BackendResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(BackendError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct LockStateBody {
    lock_state: bool,
}

#[derive(Deserialize)]
struct ToggleLockBody {
    #[serde(default)]
    new_state: Option<bool>,
}

#[derive(Deserialize)]
struct FavoriteEntry {
    id: QuestionId,
}

#[derive(Serialize, Deserialize)]
struct EyeIconBody {
    state: bool,
}

#[derive(Deserialize)]
struct SavedExplanationBody {
    explanation: String,
}

#[derive(Deserialize)]
struct GeneratedExplanationBody {
    further_explanation: String,
}

#[derive(Deserialize)]
struct DiscussionBody {
    discussion_comments: String,
}

#[derive(Deserialize)]
struct EditorContentBody {
    content: String,
}

#[async_trait]
impl QuizBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn get_quiz_sets(&self) -> BackendResult<Vec<QuizSetRef>> {
        self.get("getQuizSets").await
    }

    #[instrument(skip(self))]
    async fn get_quiz_set_details(&self, quiz_set_id: &str) -> BackendResult<QuizSetDetails> {
        self.get(&format!("getQuizSetDetails/{quiz_set_id}")).await
    }

    #[instrument(skip(self))]
    async fn get_quiz_set_score(&self, quiz_set_id: &str) -> BackendResult<QuizSetScore> {
        self.get(&format!("getQuizSetScore/{quiz_set_id}")).await
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn get_lock_state(&self, scope: &LockScope) -> BackendResult<bool> {
        let body: LockStateBody = self
            .get(&format!("getLockState/{}", scope.path_segment()))
            .await?;
        Ok(body.lock_state)
    }

    #[instrument(skip(self), fields(scope = %scope))]
    async fn toggle_lock_state(&self, scope: &LockScope) -> BackendResult<Option<bool>> {
        let body: ToggleLockBody = self
            .post(&format!("toggleLockState/{}", scope.path_segment()), &serde_json::json!({}))
            .await?;
        Ok(body.new_state)
    }

    #[instrument(skip(self))]
    async fn rename_quiz_set(&self, quiz_set_id: &str, new_title: &str) -> BackendResult<()> {
        let request = self
            .client
            .put(self.url(&format!("renameQuizSet/{quiz_set_id}")))
            .json(&serde_json::json!({ "new_title": new_title }));
        self.send(request).await.map(drop)
    }

    #[instrument(skip(self))]
    async fn delete_quiz_set(&self, quiz_set_id: &str) -> BackendResult<()> {
        let request = self
            .client
            .delete(self.url(&format!("deleteQuizSet/{quiz_set_id}")));
        self.send(request).await.map(drop)
    }

    #[instrument(skip(self, request), fields(title = %request.title, sources = request.urls.len()))]
    async fn start_scraping(&self, request: &ScrapeRequest) -> BackendResult<ScrapeResponse> {
        self.post("startScraping", request).await
    }

    #[instrument(skip(self))]
    async fn download_quiz_pdf(&self, quiz_set_id: &str) -> BackendResult<Vec<u8>> {
        let response = self
            .send(self.client.get(self.url(&format!("downloadQuizPdf/{quiz_set_id}"))))
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self))]
    async fn get_questions(&self, quiz_set_id: &str) -> BackendResult<Vec<Question>> {
        let questions: Vec<Question> = self
            .get(&format!("getQuestionsByQuizSet/{quiz_set_id}"))
            .await?;
        debug!(count = questions.len(), "questions fetched");
        Ok(questions)
    }

    #[instrument(skip(self))]
    async fn shuffle_questions(&self, quiz_set_id: &str) -> BackendResult<Vec<Question>> {
        self.post(&format!("shuffleQuestions/{quiz_set_id}"), &serde_json::json!({}))
            .await
    }

    #[instrument(skip(self))]
    async fn reset_questions(&self, quiz_set_id: &str) -> BackendResult<Vec<Question>> {
        self.post(&format!("resetQuestions/{quiz_set_id}"), &serde_json::json!({}))
            .await
    }

    #[instrument(skip(self))]
    async fn get_user_selections(
        &self,
        quiz_set_id: &str,
    ) -> BackendResult<HashMap<QuestionId, Option<OptionLabel>>> {
        self.get(&format!("getUserSelections/{quiz_set_id}")).await
    }

    #[instrument(skip(self))]
    async fn update_user_selection(
        &self,
        question_id: QuestionId,
        selected_option: Option<OptionLabel>,
    ) -> BackendResult<()> {
        self.post_unit(
            "updateUserSelection",
            &serde_json::json!({
                "question_id": question_id,
                "selected_option": selected_option,
            }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn update_score(&self, update: &ScoreUpdate) -> BackendResult<()> {
        self.post_unit("updateScore", update).await
    }

    #[instrument(skip(self))]
    async fn get_favorites(&self, quiz_set_id: &str) -> BackendResult<Vec<QuestionId>> {
        let entries: Vec<FavoriteEntry> = self.get(&format!("getFavorites/{quiz_set_id}")).await?;
        Ok(entries.into_iter().map(|e| e.id).collect())
    }

    #[instrument(skip(self))]
    async fn toggle_favorite(&self, question_id: QuestionId) -> BackendResult<()> {
        self.post_unit(
            "toggleFavorite",
            &serde_json::json!({ "question_id": question_id }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_eye_icon_state(&self, quiz_set_id: &str) -> BackendResult<bool> {
        let body: EyeIconBody = self.get(&format!("getEyeIconState/{quiz_set_id}")).await?;
        Ok(body.state)
    }

    #[instrument(skip(self))]
    async fn update_eye_icon_state(&self, quiz_set_id: &str, state: bool) -> BackendResult<()> {
        self.post_unit(
            &format!("updateEyeIconState/{quiz_set_id}"),
            &EyeIconBody { state },
        )
        .await
    }

    #[instrument(skip(self))]
    async fn update_quiz_set_score(&self, quiz_set_id: &str, score: u32) -> BackendResult<()> {
        self.post_unit(
            &format!("updateQuizSetScore/{quiz_set_id}"),
            &serde_json::json!({ "score": score }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn update_quiz_set_status(&self, quiz_set_id: &str, status: Grade) -> BackendResult<()> {
        self.post_unit(
            &format!("updateQuizSetStatus/{quiz_set_id}"),
            &serde_json::json!({ "status": status }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_further_explanation(
        &self,
        question_id: QuestionId,
    ) -> BackendResult<Option<String>> {
        let body: Option<SavedExplanationBody> =
            optional(self.get(&format!("getFurtherExplanation/{question_id}")).await)?;
        Ok(body.map(|b| b.explanation))
    }

    #[instrument(skip(self, request))]
    async fn generate_further_explanation(
        &self,
        request: &ExplanationRequest,
    ) -> BackendResult<String> {
        let body: GeneratedExplanationBody = self.post("getFurtherExplanation", request).await?;
        Ok(body.further_explanation)
    }

    #[instrument(skip(self, explanation))]
    async fn save_further_explanation(
        &self,
        question_id: QuestionId,
        explanation: &str,
    ) -> BackendResult<()> {
        self.post_unit(
            "saveFurtherExplanation",
            &serde_json::json!({ "question_id": question_id, "explanation": explanation }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_discussion_comments(
        &self,
        question_id: QuestionId,
    ) -> BackendResult<Option<String>> {
        let body: Option<DiscussionBody> =
            optional(self.get(&format!("getDiscussionComments/{question_id}")).await)?;
        Ok(body.map(|b| b.discussion_comments))
    }

    #[instrument(skip(self))]
    async fn get_editor_content(&self) -> BackendResult<Option<String>> {
        let body: Option<EditorContentBody> = optional(self.get("getEditorContent").await)?;
        Ok(body.map(|b| b.content))
    }

    #[instrument(skip(self, content))]
    async fn save_editor_content(&self, content: &str) -> BackendResult<()> {
        self.post_unit(
            "saveEditorContent",
            &serde_json::json!({ "content": content }),
        )
        .await
    }
}
