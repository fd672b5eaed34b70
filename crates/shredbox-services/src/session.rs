//! Session lifecycle service: create, view, complete.

use std::sync::Arc;

use shredbox_core::{codes, AppError, SessionView};
use shredbox_store::SessionRepository;

#[derive(Clone)]
pub struct SessionService {
    repository: Arc<SessionRepository>,
}

impl SessionService {
    pub fn new(repository: Arc<SessionRepository>) -> Self {
        SessionService { repository }
    }

    /// Create an empty active session and return its view. The code in the
    /// view is the only handle the customer ever gets.
    #[tracing::instrument(skip(self))]
    pub async fn create_session(&self) -> Result<SessionView, AppError> {
        let session = self.repository.create().await?;
        Ok(SessionView::from(&session))
    }

    /// Load a session for display. Expired sessions read as not found and
    /// have already been cleaned up by the time this returns.
    #[tracing::instrument(skip(self))]
    pub async fn get_session_view(&self, code: &str) -> Result<SessionView, AppError> {
        let code = codes::normalize_code(code)?;
        let session = self
            .repository
            .get(&code)
            .await?
            .ok_or_else(|| AppError::SessionNotFound(code.clone()))?;
        Ok(SessionView::from(&session))
    }

    /// Explicit completion: the shopkeeper is done, every blob is erased
    /// and the record removed. There is no way back from here.
    #[tracing::instrument(skip(self))]
    pub async fn complete_session(&self, code: &str) -> Result<(), AppError> {
        let code = codes::normalize_code(code)?;
        self.repository.complete(&code).await
    }
}
