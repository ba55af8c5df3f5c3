//! Fixtures shared by the service and router tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::{Directory, MemoryDirectory};
use crate::error::{AppError, AppResult};
use crate::mail::LogMailer;
use crate::media::MediaStore;
use crate::models::{Match, NewUser, User};
use crate::realtime::{ConnectionId, ServerEvent};
use crate::state::AppState;
use crate::utils::Config;

pub const TEST_SECRET: &str = "test-secret";

/// Hands out fake URLs; can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct FakeMedia {
    failing: AtomicBool,
    uploads: Mutex<Vec<String>>,
}

impl FakeMedia {
    pub fn fail_uploads(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub async fn uploads(&self) -> Vec<String> {
        self.uploads.lock().await.clone()
    }
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> AppResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Upstream("media provider down".to_string()));
        }
        if bytes.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }
        let url = format!("https://media.test/{}-{}", Uuid::new_v4(), name);
        self.uploads.lock().await.push(url.clone());
        Ok(url)
    }
}

pub struct TestApp {
    pub state: AppState,
    pub mailer: Arc<LogMailer>,
    pub media: Arc<FakeMedia>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mailer = Arc::new(LogMailer::new());
        let media = Arc::new(FakeMedia::default());
        let state = AppState::new(
            Config::local(TEST_SECRET),
            Arc::new(MemoryDirectory::new()),
            media.clone(),
            mailer.clone(),
        );
        Self { state, mailer, media }
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.state.directory
    }

    /// A verified 25 year old with default preferences.
    pub async fn user(&self, name: &str) -> User {
        let user = self
            .directory()
            .create_user(NewUser {
                email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
                password_hash: "not-a-real-hash".to_string(),
                name: name.to_string(),
                age: 25,
                gender: "female".to_string(),
                verification_token: Uuid::new_v4().to_string(),
            })
            .await
            .unwrap();
        self.directory().mark_user_verified(user.id).await.unwrap();
        self.directory().get_user(user.id).await.unwrap().unwrap()
    }

    pub async fn connect(&self, user_id: Uuid) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        self.state.registry.register(user_id).await
    }

    /// Two users with an active match between them.
    pub async fn matched_pair(&self) -> (User, User, Match) {
        let a = self.user("Ada").await;
        let b = self.user("Bob").await;
        let m = self.directory().insert_match(a.id, b.id).await.unwrap();
        (a, b, m)
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        crate::auth::issue_token(user_id, TEST_SECRET, 1).unwrap()
    }
}

/// Everything already pushed to the receiver.
pub fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn event_names(events: &[ServerEvent]) -> Vec<&str> {
    events.iter().map(|e| e.event.as_str()).collect()
}
