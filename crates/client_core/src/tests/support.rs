//! Fakes shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::TemplateId,
    protocol::{ListTemplatesQuery, LoginRequest, LoginResponse, Template, TemplatePage},
};
use storage::{MemorySessionStore, SessionStore, SessionWrite, ACCESS_TOKEN_KEY};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::{api::TemplateApi, error::RequestFailedError};

pub struct PendingListCall {
    pub access_token: String,
    pub query: ListTemplatesQuery,
    responder: oneshot::Sender<Result<TemplatePage, RequestFailedError>>,
}

impl PendingListCall {
    pub fn respond(self, outcome: Result<TemplatePage, RequestFailedError>) {
        let _ = self.responder.send(outcome);
    }
}

/// Login answers are queued up front; listing calls are handed to the test,
/// which decides when and how each one resolves.
pub struct ScriptedApi {
    login_responses: Mutex<VecDeque<Result<LoginResponse, RequestFailedError>>>,
    pub login_calls: Mutex<Vec<LoginRequest>>,
    list_calls: mpsc::UnboundedSender<PendingListCall>,
    pub list_call_count: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingListCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api = Arc::new(Self {
            login_responses: Mutex::new(VecDeque::new()),
            login_calls: Mutex::new(Vec::new()),
            list_calls: tx,
            list_call_count: AtomicUsize::new(0),
        });
        (api, rx)
    }

    pub async fn push_login(&self, outcome: Result<LoginResponse, RequestFailedError>) {
        self.login_responses.lock().await.push_back(outcome);
    }

    pub fn list_calls(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TemplateApi for ScriptedApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RequestFailedError> {
        self.login_calls.lock().await.push(request.clone());
        self.login_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(RequestFailedError::Transport("no scripted login".into())))
    }

    async fn list_public_templates(
        &self,
        access_token: &str,
        query: &ListTemplatesQuery,
    ) -> Result<TemplatePage, RequestFailedError> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        let (responder, rx) = oneshot::channel();
        self.list_calls
            .send(PendingListCall {
                access_token: access_token.to_string(),
                query: query.clone(),
                responder,
            })
            .map_err(|_| RequestFailedError::Transport("test receiver dropped".into()))?;
        rx.await
            .unwrap_or_else(|_| Err(RequestFailedError::Transport("responder dropped".into())))
    }
}

/// Memory store that counts batches applied to it.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemorySessionStore,
    pub writes: AtomicUsize,
}

impl CountingStore {
    pub fn signed_in(token: &str) -> Self {
        Self {
            inner: MemorySessionStore::with_entries([(ACCESS_TOKEN_KEY, token)]),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn apply(&self, writes: &[SessionWrite]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.apply(writes).await
    }
}

pub fn template(id: i64, title: &str) -> Template {
    Template {
        id: TemplateId(id),
        title: title.to_string(),
        status: Some("APPROVED".to_string()),
        share_count: 0,
        created_at: None,
        content: None,
        extra: Default::default(),
    }
}

pub fn page_of(titles: &[&str], total_pages: u32, total_elements: u64) -> TemplatePage {
    TemplatePage {
        content: titles
            .iter()
            .enumerate()
            .map(|(idx, title)| template(idx as i64 + 1, title))
            .collect(),
        total_pages,
        total_elements,
    }
}

pub fn login_response(token: &str, refresh: &str, role: Option<&str>) -> LoginResponse {
    LoginResponse {
        token: Some(token.to_string()),
        refresh_token: Some(refresh.to_string()),
        user_role: role.map(shared::domain::UserRole::parse),
        user_name: Some("tester".to_string()),
        token_type: Some("Bearer".to_string()),
    }
}
