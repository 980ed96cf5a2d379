use std::{sync::Arc, time::Duration};

use shared::{
    domain::{SortOrder, UserRole},
    protocol::{ListTemplatesQuery, TemplatePage},
};
use storage::SessionStore;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use super::state::{FetchState, FetchTicket, ListingState, QueryState};
use crate::{
    api::TemplateApi,
    error::{AuthRequiredError, ListingError, RequestFailedError},
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// What the listing view renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingSnapshot {
    pub query: QueryState,
    pub fetch: FetchState,
    pub role: Option<UserRole>,
}

impl ListingSnapshot {
    fn of(state: &ListingState) -> Self {
        Self {
            query: state.query().clone(),
            fetch: state.fetch().clone(),
            role: state.role().cloned(),
        }
    }
}

pub struct ListingController {
    api: Arc<dyn TemplateApi>,
    store: Arc<dyn SessionStore>,
    request_timeout: Duration,
    state: Mutex<ListingState>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
    snapshots: watch::Sender<ListingSnapshot>,
}

impl ListingController {
    pub fn new(
        api: Arc<dyn TemplateApi>,
        store: Arc<dyn SessionStore>,
        request_timeout: Duration,
    ) -> Arc<Self> {
        Self::new_with_query(api, store, request_timeout, QueryState::default())
    }

    pub fn new_with_query(
        api: Arc<dyn TemplateApi>,
        store: Arc<dyn SessionStore>,
        request_timeout: Duration,
        query: QueryState,
    ) -> Arc<Self> {
        let state = ListingState::with_query(query);
        let (snapshots, _) = watch::channel(ListingSnapshot::of(&state));
        Arc::new(Self {
            api,
            store,
            request_timeout,
            state: Mutex::new(state),
            in_flight: Mutex::new(Vec::new()),
            snapshots,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<ListingSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Reads the stored role once and loads the first page.
    pub async fn mount(self: &Arc<Self>) {
        let role = match storage::user_role(self.store.as_ref()).await {
            Ok(role) => role,
            Err(err) => {
                warn!("listing: failed to read stored role: {err:#}");
                None
            }
        };
        self.update(|state| {
            state.set_role(role);
            Some(state.refresh())
        })
        .await;
    }

    pub async fn reload(self: &Arc<Self>) {
        self.update(|state| Some(state.refresh())).await;
    }

    pub async fn set_search(self: &Arc<Self>, text: impl Into<String>) {
        let text = text.into();
        self.update(move |state| state.set_search(text)).await;
    }

    pub async fn set_page(self: &Arc<Self>, page: u32) {
        self.update(|state| state.set_page(page)).await;
    }

    pub async fn set_sort(self: &Arc<Self>, sort_order: SortOrder) {
        self.update(|state| state.set_sort(sort_order)).await;
    }

    /// Waits for every fetch issued so far to finish, stale ones included.
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.in_flight.lock().await);
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(err) = handle.await {
                    warn!("listing: fetch task ended abnormally: {err}");
                }
            }
        }
    }

    async fn update<F>(self: &Arc<Self>, mutate: F)
    where
        F: FnOnce(&mut ListingState) -> Option<FetchTicket>,
    {
        let ticket = {
            let mut state = self.state.lock().await;
            let ticket = mutate(&mut state);
            if ticket.is_some() {
                self.publish(&state);
            }
            ticket
        };

        if let Some(ticket) = ticket {
            let handle = self.spawn_fetch(ticket);
            let mut in_flight = self.in_flight.lock().await;
            in_flight.retain(|task| !task.is_finished());
            in_flight.push(handle);
        }
    }

    fn spawn_fetch(self: &Arc<Self>, ticket: FetchTicket) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = controller.fetch_page(&ticket.query).await;
            let outcome = match outcome {
                Ok(page) => {
                    info!(
                        "listing: loaded page={} items={} total_pages={} total_elements={}",
                        ticket.query.page + 1,
                        page.content.len(),
                        page.total_pages,
                        page.total_elements
                    );
                    Ok(page)
                }
                Err(err) => {
                    warn!("listing: fetch failed generation={} error={err}", ticket.generation);
                    Err(err.user_message())
                }
            };

            let mut state = controller.state.lock().await;
            if state.resolve(ticket.generation, outcome) {
                controller.publish(&state);
            } else {
                debug!(
                    "listing: dropped stale response generation={} latest={}",
                    ticket.generation,
                    state.generation()
                );
            }
        })
    }

    async fn fetch_page(&self, query: &ListTemplatesQuery) -> Result<TemplatePage, ListingError> {
        let access_token = storage::access_token(self.store.as_ref())
            .await
            .map_err(ListingError::Session)?
            .ok_or(AuthRequiredError)?;

        match tokio::time::timeout(
            self.request_timeout,
            self.api.list_public_templates(&access_token, query),
        )
        .await
        {
            Ok(result) => Ok(result?),
            Err(_) => Err(RequestFailedError::Timeout.into()),
        }
    }

    fn publish(&self, state: &ListingState) {
        self.snapshots.send_replace(ListingSnapshot::of(state));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
