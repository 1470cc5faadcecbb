//! Async driver that runs [`FeedState`] transitions against a gateway.
//!
//! A session is cheap to clone and every clone drives the same feed. Each
//! operation takes the state lock only to perform a transition, releases it
//! across the gateway call, and re-takes it to apply the result. Several
//! fetches may therefore be in flight at once; the epoch check in
//! [`FeedState::complete`] decides which results still apply.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use mediafeed_core::{FeedResult, FetchGateway, Section};

use crate::config::SyncConfig;
use crate::orchestrator::{FeedSnapshot, FeedState, FetchOutcome, FetchRequest};
use crate::scheduler::{RefreshMetricsSnapshot, RefreshScheduler, RefreshTarget};

pub struct FeedSession<G: FetchGateway> {
    inner: Arc<SessionInner<G>>,
}

impl<G: FetchGateway> Clone for FeedSession<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<G: FetchGateway> {
    gateway: G,
    config: SyncConfig,
    state: Mutex<FeedState>,
    scheduler: Mutex<Option<RefreshScheduler>>,
}

impl<G: FetchGateway> SessionInner<G> {
    async fn run(&self, request: FetchRequest) -> FetchOutcome {
        tracing::debug!(
            section = %request.section,
            epoch = %request.epoch,
            kind = ?request.kind,
            cursor = ?request.cursor,
            "Issuing fetch"
        );
        let result = self
            .gateway
            .fetch_page(&request.section, request.cursor.as_ref(), request.page_size)
            .await;
        self.state.lock().await.complete(&request, result)
    }
}

#[async_trait]
impl<G: FetchGateway + 'static> RefreshTarget for SessionInner<G> {
    async fn refresh_tick(&self) -> bool {
        let request = self.state.lock().await.refresh_tick();
        match request {
            Some(request) => {
                self.run(request).await;
                true
            }
            None => false,
        }
    }
}

impl<G: FetchGateway + 'static> FeedSession<G> {
    pub fn new(gateway: G, config: SyncConfig) -> Self {
        let state = FeedState::new(&config, gateway.has_more_policy());
        Self {
            inner: Arc::new(SessionInner {
                gateway,
                config,
                state: Mutex::new(state),
                scheduler: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    /// Application start: section catalog, stats, then the first page of
    /// the initial section.
    pub async fn bootstrap(&self) -> FetchOutcome {
        match self.inner.gateway.fetch_section_catalog().await {
            Ok(Some(catalog)) => {
                tracing::debug!(sections = catalog.sections.len(), "Loaded section catalog");
                self.inner.state.lock().await.install_catalog(&catalog);
            }
            Ok(None) => {
                tracing::debug!("No section catalog; sections will be derived from first page");
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to fetch section catalog");
            }
        }

        if let Err(err) = self.reload_stats().await {
            tracing::warn!(error = %err, "Failed to fetch summary stats");
        }

        let request = self.inner.state.lock().await.start_initial();
        self.inner.run(request).await
    }

    /// Switch to `section`.
    ///
    /// Returns `Ok(None)` when the section is already active, and
    /// `Err(InvalidFilter)` when it is not a known section.
    pub async fn set_filter(
        &self,
        section: impl Into<Section>,
    ) -> FeedResult<Option<FetchOutcome>> {
        let request = self.inner.state.lock().await.set_filter(section.into())?;
        match request {
            Some(request) => Ok(Some(self.inner.run(request).await)),
            None => Ok(None),
        }
    }

    /// Fetch the next page. `None` means the request was rejected.
    pub async fn load_more(&self) -> Option<FetchOutcome> {
        let request = self.inner.state.lock().await.load_more()?;
        Some(self.inner.run(request).await)
    }

    /// Replace the collection with a fresh first page of the active section.
    pub async fn refresh_now(&self) -> FetchOutcome {
        let request = self.inner.state.lock().await.refresh();
        self.inner.run(request).await
    }

    pub async fn select_item(&self, id: &str) -> bool {
        self.inner.state.lock().await.select_item(id)
    }

    pub async fn select_next(&self) {
        self.inner.state.lock().await.select_next();
    }

    pub async fn select_previous(&self) {
        self.inner.state.lock().await.select_previous();
    }

    /// Re-fetch the decorative summary stats.
    pub async fn reload_stats(&self) -> FeedResult<()> {
        let stats = self.inner.gateway.fetch_summary_stats().await?;
        self.inner.state.lock().await.set_stats(stats);
        Ok(())
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    /// Start the periodic refresh. Returns false if it was already running.
    pub async fn start(&self) -> bool {
        let mut scheduler = self.inner.scheduler.lock().await;
        if scheduler.as_ref().is_some_and(RefreshScheduler::is_running) {
            return false;
        }
        *scheduler = Some(RefreshScheduler::spawn(
            Arc::downgrade(&self.inner),
            self.inner.config.refresh_interval,
        ));
        true
    }

    /// Stop the periodic refresh and wait for its task to finish.
    pub async fn stop(&self) -> Option<RefreshMetricsSnapshot> {
        let scheduler = self.inner.scheduler.lock().await.take()?;
        Some(scheduler.stop().await)
    }

    pub async fn is_refreshing(&self) -> bool {
        self.inner
            .scheduler
            .lock()
            .await
            .as_ref()
            .is_some_and(RefreshScheduler::is_running)
    }
}
