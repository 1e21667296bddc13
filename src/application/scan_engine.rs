//! Scan engine lifecycle
//!
//! Wires the shared scan context to one overseer task and a pool of worker
//! tasks, and owns their shutdown.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::domain::models::{Coordinate, Credentials, ScanConfig};
use crate::domain::ports::{GameApiClient, ScanSink};
use crate::services::{
    Overseer, RetryPolicy, ScanContext, ScanStatsSnapshot, SessionPool, Worker,
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Snapshot of a running engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub workers: usize,
    pub origin: Coordinate,
    pub relocation_pending: bool,
    /// Origin the next iteration moves to, if a relocation is pending
    pub relocation_target: Option<Coordinate>,
    pub queued: usize,
    pub stats: ScanStatsSnapshot,
}

/// Overseer plus worker pool over one scan context
///
/// # Examples
///
/// ```no_run
/// use ringscan::adapters::{JsonLinesSink, SimulatedApiClient};
/// use ringscan::application::ScanEngine;
/// use ringscan::domain::models::{Credentials, ScanConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = ScanConfig::default();
/// let accounts = vec![(
///     Credentials::new(Default::default(), "scanner", "secret"),
///     SimulatedApiClient::boxed(),
/// )];
/// let sink = Arc::new(JsonLinesSink::create("scan.jsonl").await?);
///
/// let mut engine = ScanEngine::new(config, accounts, sink)?;
/// engine.start().await?;
/// let completed = engine.wait().await?;
/// println!("Completed {completed} iterations");
/// # Ok(())
/// # }
/// ```
pub struct ScanEngine {
    state: Arc<RwLock<EngineState>>,
    context: Arc<ScanContext>,
    shutdown_tx: broadcast::Sender<()>,
    overseer_handle: Option<JoinHandle<u64>>,
    worker_handles: Vec<JoinHandle<()>>,
}

impl ScanEngine {
    /// Create an engine from configuration, accounts and a persistence hook
    ///
    /// # Arguments
    ///
    /// * `config` - Scan settings
    /// * `accounts` - Credentials paired with a base client, one per account
    /// * `sink` - Receives every successful map response
    pub fn new(
        config: ScanConfig,
        accounts: Vec<(Credentials, Box<dyn GameApiClient>)>,
        sink: Arc<dyn ScanSink>,
    ) -> Result<Self> {
        let login_policy = RetryPolicy::from_config(&config.login_retry, config.login_delay());
        let sessions = SessionPool::new(accounts, config.session_refresh_threshold(), login_policy)
            .context("Failed to create session pool")?;

        Ok(Self::from_context(Arc::new(ScanContext::new(config, sessions, sink))))
    }

    pub fn from_context(context: Arc<ScanContext>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            state: Arc::new(RwLock::new(EngineState::Stopped)),
            context,
            shutdown_tx,
            overseer_handle: None,
            worker_handles: Vec::new(),
        }
    }

    pub fn context(&self) -> &Arc<ScanContext> {
        &self.context
    }

    /// Spawn the worker pool and the overseer
    pub async fn start(&mut self) -> Result<()> {
        let mut state = self.state.write().await;
        if *state != EngineState::Stopped {
            return Ok(());
        }
        *state = EngineState::Starting;
        drop(state);

        let workers = self.context.config.workers;
        info!(
            workers,
            origin = %self.context.origin(),
            step_limit = self.context.config.step_limit,
            "Starting scan engine"
        );

        for id in 0..workers {
            let worker = Worker::new(id, Arc::clone(&self.context));
            self.worker_handles
                .push(tokio::spawn(worker.run(self.shutdown_tx.subscribe())));
        }

        let overseer = Overseer::new(Arc::clone(&self.context));
        let shutdown_rx = self.shutdown_tx.subscribe();
        self.overseer_handle = Some(tokio::spawn(async move { overseer.run(shutdown_rx).await }));

        *self.state.write().await = EngineState::Running;
        info!("Scan engine started");
        Ok(())
    }

    /// Wait for the overseer to finish, then stop the workers
    ///
    /// Only returns on its own when `max_iterations` is configured.
    pub async fn wait(&mut self) -> Result<u64> {
        let Some(handle) = self.overseer_handle.take() else {
            bail!("Scan engine is not running");
        };
        let completed = handle.await.context("Overseer task panicked")?;
        self.shutdown_workers().await;
        *self.state.write().await = EngineState::Stopped;
        info!(completed, "Scan engine finished");
        Ok(completed)
    }

    /// Signal shutdown and wait for the overseer and workers
    ///
    /// Tasks still queued are left unprocessed.
    pub async fn stop(&mut self) -> Result<()> {
        let mut state = self.state.write().await;
        if *state == EngineState::Stopped {
            return Ok(());
        }
        *state = EngineState::Stopping;
        drop(state);

        info!("Stopping scan engine");
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.overseer_handle.take() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(completed)) => info!(completed, "Overseer stopped cleanly"),
                Ok(Err(e)) => warn!(error = ?e, "Overseer panicked"),
                Err(_) => warn!("Overseer shutdown timeout"),
            }
        }
        self.shutdown_workers().await;

        *self.state.write().await = EngineState::Stopped;
        info!("Scan engine stopped");
        Ok(())
    }

    async fn shutdown_workers(&mut self) {
        let _ = self.shutdown_tx.send(());
        for handle in self.worker_handles.drain(..) {
            let abort = handle.abort_handle();
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_cancelled() => {}
                Ok(Err(e)) => warn!(error = ?e, "Search worker panicked"),
                Err(_) => {
                    warn!("Search worker shutdown timeout, aborting");
                    abort.abort();
                }
            }
        }
    }

    /// Ask the overseer to move the scan to `origin`
    ///
    /// Queued tasks of the current iteration are dropped; the next
    /// iteration is generated around the new origin.
    pub fn relocate(&self, origin: Coordinate) {
        info!(%origin, "Relocation requested");
        self.context.relocation.request(origin);
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }

    pub fn stats(&self) -> ScanStatsSnapshot {
        self.context.stats()
    }

    pub async fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.state().await,
            workers: self.worker_handles.len(),
            origin: self.context.origin(),
            relocation_pending: self.context.relocation.is_pending(),
            relocation_target: self.context.relocation.peek(),
            queued: self.context.queue.pending_count(),
            stats: self.stats(),
        }
    }
}

impl Drop for ScanEngine {
    fn drop(&mut self) {
        if let Some(handle) = &self.overseer_handle {
            handle.abort();
        }
        for handle in &self.worker_handles {
            handle.abort();
        }
    }
}
