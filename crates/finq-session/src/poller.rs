//! Job polling: the single repeating timer of the client.
//!
//! `JobPoller` owns at most one live polling loop at any instant. Starting a
//! poll unconditionally cancels the previous one, and every observation of a
//! tick's result is guarded by a generation check so a response that arrives
//! after cancellation or replacement mutates nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use finq_api::{ClientConfig, QueryApi};
use finq_core::{ChatMessage, JobProgress, JobStatusReport, SessionState, SessionStore, format_message};

/// How a job is observed: poll period and an optional cutoff after which
/// the client stops watching (the job itself is never cancelled
/// server-side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_duration: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_duration: None,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_duration: config.poll_timeout(),
        }
    }
}

/// Tracks the lifecycle of the one outstanding job poll.
pub struct JobPoller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    api: Arc<dyn QueryApi>,
    store: Arc<SessionStore>,
    policy: PollPolicy,
    next_generation: AtomicU64,
    active: Mutex<Option<ActivePoll>>,
}

struct ActivePoll {
    generation: u64,
    token: CancellationToken,
}

impl JobPoller {
    pub fn new(api: Arc<dyn QueryApi>, store: Arc<SessionStore>, policy: PollPolicy) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                api,
                store,
                policy,
                next_generation: AtomicU64::new(0),
                active: Mutex::new(None),
            }),
        }
    }

    /// Begins polling `job_id`, cancelling any previous poll first.
    pub async fn start(&self, job_id: String) {
        let mut active = self.inner.active.lock().await;
        if let Some(previous) = active.take() {
            previous.token.cancel();
            tracing::debug!(target: "poller", "previous poll cancelled before start");
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        *active = Some(ActivePoll {
            generation,
            token: token.clone(),
        });
        drop(active);

        tracing::info!(target: "poller", job_id = %job_id, "polling started");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run(job_id, generation, token).await });
    }

    /// Stops observing the current job, if any. Future ticks never fire; a
    /// tick already in flight is discarded by the generation guard.
    pub async fn cancel(&self) {
        let mut active = self.inner.active.lock().await;
        if let Some(previous) = active.take() {
            previous.token.cancel();
            tracing::debug!(target: "poller", "active poll cancelled");
        }
    }

    /// Whether a polling loop is currently live.
    pub async fn is_active(&self) -> bool {
        self.inner.active.lock().await.is_some()
    }
}

impl PollerInner {
    async fn run(self: Arc<Self>, job_id: String, generation: u64, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval yields immediately on its first tick; swallow it so the
        // first status check lands one period after submission
        ticker.tick().await;
        let deadline = self
            .policy
            .max_duration
            .map(|cutoff| tokio::time::Instant::now() + cutoff);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(target: "poller", job_id = %job_id, "poll loop exiting after cancel");
                    return;
                }
                _ = ticker.tick() => {}
            }

            if let Some(deadline) = deadline {
                if tokio::time::Instant::now() >= deadline {
                    tracing::warn!(target: "poller", job_id = %job_id, "polling cutoff reached, giving up on job");
                    self.abort(generation, format!("Gave up waiting for job {}", job_id))
                        .await;
                    return;
                }
            }

            match self.api.job_status(&job_id).await {
                Ok(report) if report.status.is_terminal() => {
                    if !self.is_current(generation).await {
                        return;
                    }
                    tracing::info!(
                        target: "poller",
                        job_id = %job_id,
                        status = %report.status,
                        "job reached terminal status"
                    );
                    self.finish(generation, report).await;
                    return;
                }
                Ok(report) => {
                    let progress = JobProgress::active(report.progress, report.stage);
                    if !self
                        .update_if_current(generation, move |s| s.set_progress(progress))
                        .await
                    {
                        return;
                    }
                }
                Err(err) => {
                    if !self.is_current(generation).await {
                        return;
                    }
                    tracing::warn!(
                        target: "poller",
                        job_id = %job_id,
                        error = %err,
                        "status poll failed, stopping observation"
                    );
                    self.abort(generation, err.to_string()).await;
                    return;
                }
            }
        }
    }

    /// Terminal refresh: resolve the conversation that is now authoritative
    /// (the pending anchor if one was set, else the selection), replace the
    /// message list with the server's canonical record, and refresh the
    /// conversation list when the anchor was consumed.
    async fn finish(&self, generation: u64, report: JobStatusReport) {
        let snapshot = self.store.snapshot().await;
        let anchored = snapshot.pending_anchor;
        let Some(conversation_id) = snapshot.resolve_target() else {
            // Nothing to resolve against (the draft was abandoned mid-job);
            // just drop the tracking state.
            if self.take_if_current(generation).await {
                self.store
                    .update(|s| {
                        s.set_pending_anchor(None);
                        s.set_sending(false);
                        s.reset_progress();
                    })
                    .await;
            }
            return;
        };

        let wire_messages = match self.api.fetch_messages(conversation_id).await {
            Ok(messages) => messages,
            Err(err) => {
                self.abort(generation, err.to_string()).await;
                return;
            }
        };

        let history = if anchored.is_some() {
            match self.api.fetch_history().await {
                Ok(list) => Some(list),
                Err(err) => {
                    // The resolved messages are still worth showing; the
                    // list refresh can be repeated by the user.
                    tracing::warn!(
                        target: "poller",
                        error = %err,
                        "history refresh after job completion failed"
                    );
                    None
                }
            }
        } else {
            None
        };

        if !self.take_if_current(generation).await {
            return;
        }

        let mut messages: Vec<ChatMessage> = wire_messages.iter().map(format_message).collect();
        if report.status.is_failure() && !messages.iter().any(ChatMessage::is_error) {
            let text = report
                .error
                .unwrap_or_else(|| format!("Query job ended with status {}", report.status));
            messages.push(ChatMessage::inline_error(text));
        }

        self.store
            .update(move |s| {
                s.select(Some(conversation_id));
                s.replace_messages(messages);
                if let Some(list) = history {
                    s.set_conversations(list);
                }
                s.set_pending_anchor(None);
                s.set_sending(false);
                s.reset_progress();
            })
            .await;
    }

    /// Transport-failure teardown: stop tracking, surface the error, clear
    /// the sending flag and progress. The job is left running server-side.
    async fn abort(&self, generation: u64, message: String) {
        if !self.take_if_current(generation).await {
            return;
        }
        self.store
            .update(move |s| {
                s.set_error(message);
                s.set_sending(false);
                s.reset_progress();
            })
            .await;
    }

    /// Applies a store update only while the active slot still belongs to
    /// `generation`, holding the slot lock across the update. Returns
    /// whether the update was applied. Checking and committing under one
    /// lock means a cancel or replacement can never slip in between them.
    async fn update_if_current<F>(&self, generation: u64, f: F) -> bool
    where
        F: FnOnce(&mut SessionState),
    {
        let active = self.active.lock().await;
        if !active
            .as_ref()
            .is_some_and(|poll| poll.generation == generation)
        {
            return false;
        }
        self.store.update(f).await;
        true
    }

    async fn is_current(&self, generation: u64) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|poll| poll.generation == generation)
    }

    /// Clears the active slot if it still belongs to `generation`. Returns
    /// whether it did; callers must not mutate state when it did not.
    async fn take_if_current(&self, generation: u64) -> bool {
        let mut active = self.active.lock().await;
        match active.as_ref() {
            Some(poll) if poll.generation == generation => {
                *active = None;
                true
            }
            _ => false,
        }
    }
}
