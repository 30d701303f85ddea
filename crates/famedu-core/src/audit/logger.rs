use std::sync::Arc;
use std::time::Duration;

use famedu_shared::config::AuditSettings;
use flume::{bounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::domain::ActivityLog;
use crate::repositories::ActivityLogRepository;

/// Logger configuration
#[derive(Debug, Clone)]
pub struct AuditLoggerConfig {
    /// Queue capacity (max entries in memory before new ones are dropped)
    pub queue_capacity: usize,

    /// Batch size for repository inserts
    pub batch_size: usize,

    /// Max wait before flushing a partial batch (milliseconds)
    pub batch_timeout_ms: u64,

    /// Number of worker tasks draining the queue
    pub worker_count: usize,
}

impl Default for AuditLoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            batch_size: 100,
            batch_timeout_ms: 1000,
            worker_count: 2,
        }
    }
}

impl From<&AuditSettings> for AuditLoggerConfig {
    fn from(settings: &AuditSettings) -> Self {
        Self {
            queue_capacity: settings.queue_capacity.max(1),
            batch_size: settings.batch_size.max(1),
            batch_timeout_ms: settings.batch_timeout_ms,
            worker_count: settings.worker_count.max(1),
        }
    }
}

/// Fire-and-forget audit writer.
///
/// `log` never blocks and never fails the caller: a full queue or a failed
/// insert is reported through `tracing` and the entry is dropped.
#[derive(Clone)]
pub struct ActivityLogger {
    sender: Sender<ActivityLog>,
}

impl ActivityLogger {
    /// Spawns the workers on the current tokio runtime.
    pub fn new(repository: Arc<dyn ActivityLogRepository>, config: AuditLoggerConfig) -> Self {
        let (sender, receiver) = bounded(config.queue_capacity);

        info!(
            "Initializing ActivityLogger: queue={}, batch={}, timeout={}ms, workers={}",
            config.queue_capacity, config.batch_size, config.batch_timeout_ms, config.worker_count
        );

        for worker_id in 0..config.worker_count {
            let repository = repository.clone();
            let receiver = receiver.clone();
            let config = config.clone();

            tokio::spawn(async move {
                Self::worker_loop(worker_id, repository, receiver, config).await;
            });
        }

        Self { sender }
    }

    pub fn log(&self, entry: ActivityLog) {
        if let Err(e) = self.sender.try_send(entry) {
            warn!("Dropping audit entry (queue full or closed): {}", e);
        }
    }

    async fn worker_loop(
        worker_id: usize,
        repository: Arc<dyn ActivityLogRepository>,
        receiver: Receiver<ActivityLog>,
        config: AuditLoggerConfig,
    ) {
        debug!("Audit worker {} started", worker_id);

        let batch_timeout = Duration::from_millis(config.batch_timeout_ms);
        let mut batch: Vec<ActivityLog> = Vec::with_capacity(config.batch_size);

        // Wait for the first entry of a batch, then top it up until the batch
        // is full or the timeout passes.
        while let Ok(first) = receiver.recv_async().await {
            batch.push(first);
            let deadline = tokio::time::Instant::now() + batch_timeout;

            let mut closed = false;
            while batch.len() < config.batch_size {
                match tokio::time::timeout_at(deadline, receiver.recv_async()).await {
                    Ok(Ok(entry)) => batch.push(entry),
                    Ok(Err(_)) => {
                        closed = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            Self::flush_batch(repository.as_ref(), &batch, worker_id).await;
            batch.clear();

            if closed {
                break;
            }
        }

        debug!("Audit worker {} shutting down (channel closed)", worker_id);
    }

    async fn flush_batch(repository: &dyn ActivityLogRepository, batch: &[ActivityLog], worker_id: usize) {
        let start = std::time::Instant::now();

        match repository.append_batch(batch).await {
            Ok(inserted) => {
                debug!(
                    "Audit worker {} wrote {} entries in {:?}",
                    worker_id,
                    inserted,
                    start.elapsed()
                );
            }
            Err(e) => {
                error!(
                    "Audit worker {} failed to write {} entries: {}",
                    worker_id,
                    batch.len(),
                    e
                );
            }
        }
    }
}
