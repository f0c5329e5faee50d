// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Generic buffer-and-flush delivery engine.
//!
//! A `BatchTransport` accepts records from arbitrary caller contexts
//! without ever suspending them, accumulates them in a bounded FIFO
//! queue, and delivers them in batches through a circuit breaker to an
//! inner [`BatchSender`]. Flushes are triggered by queue size, by a
//! periodic timer, or explicitly.
//!
//! Delivery is best-effort: a batch that exhausts its retry budget, or
//! arrives while the breaker is open, is dropped with a diagnostic on the
//! operator log channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::transport::circuit_breaker::CircuitBreaker;
use crate::transport::BatchSender;

/// Buffering, retrying front end for one telemetry kind.
///
/// Each instance owns its queue, flush timer, and circuit breaker; the
/// client runs two (logs and spans) that share nothing but configuration
/// values. Construction spawns the periodic flush task, so it must happen
/// inside a Tokio runtime.
pub struct BatchTransport<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    cancel: CancellationToken,
}

struct Shared<T> {
    /// Uppercase pipeline label used in diagnostics, e.g. `LOGS`.
    label: &'static str,
    queue: Mutex<VecDeque<T>>,
    /// Wakes the flush task for size-triggered flushes.
    wake: Notify,
    /// Serializes sends: at most one batch is in flight per transport.
    send_lock: tokio::sync::Mutex<()>,
    breaker: CircuitBreaker,
    sender: Arc<dyn BatchSender<T>>,
    batch_size: usize,
    max_buffer_size: usize,
    max_retries: u32,
    retry_delay: Duration,
    debug: bool,
}

impl<T: Send + 'static> BatchTransport<T> {
    /// Wires the transport and spawns its flush loop.
    pub fn new(
        label: &'static str,
        sender: Arc<dyn BatchSender<T>>,
        config: &Config,
    ) -> BatchTransport<T> {
        let shared = Arc::new(Shared {
            label,
            queue: Mutex::new(VecDeque::new()),
            wake: Notify::new(),
            send_lock: tokio::sync::Mutex::new(()),
            breaker: CircuitBreaker::new(
                config.circuit_breaker_threshold,
                config.circuit_breaker_reset,
            ),
            sender,
            batch_size: config.batch_size.max(1),
            max_buffer_size: config.max_buffer_size.max(1),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            debug: config.debug,
        });
        let cancel = CancellationToken::new();

        let task_shared = Arc::clone(&shared);
        let task_cancel = cancel.clone();
        let flush_interval = config.flush_interval;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => break,
                    () = task_shared.wake.notified() => {}
                    () = tokio::time::sleep(flush_interval) => {}
                }
                task_shared.drain().await;
            }
        });

        BatchTransport { shared, cancel }
    }

    /// Appends records to the queue; never blocks the caller.
    ///
    /// Past `max_buffer_size` the oldest queued records are evicted so
    /// the most recent telemetry survives producer overrun. Reaching
    /// `batch_size` wakes the flush task (fire-and-forget).
    pub fn enqueue(&self, items: impl IntoIterator<Item = T>) {
        let shared = &self.shared;
        let mut evicted = 0usize;
        let should_flush = {
            let mut queue = shared.queue.lock().expect("batch queue poisoned");
            for item in items {
                if queue.len() >= shared.max_buffer_size {
                    queue.pop_front();
                    evicted += 1;
                }
                queue.push_back(item);
            }
            queue.len() >= shared.batch_size
        };

        if evicted > 0 {
            debug!(
                "{} | Buffer full ({} records), dropped {} oldest",
                shared.label, shared.max_buffer_size, evicted
            );
        }
        if should_flush {
            shared.wake.notify_one();
        }
    }

    /// Drains the queue, waiting out any in-flight send first. Resolves
    /// even when every send failed; delivery errors never propagate.
    pub async fn flush(&self) {
        self.shared.drain().await;
    }

    /// Cancels the periodic flush task and abandons queued records.
    pub fn destroy(&self) {
        self.cancel.cancel();
    }

    /// Breaker state, exposed for tests and diagnostics.
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.shared.breaker
    }

    /// Current queue length.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.shared.queue.lock().expect("batch queue poisoned").len()
    }
}

impl<T: Send + 'static> Drop for BatchTransport<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<T: Send + 'static> Shared<T> {
    /// Takes the queue contents batch by batch and delivers them. The
    /// send lock serializes this against every other flush path; records
    /// enqueued while a send is in flight form the next batch.
    async fn drain(&self) {
        let _guard = self.send_lock.lock().await;
        loop {
            let batch: Vec<T> = {
                let mut queue = self.queue.lock().expect("batch queue poisoned");
                queue.drain(..).collect()
            };
            if batch.is_empty() {
                return;
            }
            self.deliver(batch).await;
        }
    }

    /// Delivers one batch through the breaker with exponential-backoff
    /// retries. The breaker counter moves at most once per flush attempt:
    /// terminal failure records one failure, success records one success.
    async fn deliver(&self, batch: Vec<T>) {
        let size = batch.len();

        if self.breaker.preflight().is_err() {
            self.give_up(size, "circuit breaker open");
            return;
        }

        let mut attempt: u32 = 0;
        loop {
            match self.sender.send_batch(&batch).await {
                Ok(()) => {
                    self.breaker.record_success();
                    debug!("{} | Flushed {} records", self.label, size);
                    return;
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        self.breaker.record_failure();
                        self.give_up(size, &format!("{} attempts failed: {e}", attempt + 1));
                        return;
                    }
                    let delay = self.retry_delay.saturating_mul(2u32.saturating_pow(attempt));
                    debug!(
                        "{} | Send attempt {} failed: {e}, retrying in {:?}",
                        self.label,
                        attempt + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn give_up(&self, size: usize, reason: &str) {
        if self.debug {
            warn!("{} | Dropping batch of {} records: {}", self.label, size, reason);
        } else {
            debug!("{} | Dropping batch of {} records: {}", self.label, size, reason);
        }
    }
}
