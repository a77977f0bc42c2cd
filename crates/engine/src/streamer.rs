// SPDX-License-Identifier: MIT

//! The log streamer: chunks raw job output and ships it to the coordinator
//! off a small pool of upload workers so a slow/retrying upload never
//! back-pressures the process pump.

use ja_core::{JobId, LogChunk};
use ja_wire::Coordinator;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Upload workers competing for chunks off one channel.
const UPLOAD_WORKERS: usize = 3;

/// Accepts whole chunks (already sized by the caller against
/// `Job.chunks_max_size_bytes`) and fans them out to [`UPLOAD_WORKERS`]
/// concurrent uploaders. Chunks for the same job are pushed to the channel
/// in offset order and uploaded independently, so the coordinator sees them
/// arrive out of order; it reassembles by `offset`, not arrival order.
pub struct LogStreamer {
    tx: mpsc::Sender<LogChunk>,
    workers: Vec<JoinHandle<()>>,
    failed_chunks: Arc<AtomicU32>,
}

impl LogStreamer {
    /// Spawns the upload worker pool. `queue_capacity` bounds how many
    /// chunks can be buffered ahead of the uploaders before `push` blocks.
    pub fn start<C>(coordinator: Arc<C>, job_id: JobId, queue_capacity: usize) -> Self
    where
        C: Coordinator,
    {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let failed_chunks = Arc::new(AtomicU32::new(0));

        let workers = (0..UPLOAD_WORKERS)
            .map(|worker_index| {
                let rx = rx.clone();
                let coordinator = coordinator.clone();
                let failed_chunks = failed_chunks.clone();
                tokio::spawn(async move {
                    loop {
                        let chunk = {
                            let mut rx = rx.lock().await;
                            rx.recv().await
                        };
                        let Some(chunk) = chunk else { break };
                        if let Err(err) = coordinator.upload_chunk(&job_id, &chunk).await {
                            tracing::warn!(
                                worker = worker_index,
                                offset = chunk.offset,
                                error = %err,
                                "chunk upload failed permanently"
                            );
                            failed_chunks.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
            })
            .collect();

        Self { tx, workers, failed_chunks }
    }

    /// Queue a chunk for upload. Backpressures (awaits) once
    /// `queue_capacity` chunks are already buffered.
    pub async fn push(&self, chunk: LogChunk) -> Result<(), mpsc::error::SendError<LogChunk>> {
        self.tx.send(chunk).await
    }

    /// Closes the input side and waits for every in-flight/queued chunk to
    /// finish uploading.
    pub async fn stop(self) {
        drop(self.tx);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    /// Count of chunks that exhausted `ja-wire`'s forever-retry policy via a
    /// permanent (non-retryable) coordinator error.
    pub fn failed_chunks(&self) -> u32 {
        self.failed_chunks.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[path = "streamer_tests.rs"]
mod tests;
