// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bounded worker pool.
//!
//! Each per-node operation runs on one OS thread from lock acquisition to
//! release. Dispatch is a non-blocking try-acquire: when every worker is
//! busy and the queue is full, the caller gets `NoFreeConductorWorker`
//! instead of queuing indefinitely, and its spawn-failure handler restores
//! the node's pre-attempt fields.

use bmc_core::ConductorError;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `workers` threads over a queue of `queue_depth` pending jobs.
    /// A depth of zero admits work only when a worker is waiting for it.
    pub fn new(workers: usize, queue_depth: usize) -> Result<Self, ConductorError> {
        let (tx, rx) = bounded::<Job>(queue_depth);
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let rx = rx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("conductor-worker-{index}"))
                .spawn(move || worker_loop(rx))
                .map_err(|e| {
                    ConductorError::Unexpected(format!("could not start worker thread: {e}"))
                })?;
            handles.push(handle);
        }
        Ok(Self { tx: Some(tx), workers: handles })
    }

    /// Dispatch `job` without blocking.
    pub fn try_spawn<F>(&self, job: F) -> Result<(), ConductorError>
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(tx) = &self.tx else {
            return Err(ConductorError::NoFreeConductorWorker);
        };
        tx.try_send(Box::new(job)).map_err(|_| ConductorError::NoFreeConductorWorker)
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel drains the queue and stops the workers.
        self.tx = None;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("conductor worker thread terminated abnormally");
            }
        }
    }
}

fn worker_loop(rx: Receiver<Job>) {
    while let Ok(job) = rx.recv() {
        job();
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
