//! Long-lived async worker.
//!
//! Requests travel over an mpsc channel to a tokio task that runs each job on
//! the blocking pool and answers through a oneshot channel. Jobs run
//! concurrently; the caller never shares memory with the solver.

use crate::api::{encode, handle_request_with_cache};
use crate::types::{Request, Response};
use panelcut_cabinet::ResultCache;
use panelcut_core::{Error, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

/// Worker settings.
#[derive(Clone)]
pub struct WorkerOptions {
    /// Pending requests accepted before `submit` waits.
    pub queue_depth: usize,
    /// Cache shared by every optimize job.
    pub cache: Option<Arc<dyn ResultCache>>,
}

impl WorkerOptions {
    pub const DEFAULT_QUEUE_DEPTH: usize = 32;

    pub fn new() -> Self {
        Self {
            queue_depth: Self::DEFAULT_QUEUE_DEPTH,
            cache: None,
        }
    }

    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self::new()
    }
}

struct Job {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Handle to a running worker task.
pub struct WorkerHandle {
    tx: mpsc::Sender<Job>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(options: WorkerOptions) -> Self {
        let (tx, rx) = mpsc::channel(options.queue_depth.max(1));
        let task = tokio::spawn(run_loop(rx, options.cache));
        Self { tx, task }
    }

    /// Submits a request and waits for its response.
    pub async fn submit(&self, request: Request) -> Result<Response> {
        let (reply, reply_rx) = oneshot::channel();
        self.tx
            .send(Job { request, reply })
            .await
            .map_err(|_| Error::Internal("worker has shut down".to_string()))?;
        reply_rx
            .await
            .map_err(|_| Error::Internal("worker dropped the request".to_string()))
    }

    /// Submits a raw JSON request and returns the JSON response.
    pub async fn submit_json(&self, json_str: &str) -> String {
        let response = match serde_json::from_str::<Request>(json_str) {
            Ok(request) => match self.submit(request).await {
                Ok(response) => response,
                Err(err) => Response::failure(err.to_string()),
            },
            Err(e) => Response::failure(format!("Invalid JSON: {}", e)),
        };
        encode(&response)
    }

    /// Stops accepting requests and waits for in-flight jobs to finish.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.tx);
        self.task
            .await
            .map_err(|e| Error::Internal(format!("worker task failed: {}", e)))
    }
}

async fn run_loop(mut rx: mpsc::Receiver<Job>, cache: Option<Arc<dyn ResultCache>>) {
    let mut jobs = JoinSet::new();
    loop {
        tokio::select! {
            job = rx.recv() => match job {
                Some(job) => {
                    jobs.spawn(run_job(job, cache.clone()));
                }
                None => break,
            },
            Some(_) = jobs.join_next(), if !jobs.is_empty() => {}
        }
    }
    while jobs.join_next().await.is_some() {}
    log::debug!("worker stopped");
}

async fn run_job(job: Job, cache: Option<Arc<dyn ResultCache>>) {
    let Job { request, reply } = job;
    let op = request.op();
    let response =
        match tokio::task::spawn_blocking(move || handle_request_with_cache(request, cache)).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("{} job panicked: {}", op, e);
                Response::failure(format!("{} job failed: {}", op, e))
            }
        };
    if reply.send(response).is_err() {
        log::debug!("{} reply dropped, caller went away", op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PartRequest;
    use panelcut_core::Sheet;

    fn pack_request(seed: u32) -> Request {
        Request::Pack {
            parts: vec![PartRequest {
                id: "A".into(),
                width: 400.0,
                height: 600.0,
                quantity: 4,
                rotate_allowed: true,
            }],
            sheet: Sheet::standard_1210(),
            config: panelcut_core::Config::new()
                .with_seed(seed)
                .with_max_iterations(10),
        }
    }

    #[tokio::test]
    async fn test_submit_and_shutdown() {
        let worker = WorkerHandle::spawn(WorkerOptions::new());
        let response = worker.submit(pack_request(1)).await.unwrap();
        assert!(response.ok);
        assert_eq!(response.run().unwrap().placed_count(), 4);
        worker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_jobs() {
        let worker = WorkerHandle::spawn(WorkerOptions::new().with_queue_depth(2));
        let (a, b, c) = tokio::join!(
            worker.submit(pack_request(1)),
            worker.submit(pack_request(2)),
            worker.submit(pack_request(3)),
        );
        for response in [a, b, c] {
            assert!(response.unwrap().ok);
        }
        worker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_json_reports_parse_errors() {
        let worker = WorkerHandle::spawn(WorkerOptions::new());
        let reply: serde_json::Value =
            serde_json::from_str(&worker.submit_json("[1, 2").await).unwrap();
        assert_eq!(reply["ok"], serde_json::json!(false));
        worker.shutdown().await.unwrap();
    }
}
