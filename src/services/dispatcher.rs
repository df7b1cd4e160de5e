use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Mutex;
use tspl_raster::PrintPayload;

use crate::models::Destination;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to write to {}: {source}", path.display())]
    Device {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("print queue {queue} rejected the job: {reason}")]
    QueueRejected { queue: String, reason: String },

    #[error("{target} did not accept the job within {secs}s")]
    Timeout { target: String, secs: u64 },
}

/// Sends finished payloads to a printer
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(
        &self,
        destination: &Destination,
        payload: &PrintPayload,
    ) -> Result<(), DispatchError>;
}

/// Writes to serial devices directly and submits to queues with `lp -o raw`
///
/// Jobs for the same destination are serialized so two uploads never
/// interleave on one device.
pub struct SystemDispatcher {
    timeout: Duration,
    locks: Mutex<HashMap<Destination, Arc<Mutex<()>>>>,
}

impl SystemDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, destination: &Destination) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(destination.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn send(&self, destination: &Destination, bytes: &[u8]) -> Result<(), DispatchError> {
        match destination {
            Destination::Serial(path) => write_device(path, bytes).await,
            Destination::Queue(queue) => submit_to_queue(queue, bytes).await,
        }
    }
}

#[async_trait]
impl Dispatcher for SystemDispatcher {
    async fn dispatch(
        &self,
        destination: &Destination,
        payload: &PrintPayload,
    ) -> Result<(), DispatchError> {
        let lock = self.lock_for(destination).await;
        let _guard = lock.lock().await;

        tracing::debug!(
            destination = %destination,
            bytes = payload.len(),
            "Dispatching payload"
        );

        tokio::time::timeout(self.timeout, self.send(destination, payload.as_bytes()))
            .await
            .map_err(|_| DispatchError::Timeout {
                target: destination.to_string(),
                secs: self.timeout.as_secs(),
            })?
    }
}

async fn write_device(path: &Path, bytes: &[u8]) -> Result<(), DispatchError> {
    let device_error = |source: std::io::Error| DispatchError::Device {
        path: path.to_path_buf(),
        source,
    };

    let mut device = tokio::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(device_error)?;
    device.write_all(bytes).await.map_err(device_error)?;
    device.flush().await.map_err(device_error)?;
    Ok(())
}

async fn submit_to_queue(queue: &str, bytes: &[u8]) -> Result<(), DispatchError> {
    let spawn_error = |source: std::io::Error| DispatchError::Spawn {
        program: "lp",
        source,
    };

    let mut child = Command::new("lp")
        .args(["-d", queue, "-o", "raw"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_error)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(bytes).await.map_err(spawn_error)?;
    }

    let output = child.wait_with_output().await.map_err(spawn_error)?;
    if !output.status.success() {
        return Err(DispatchError::QueueRejected {
            queue: queue.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    tracing::debug!(
        queue = %queue,
        response = %String::from_utf8_lossy(&output.stdout).trim(),
        "Queue accepted job"
    );
    Ok(())
}
