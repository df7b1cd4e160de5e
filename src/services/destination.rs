//! Picks the printer a payload goes to.
//!
//! Strategies are tried in order until one yields a destination:
//! explicit configuration, then the first serial candidate that exists,
//! then the system default print queue.

use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;

use crate::models::{Destination, DestinationConfig};

#[derive(Debug, Error)]
pub enum DestinationError {
    #[error("no printer found (checked {0})")]
    NoPrinter(String),
}

pub struct DestinationResolver {
    config: DestinationConfig,
}

impl DestinationResolver {
    pub fn new(config: DestinationConfig) -> Self {
        Self { config }
    }

    /// Resolve the destination for one print job
    pub async fn resolve(&self) -> Result<Destination, DestinationError> {
        if let Some(destination) = self.explicit() {
            return Ok(destination);
        }

        if let Some(path) = self.probe_serial().await {
            tracing::debug!(path = %path.display(), "Using detected serial device");
            return Ok(Destination::Serial(path));
        }

        if self.config.detect_queue {
            if let Some(queue) = default_queue().await {
                tracing::debug!(queue = %queue, "Using system default print queue");
                return Ok(Destination::Queue(queue));
            }
        }

        Err(DestinationError::NoPrinter(self.describe_checked()))
    }

    fn explicit(&self) -> Option<Destination> {
        if let Some(ref path) = self.config.serial {
            return Some(Destination::Serial(path.clone()));
        }
        self.config.queue.clone().map(Destination::Queue)
    }

    async fn probe_serial(&self) -> Option<PathBuf> {
        for candidate in &self.config.serial_candidates {
            if tokio::fs::try_exists(candidate).await.unwrap_or(false) {
                return Some(candidate.clone());
            }
        }
        None
    }

    fn describe_checked(&self) -> String {
        let mut checked: Vec<String> = self
            .config
            .serial_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        if self.config.detect_queue {
            checked.push("default print queue".to_string());
        }
        if checked.is_empty() {
            "nothing configured".to_string()
        } else {
            checked.join(", ")
        }
    }
}

/// Ask CUPS for the system default destination
async fn default_queue() -> Option<String> {
    let output = match Command::new("lpstat").arg("-d").output().await {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!(%e, "lpstat unavailable");
            return None;
        }
    };
    if !output.status.success() {
        return None;
    }
    parse_lpstat_default(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `lpstat -d` output (`system default destination: NAME`)
pub fn parse_lpstat_default(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (label, name) = line.split_once(':')?;
        if !label.trim().eq_ignore_ascii_case("system default destination") {
            return None;
        }
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}
