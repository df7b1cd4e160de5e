use std::fmt;
use std::path::PathBuf;

/// Where a finished payload is sent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Raw writes to a serial/USB character device
    Serial(PathBuf),
    /// Raw job submitted to a named print queue
    Queue(String),
}

impl Destination {
    /// Short transport name ("serial" or "queue")
    pub fn kind(&self) -> &'static str {
        match self {
            Destination::Serial(_) => "serial",
            Destination::Queue(_) => "queue",
        }
    }

    /// Device path or queue name
    pub fn target(&self) -> String {
        match self {
            Destination::Serial(path) => path.display().to_string(),
            Destination::Queue(name) => name.clone(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.target())
    }
}
