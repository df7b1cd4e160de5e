use crate::assets::AssetLoader;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tspl_raster::LabelProfile;

/// Application configuration loaded from config.yaml
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Physical printer characteristics
    #[serde(default)]
    pub printer: PrinterConfig,

    /// Where payloads are sent
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Device write settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// External image conversion tool settings
    #[serde(default)]
    pub converter: ConverterConfig,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Fixed device constants (never changed per request)
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Print resolution in dots per inch
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Print-head width in dots
    #[serde(default = "default_max_width_dots")]
    pub max_width_dots: u32,

    /// Gap between labels in millimeters
    #[serde(default = "default_gap_mm")]
    pub gap_mm: u32,
}

fn default_dpi() -> u32 {
    LabelProfile::DEFAULT.dpi
}

fn default_max_width_dots() -> u32 {
    LabelProfile::DEFAULT.max_width_dots
}

fn default_gap_mm() -> u32 {
    LabelProfile::DEFAULT.gap_mm
}

impl PrinterConfig {
    pub fn profile(&self) -> LabelProfile {
        LabelProfile {
            dpi: self.dpi,
            max_width_dots: self.max_width_dots,
            gap_mm: self.gap_mm,
        }
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            max_width_dots: default_max_width_dots(),
            gap_mm: default_gap_mm(),
        }
    }
}

/// Destination selection. Explicit values win over auto-detection.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DestinationConfig {
    /// Explicit serial/USB device path
    #[serde(default)]
    pub serial: Option<PathBuf>,

    /// Explicit print queue name
    #[serde(default)]
    pub queue: Option<String>,

    /// Device paths probed in order when nothing is configured
    #[serde(default = "default_serial_candidates")]
    pub serial_candidates: Vec<PathBuf>,

    /// Fall back to the system default print queue (`lpstat -d`)
    #[serde(default = "default_true")]
    pub detect_queue: bool,
}

fn default_serial_candidates() -> Vec<PathBuf> {
    ["/dev/usb/lp0", "/dev/ttyUSB0", "/dev/ttyACM0"]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}

fn default_true() -> bool {
    true
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            serial: None,
            queue: None,
            serial_candidates: default_serial_candidates(),
            detect_queue: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Upper bound on a single device write or queue submission
    #[serde(default = "default_dispatch_timeout")]
    pub timeout_secs: u64,
}

fn default_dispatch_timeout() -> u64 {
    10
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_dispatch_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Programs tried in order to convert non-bitmap uploads
    #[serde(default = "default_programs")]
    pub programs: Vec<String>,

    #[serde(default = "default_converter_timeout")]
    pub timeout_secs: u64,
}

fn default_programs() -> Vec<String> {
    vec!["magick".to_string(), "convert".to_string()]
}

fn default_converter_timeout() -> u64 {
    30
}

impl ConverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            programs: default_programs(),
            timeout_secs: default_converter_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from AssetLoader (embedded or external)
    pub fn load_from_assets(loader: &AssetLoader) -> Self {
        match loader.read_config_string() {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    let config: Self = config;
                    tracing::info!(
                        dpi = config.printer.dpi,
                        max_width_dots = config.printer.max_width_dots,
                        "Loaded configuration"
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(%e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Apply `PRINTER_DEVICE` / `PRINTER_QUEUE` style overrides.
    ///
    /// An override replaces both explicit settings so that a device override
    /// is not shadowed by a queue from the file (or vice versa).
    pub fn with_destination_override(
        mut self,
        device: Option<String>,
        queue: Option<String>,
    ) -> Self {
        let device = device.filter(|d| !d.trim().is_empty());
        let queue = queue.filter(|q| !q.trim().is_empty());

        if device.is_some() || queue.is_some() {
            tracing::info!(?device, ?queue, "Destination overridden from environment");
            self.destination.serial = device.map(PathBuf::from);
            self.destination.queue = queue;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            printer: PrinterConfig::default(),
            destination: DestinationConfig::default(),
            dispatch: DispatchConfig::default(),
            converter: ConverterConfig::default(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}
