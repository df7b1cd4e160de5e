pub mod config;
pub mod destination;

pub use config::{AppConfig, ConverterConfig, DestinationConfig, DispatchConfig, PrinterConfig};
pub use destination::Destination;
