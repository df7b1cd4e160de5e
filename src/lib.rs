//! labelpress - print images on TSPL label printers
//!
//! Accepts image uploads over HTTP, converts them to monochrome labels and
//! sends them to a serial device or print queue.
//! This library exposes modules for integration testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
