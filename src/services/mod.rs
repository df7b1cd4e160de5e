pub mod converter;
pub mod destination;
pub mod dispatcher;
pub mod label_pipeline;

pub use converter::{ConvertError, ImageConverter};
pub use destination::{parse_lpstat_default, DestinationError, DestinationResolver};
pub use dispatcher::{DispatchError, Dispatcher, SystemDispatcher};
pub use label_pipeline::{LabelPipeline, RenderedLabel};
