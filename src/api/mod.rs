pub mod headers;
pub mod print;
pub mod printer;
pub mod ui;

pub use print::{__path_handle_print, __path_handle_render};
pub use print::{handle_print, handle_render};
pub use printer::{
    handle_printer, DestinationInfo, PrinterResponse, ProfileInfo, __path_handle_printer,
};
pub use ui::handle_index;
