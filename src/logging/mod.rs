mod astra_layer;
mod event_span;
mod events;
mod http;
mod log_event;

pub use astra_layer::AstraLogsLayer;
use event_span::*;
pub use events::*;
pub use http::*;
pub use log_event::*;
