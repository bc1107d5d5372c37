mod aggregation;
pub mod bits;
pub mod clock;
mod error;
mod options;
mod slot;
mod track;
mod window;

pub use crate::aggregation::Aggregation;
pub use crate::error::WindowError;
pub use crate::options::WindowOptions;
pub use crate::slot::{Aggregate, Mode, Samples, Slot};
pub use crate::track::Track;
pub use crate::window::{AggregateWindow, SampleWindow, Window};
