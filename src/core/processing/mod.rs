pub mod colorize;
pub mod finish;

pub use colorize::{Colorizer, OutputRaster};
pub use finish::OutputFinisher;
