pub mod config;
pub mod error;
pub mod media_type;
pub mod types;

pub use error::{SafeshareError, SafeshareResult};
