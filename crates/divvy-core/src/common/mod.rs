pub mod error;
pub mod types;
pub mod wire;

pub use error::{Error, Result};
pub use types::WorkInterval;
