// Album module - listing resolution, photo records and high-res promotion
mod error;
mod highres;
mod resolver;
mod types;

pub use error::{AlbumError, HighResError};
pub use highres::HighResCache;
pub use resolver::AlbumResolver;
pub use types::*;
