use crate::pcloud::PcloudError;
use thiserror::Error;

use super::PhotoId;

#[derive(Debug, Error)]
pub enum AlbumError {
    #[error("Invalid or expired link: {0}")]
    InvalidLink(String),

    #[error("{0}")]
    Remote(#[from] PcloudError),
}

#[derive(Debug, Error)]
pub enum HighResError {
    #[error("High-resolution resolution failed for photo {photo_id}: {source}")]
    Resolution {
        photo_id: PhotoId,
        #[source]
        source: PcloudError,
    },

    #[error("High-resolution resolution failed for photo {0}: response carried no link")]
    MissingLink(PhotoId),
}
