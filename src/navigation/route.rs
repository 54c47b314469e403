use crate::album::{AlbumSource, PhotoId};

/// Query string that identifies an album source; carried on every link so the
/// photo view can resolve high-res images for whatever photo it lands on.
pub fn source_query(source: &AlbumSource) -> String {
    match source {
        AlbumSource::ShareCode(code) => format!("publink_code={}", urlencoding::encode(code)),
        AlbumSource::Folder(folder_id) => format!("folder={}", folder_id),
    }
}

pub fn album_path(source: &AlbumSource) -> String {
    format!("/app?{}", source_query(source))
}

pub fn photo_path(source: &AlbumSource, photo_id: PhotoId) -> String {
    format!("/app/photo/{}?{}", photo_id, source_query(source))
}

/// Leaving an album goes back to the landing page with the source attached,
/// which ends that album's session.
pub fn home_path(source: &AlbumSource) -> String {
    format!("/?{}", source_query(source))
}
