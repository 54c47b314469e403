use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const FALLBACK_WIDTH: u32 = 800;
pub const FALLBACK_HEIGHT: u32 = 600;

/// Remote file identifier; unique within an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub u64);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PhotoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(PhotoId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photo {
    pub id: PhotoId,
    pub preview_url: String,
    pub width: u32,
    pub height: u32,
    pub display_name: String,
}

impl Photo {
    /// Builds a photo, replacing absent or zero dimensions with 800x600.
    pub fn new(
        id: PhotoId,
        preview_url: String,
        width: Option<u32>,
        height: Option<u32>,
        display_name: String,
    ) -> Self {
        Self {
            id,
            preview_url,
            width: width.filter(|w| *w > 0).unwrap_or(FALLBACK_WIDTH),
            height: height.filter(|h| *h > 0).unwrap_or(FALLBACK_HEIGHT),
            display_name,
        }
    }
}

/// Where an album's listing comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AlbumSource {
    ShareCode(String),
    Folder(u64),
}

impl AlbumSource {
    pub fn share_code(&self) -> Option<&str> {
        match self {
            AlbumSource::ShareCode(code) => Some(code),
            AlbumSource::Folder(_) => None,
        }
    }

    pub fn default_name(&self) -> &'static str {
        match self {
            AlbumSource::ShareCode(_) => "Public Album",
            AlbumSource::Folder(_) => "My Album",
        }
    }
}

impl fmt::Display for AlbumSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlbumSource::ShareCode(code) => write!(f, "share code {}", code),
            AlbumSource::Folder(id) => write!(f, "folder {}", id),
        }
    }
}

/// An immutable, fully resolved album. Reloading produces a new snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumSnapshot {
    pub name: String,
    #[serde(skip)]
    pub source: AlbumSource,
    photos: Vec<Photo>,
}

impl AlbumSnapshot {
    pub fn new(name: String, source: AlbumSource, photos: Vec<Photo>) -> Self {
        Self {
            name,
            source,
            photos,
        }
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn share_code(&self) -> Option<&str> {
        self.source.share_code()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn position(&self, id: PhotoId) -> Option<usize> {
        self.photos.iter().position(|photo| photo.id == id)
    }

    pub fn get(&self, id: PhotoId) -> Option<&Photo> {
        self.position(id).map(|index| &self.photos[index])
    }
}
