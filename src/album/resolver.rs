use super::{AlbumError, AlbumSnapshot, AlbumSource, Photo, PhotoId};
use crate::pcloud::{ListingEntry, ListingResult, PcloudError, SharedClient, ThumbnailSpec};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Turns a share code (or folder id) into a published [`AlbumSnapshot`] using
/// exactly one listing call and at most one batch preview call.
#[derive(Clone)]
pub struct AlbumResolver {
    client: SharedClient,
    thumbnails: ThumbnailSpec,
}

impl AlbumResolver {
    pub fn new(client: SharedClient, thumbnails: ThumbnailSpec) -> Self {
        Self { client, thumbnails }
    }

    pub async fn resolve_album(&self, share_code: &str) -> Result<AlbumSnapshot, AlbumError> {
        self.resolve(&AlbumSource::ShareCode(share_code.to_string()))
            .await
    }

    pub async fn resolve_folder(&self, folder_id: u64) -> Result<AlbumSnapshot, AlbumError> {
        self.resolve(&AlbumSource::Folder(folder_id)).await
    }

    pub async fn resolve(&self, source: &AlbumSource) -> Result<AlbumSnapshot, AlbumError> {
        let listing = match source {
            AlbumSource::ShareCode(code) => self.client.show_publink(code).await,
            AlbumSource::Folder(folder_id) => self.client.list_folder(*folder_id).await,
        }
        .map_err(listing_error)?;

        let (name, entries) = split_listing(listing)?;
        let images: Vec<ListingEntry> = entries.into_iter().filter(|e| e.is_image()).collect();

        debug!("{} has {} image entries", source, images.len());

        let photos = if images.is_empty() {
            Vec::new()
        } else {
            self.attach_previews(source, images).await
        };

        info!("Loaded {} with {} photos", source, photos.len());

        Ok(AlbumSnapshot::new(
            name.unwrap_or_else(|| source.default_name().to_string()),
            source.clone(),
            photos,
        ))
    }

    async fn attach_previews(&self, source: &AlbumSource, images: Vec<ListingEntry>) -> Vec<Photo> {
        let ids: Vec<u64> = images.iter().filter_map(|e| e.fileid).collect();

        let batch = match source {
            AlbumSource::ShareCode(code) => {
                self.client
                    .pub_thumbs_links(code, &ids, &self.thumbnails)
                    .await
            }
            AlbumSource::Folder(_) => self.client.thumbs_links(&ids, &self.thumbnails).await,
        };

        let thumbs = match batch {
            Ok(batch) => batch.thumbs,
            Err(e) => {
                warn!("Batch preview resolution failed for {}: {}", source, e);
                return Vec::new();
            }
        };

        let previews: HashMap<u64, String> = thumbs
            .iter()
            .filter_map(|thumb| thumb.url().map(|url| (thumb.fileid, url)))
            .collect();

        let total = images.len();
        let photos: Vec<Photo> = images
            .into_iter()
            .filter_map(|entry| {
                let id = entry.fileid?;
                let preview_url = previews.get(&id)?.clone();
                Some(Photo::new(
                    PhotoId(id),
                    preview_url,
                    entry.width,
                    entry.height,
                    entry.name,
                ))
            })
            .collect();

        if photos.len() < total {
            debug!(
                "Dropped {} images without a preview from {}",
                total - photos.len(),
                source
            );
        }

        photos
    }
}

fn listing_error(err: PcloudError) -> AlbumError {
    match err {
        PcloudError::Api(failure) => AlbumError::InvalidLink(failure.message),
        PcloudError::MalformedResponse(reason) => AlbumError::InvalidLink(reason),
        other => AlbumError::Remote(other),
    }
}

fn split_listing(listing: ListingResult) -> Result<(Option<String>, Vec<ListingEntry>), AlbumError> {
    let metadata = listing
        .metadata
        .ok_or_else(|| AlbumError::InvalidLink("No metadata in listing".to_string()))?;
    let contents = metadata
        .contents
        .ok_or_else(|| AlbumError::InvalidLink("No contents found in listing".to_string()))?;
    Ok((metadata.name, contents))
}
