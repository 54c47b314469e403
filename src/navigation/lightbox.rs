use crate::album::{HighResError, Photo, PhotoId};
use serde::Serialize;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightboxPhase {
    PreviewShown,
    HighResLoading,
    HighResShown,
}

/// Issued when a high-res fetch starts; only the ticket matching the active
/// photo and generation may settle it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighResTicket {
    photo_id: PhotoId,
    generation: u64,
}

impl HighResTicket {
    pub fn photo_id(&self) -> PhotoId {
        self.photo_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Applied,
    Discarded,
}

/// Display state for the photo currently open in the lightbox.
#[derive(Debug)]
pub struct Lightbox {
    active: Option<PhotoId>,
    phase: LightboxPhase,
    src: Option<String>,
    loading: bool,
    generation: u64,
}

impl Default for Lightbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lightbox {
    pub fn new() -> Self {
        Self {
            active: None,
            phase: LightboxPhase::PreviewShown,
            src: None,
            loading: false,
            generation: 0,
        }
    }

    pub fn active(&self) -> Option<PhotoId> {
        self.active
    }

    pub fn phase(&self) -> LightboxPhase {
        self.phase
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Makes `photo` the active one. Switching to a different id resets to the
    /// preview and invalidates any fetch still in flight; returns whether it
    /// switched.
    pub fn show(&mut self, photo: &Photo) -> bool {
        if self.active == Some(photo.id) {
            return false;
        }
        self.generation += 1;
        self.active = Some(photo.id);
        self.phase = LightboxPhase::PreviewShown;
        self.src = Some(photo.preview_url.clone());
        self.loading = true;
        true
    }

    /// Nothing is displayed anymore; late completions are dropped.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.active = None;
        self.phase = LightboxPhase::PreviewShown;
        self.src = None;
        self.loading = false;
    }

    pub fn begin_high_res(&mut self) -> Option<HighResTicket> {
        let photo_id = self.active?;
        if self.phase != LightboxPhase::PreviewShown {
            return None;
        }
        self.phase = LightboxPhase::HighResLoading;
        self.loading = true;
        Some(HighResTicket {
            photo_id,
            generation: self.generation,
        })
    }

    /// No high-res source is available for this photo; keep the preview.
    pub fn settle_preview_only(&mut self) {
        if self.active.is_some() {
            self.phase = LightboxPhase::PreviewShown;
            self.loading = false;
        }
    }

    pub fn settle(
        &mut self,
        ticket: &HighResTicket,
        result: Result<String, HighResError>,
    ) -> Settled {
        if ticket.generation != self.generation || self.active != Some(ticket.photo_id) {
            debug!(
                "Discarding high-res result for photo {} (no longer active)",
                ticket.photo_id
            );
            return Settled::Discarded;
        }

        match result {
            Ok(url) => {
                self.src = Some(url);
                self.phase = LightboxPhase::HighResShown;
            }
            Err(e) => {
                error!("Failed to fetch high-res image: {}", e);
                self.phase = LightboxPhase::PreviewShown;
            }
        }
        self.loading = false;
        Settled::Applied
    }
}
