use crate::AppState;
use crate::album::{AlbumError, AlbumSource, Photo, PhotoId};
use crate::navigation::{
    Key, Lightbox, LightboxPhase, NavigationCursor, NavigationInput, NavigationOutcome, route,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlbumQuery {
    pub publink_code: Option<String>,
    pub folder: Option<u64>,
    #[serde(default)]
    pub refresh: bool,
}

impl AlbumQuery {
    /// A share code wins over a folder id; empty codes count as absent.
    pub fn source(&self) -> Option<AlbumSource> {
        match (&self.publink_code, self.folder) {
            (Some(code), _) if !code.is_empty() => Some(AlbumSource::ShareCode(code.clone())),
            (_, Some(folder_id)) => Some(AlbumSource::Folder(folder_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NavigateQuery {
    pub publink_code: Option<String>,
    pub folder: Option<u64>,
    pub key: Option<String>,
    pub drag: Option<f64>,
    pub to: Option<PhotoId>,
}

impl NavigateQuery {
    fn source(&self) -> Option<AlbumSource> {
        AlbumQuery {
            publink_code: self.publink_code.clone(),
            folder: self.folder,
            refresh: false,
        }
        .source()
    }

    fn input(&self) -> Option<NavigationInput> {
        if let Some(id) = self.to {
            Some(NavigationInput::Link(id))
        } else if let Some(dx) = self.drag {
            Some(NavigationInput::Drag { dx })
        } else {
            self.key
                .as_deref()
                .and_then(|key| key.parse::<Key>().ok())
                .map(NavigationInput::Key)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub app_name: String,
    pub closed_session: bool,
}

#[derive(Debug, Serialize)]
pub struct PhotoEntry {
    #[serde(flatten)]
    pub photo: Photo,
    pub link: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AlbumView {
    Empty {
        app_name: String,
    },
    Loaded {
        album_name: String,
        share_code: Option<String>,
        photo_count: usize,
        photos: Vec<PhotoEntry>,
        home_link: String,
    },
    Error {
        message: String,
        home_link: String,
    },
}

#[derive(Debug, Serialize)]
pub struct NavigationLink {
    pub id: PhotoId,
    pub display_name: String,
    pub preview_url: String,
    pub link: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PhotoView {
    Photo {
        photo: Photo,
        src: String,
        phase: LightboxPhase,
        loading: bool,
        index: usize,
        total: usize,
        previous: Option<NavigationLink>,
        next: Option<NavigationLink>,
        album_link: String,
    },
    NotFound {
        message: String,
        album_link: String,
    },
    Error {
        message: String,
        album_link: String,
    },
}

/// What the lightbox shows for one photo at the moment a response is built.
struct LightboxDisplay {
    src: String,
    phase: LightboxPhase,
    loading: bool,
}

impl LightboxDisplay {
    fn read(lightbox: &Lightbox, photo: &Photo) -> Self {
        Self {
            src: lightbox.src().unwrap_or(&photo.preview_url).to_string(),
            phase: lightbox.phase(),
            loading: lightbox.is_loading(),
        }
    }
}

fn album_error_status(err: &AlbumError) -> StatusCode {
    match err {
        AlbumError::InvalidLink(_) => StatusCode::NOT_FOUND,
        AlbumError::Remote(_) => StatusCode::BAD_GATEWAY,
    }
}

fn album_link(app_state: &AppState, source: Option<&AlbumSource>) -> String {
    app_state.link(&source.map_or_else(|| "/app".to_string(), route::album_path))
}

fn not_found(app_state: &AppState, source: Option<&AlbumSource>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(PhotoView::NotFound {
            message: "Photo not found.".to_string(),
            album_link: album_link(app_state, source),
        }),
    )
        .into_response()
}

/// Album selection. Arriving here from an album ends that album's session.
pub async fn home_handler(
    State(app_state): State<AppState>,
    Query(query): Query<AlbumQuery>,
) -> Json<HomeView> {
    let closed_session = match query.source() {
        Some(source) => app_state.feed.close(&source).await,
        None => false,
    };

    Json(HomeView {
        app_name: app_state.config.app.name.clone(),
        closed_session,
    })
}

pub async fn album_handler(
    State(app_state): State<AppState>,
    Query(query): Query<AlbumQuery>,
) -> Response {
    let Some(source) = query.source() else {
        return Json(AlbumView::Empty {
            app_name: app_state.config.app.name.clone(),
        })
        .into_response();
    };

    let home_link = app_state.link(&route::home_path(&source));

    let session = match app_state.feed.session(&source, query.refresh).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load album for {}: {}", source, e);
            return (
                album_error_status(&e),
                Json(AlbumView::Error {
                    message: e.to_string(),
                    home_link,
                }),
            )
                .into_response();
        }
    };

    let snapshot = &session.snapshot;
    let photos = snapshot
        .photos()
        .iter()
        .map(|photo| PhotoEntry {
            link: app_state.link(&route::photo_path(&source, photo.id)),
            photo: photo.clone(),
        })
        .collect();

    Json(AlbumView::Loaded {
        album_name: snapshot.name.clone(),
        share_code: snapshot.share_code().map(str::to_string),
        photo_count: snapshot.len(),
        photos,
        home_link,
    })
    .into_response()
}

pub async fn photo_handler(
    State(app_state): State<AppState>,
    Path(photo_id): Path<String>,
    Query(query): Query<AlbumQuery>,
) -> Response {
    let source = query.source();

    let (Some(source), Ok(photo_id)) = (source.as_ref(), photo_id.parse::<PhotoId>()) else {
        if source.is_none() {
            warn!("Photo {} requested without a share code", photo_id);
        }
        return not_found(&app_state, source.as_ref());
    };

    let session = match app_state.feed.session(source, false).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load album for {}: {}", source, e);
            return (
                album_error_status(&e),
                Json(PhotoView::Error {
                    message: e.to_string(),
                    album_link: album_link(&app_state, Some(source)),
                }),
            )
                .into_response();
        }
    };

    let Some(cursor) = NavigationCursor::locate(&session.snapshot, photo_id) else {
        return not_found(&app_state, Some(source));
    };

    let cached = session.high_res.cached(photo_id).await;

    // The preview goes out right away; a missing high-res link is fetched in
    // the background and shows up on a later request for this photo.
    let (display, fetch) = {
        let mut lightbox = session.lightbox();
        let mut fetch = None;

        if lightbox.show(cursor.current) {
            match (source.share_code(), lightbox.begin_high_res()) {
                (Some(code), Some(ticket)) => match cached {
                    Some(url) => {
                        lightbox.settle(&ticket, Ok(url));
                    }
                    None => fetch = Some((ticket, code.to_string())),
                },
                _ => lightbox.settle_preview_only(),
            }
        }

        (LightboxDisplay::read(&lightbox, cursor.current), fetch)
    };

    if let Some((ticket, code)) = fetch {
        let session = session.clone();
        tokio::spawn(async move {
            let result = session.high_res.get_high_res(ticket.photo_id(), &code).await;
            session.lightbox().settle(&ticket, result);
        });
    }

    let link_to = |photo: &Photo| NavigationLink {
        id: photo.id,
        display_name: photo.display_name.clone(),
        preview_url: photo.preview_url.clone(),
        link: app_state.link(&route::photo_path(source, photo.id)),
    };

    Json(PhotoView::Photo {
        photo: cursor.current.clone(),
        src: display.src,
        phase: display.phase,
        loading: display.loading,
        index: cursor.index,
        total: session.snapshot.len(),
        previous: cursor.previous.map(link_to),
        next: cursor.next.map(link_to),
        album_link: album_link(&app_state, Some(source)),
    })
    .into_response()
}

/// Applies one navigation input (`key`, `drag` or `to`) and redirects to the
/// photo it lands on. No-ops redirect back to the current photo.
pub async fn navigate_handler(
    State(app_state): State<AppState>,
    Path(photo_id): Path<String>,
    Query(query): Query<NavigateQuery>,
) -> Response {
    let Some(source) = query.source() else {
        return Redirect::to(&app_state.link("/app")).into_response();
    };

    let Ok(photo_id) = photo_id.parse::<PhotoId>() else {
        return Redirect::to(&app_state.link(&route::album_path(&source))).into_response();
    };
    let current = app_state.link(&route::photo_path(&source, photo_id));

    let session = match app_state.feed.session(&source, false).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load album for {}: {}", source, e);
            return Redirect::to(&current).into_response();
        }
    };

    let (Some(cursor), Some(input)) = (
        NavigationCursor::locate(&session.snapshot, photo_id),
        query.input(),
    ) else {
        return Redirect::to(&current).into_response();
    };

    match app_state.navigator.apply(&cursor, &input) {
        NavigationOutcome::Move(target) => {
            Redirect::to(&app_state.link(&route::photo_path(&source, target))).into_response()
        }
        NavigationOutcome::Stay => Redirect::to(&current).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_album_query_source() {
        let query = AlbumQuery {
            publink_code: Some("abc123".to_string()),
            folder: Some(5),
            refresh: false,
        };
        assert_eq!(
            query.source(),
            Some(AlbumSource::ShareCode("abc123".to_string()))
        );

        let query = AlbumQuery {
            publink_code: Some(String::new()),
            folder: Some(5),
            refresh: false,
        };
        assert_eq!(query.source(), Some(AlbumSource::Folder(5)));

        assert_eq!(AlbumQuery::default().source(), None);
    }

    #[test]
    fn test_navigate_query_input_priority() {
        let query = NavigateQuery {
            key: Some("ArrowRight".to_string()),
            drag: Some(-80.0),
            ..Default::default()
        };
        assert_eq!(query.input(), Some(NavigationInput::Drag { dx: -80.0 }));

        let query = NavigateQuery {
            key: Some("ArrowLeft".to_string()),
            ..Default::default()
        };
        assert_eq!(query.input(), Some(NavigationInput::Key(Key::ArrowLeft)));

        assert_eq!(NavigateQuery::default().input(), None);
    }
}
