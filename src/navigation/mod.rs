// Navigation module - cursor over a snapshot, input handling and lightbox state
mod lightbox;
pub mod route;

pub use lightbox::{HighResTicket, Lightbox, LightboxPhase, Settled};

use crate::album::{AlbumSnapshot, Photo, PhotoId};
use std::str::FromStr;

/// Where the current photo sits in its album. Derived on demand, never stored.
#[derive(Debug, Clone, Copy)]
pub struct NavigationCursor<'a> {
    pub index: usize,
    pub current: &'a Photo,
    pub previous: Option<&'a Photo>,
    pub next: Option<&'a Photo>,
}

impl<'a> NavigationCursor<'a> {
    pub fn locate(snapshot: &'a AlbumSnapshot, id: PhotoId) -> Option<Self> {
        let photos = snapshot.photos();
        let index = snapshot.position(id)?;
        Some(Self {
            index,
            current: &photos[index],
            previous: index.checked_sub(1).map(|i| &photos[i]),
            next: photos.get(index + 1),
        })
    }

    pub fn neighbor(&self, direction: Direction) -> Option<&'a Photo> {
        match direction {
            Direction::Previous => self.previous,
            Direction::Next => self.next,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other,
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationInput {
    Key(Key),
    /// Horizontal movement of a drag that has been released.
    Drag { dx: f64 },
    /// A navigation link was activated directly.
    Link(PhotoId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Move(PhotoId),
    Stay,
}

#[derive(Debug, Clone, Copy)]
pub struct Navigator {
    swipe_threshold: f64,
}

impl Navigator {
    pub fn new(swipe_threshold: f64) -> Self {
        Self { swipe_threshold }
    }

    pub fn direction(&self, input: &NavigationInput) -> Option<Direction> {
        match input {
            NavigationInput::Key(Key::ArrowLeft) => Some(Direction::Previous),
            NavigationInput::Key(Key::ArrowRight) => Some(Direction::Next),
            NavigationInput::Key(Key::Other) | NavigationInput::Link(_) => None,
            // Dragging right reveals the previous photo.
            NavigationInput::Drag { dx } if dx.abs() > self.swipe_threshold => {
                if *dx > 0.0 {
                    Some(Direction::Previous)
                } else {
                    Some(Direction::Next)
                }
            }
            NavigationInput::Drag { .. } => None,
        }
    }

    /// Boundaries are no-ops. Links move even to ids outside the album; the
    /// photo view then shows its not-found state.
    pub fn apply(&self, cursor: &NavigationCursor<'_>, input: &NavigationInput) -> NavigationOutcome {
        if let NavigationInput::Link(id) = input {
            return if *id == cursor.current.id {
                NavigationOutcome::Stay
            } else {
                NavigationOutcome::Move(*id)
            };
        }

        self.direction(input)
            .and_then(|direction| cursor.neighbor(direction))
            .map_or(NavigationOutcome::Stay, |photo| {
                NavigationOutcome::Move(photo.id)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album::AlbumSource;

    fn album(count: u64) -> AlbumSnapshot {
        let photos = (1..=count)
            .map(|id| Photo::new(PhotoId(id * 10), format!("p{}", id), None, None, format!("{}.jpg", id)))
            .collect();
        AlbumSnapshot::new(
            "Test".to_string(),
            AlbumSource::ShareCode("abc123".to_string()),
            photos,
        )
    }

    #[test]
    fn test_boundaries_have_no_neighbors() {
        let snapshot = album(10);
        let photos = snapshot.photos();

        for (index, photo) in photos.iter().enumerate() {
            let cursor = NavigationCursor::locate(&snapshot, photo.id).unwrap();
            assert_eq!(cursor.index, index);
            assert_eq!(cursor.previous.is_none(), index == 0);
            assert_eq!(cursor.next.is_none(), index == photos.len() - 1);
            if let Some(prev) = cursor.previous {
                assert_eq!(prev.id, photos[index - 1].id);
            }
            if let Some(next) = cursor.next {
                assert_eq!(next.id, photos[index + 1].id);
            }
        }
    }

    #[test]
    fn test_single_photo_album() {
        let snapshot = album(1);
        let cursor = NavigationCursor::locate(&snapshot, PhotoId(10)).unwrap();
        assert!(cursor.previous.is_none());
        assert!(cursor.next.is_none());
    }

    #[test]
    fn test_unknown_id_has_no_cursor() {
        let snapshot = album(3);
        assert!(NavigationCursor::locate(&snapshot, PhotoId(999)).is_none());
    }

    #[test]
    fn test_arrow_keys() {
        let snapshot = album(10);
        let navigator = Navigator::new(50.0);

        // Photo at index 5 of 10.
        let cursor = NavigationCursor::locate(&snapshot, PhotoId(60)).unwrap();
        assert_eq!(cursor.index, 5);
        assert_eq!(
            navigator.apply(&cursor, &NavigationInput::Key(Key::ArrowRight)),
            NavigationOutcome::Move(PhotoId(70))
        );
        assert_eq!(
            navigator.apply(&cursor, &NavigationInput::Key(Key::ArrowLeft)),
            NavigationOutcome::Move(PhotoId(50))
        );

        let first = NavigationCursor::locate(&snapshot, PhotoId(10)).unwrap();
        assert_eq!(
            navigator.apply(&first, &NavigationInput::Key(Key::ArrowLeft)),
            NavigationOutcome::Stay
        );

        let last = NavigationCursor::locate(&snapshot, PhotoId(100)).unwrap();
        assert_eq!(
            navigator.apply(&last, &NavigationInput::Key(Key::ArrowRight)),
            NavigationOutcome::Stay
        );
    }

    #[test]
    fn test_drag_threshold() {
        let snapshot = album(3);
        let navigator = Navigator::new(50.0);
        let cursor = NavigationCursor::locate(&snapshot, PhotoId(20)).unwrap();

        assert_eq!(
            navigator.apply(&cursor, &NavigationInput::Drag { dx: 50.0 }),
            NavigationOutcome::Stay
        );
        assert_eq!(
            navigator.apply(&cursor, &NavigationInput::Drag { dx: 51.0 }),
            NavigationOutcome::Move(PhotoId(10))
        );
        assert_eq!(
            navigator.apply(&cursor, &NavigationInput::Drag { dx: -80.0 }),
            NavigationOutcome::Move(PhotoId(30))
        );
        assert_eq!(
            navigator.apply(&cursor, &NavigationInput::Drag { dx: -12.0 }),
            NavigationOutcome::Stay
        );
    }

    #[test]
    fn test_links_and_other_keys() {
        let snapshot = album(3);
        let navigator = Navigator::new(50.0);
        let cursor = NavigationCursor::locate(&snapshot, PhotoId(20)).unwrap();

        assert_eq!(
            navigator.apply(&cursor, &NavigationInput::Link(PhotoId(30))),
            NavigationOutcome::Move(PhotoId(30))
        );
        assert_eq!(
            navigator.apply(&cursor, &NavigationInput::Link(PhotoId(20))),
            NavigationOutcome::Stay
        );
        assert_eq!(
            navigator.apply(&cursor, &NavigationInput::Key("Escape".parse().unwrap())),
            NavigationOutcome::Stay
        );
    }
}
