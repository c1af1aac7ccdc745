//! Social-network demo query.
//!
//! The reference pipeline joins photo-tag events with photo-like events and
//! counts, per window, how many matched likes each photo received:
//!
//! ```text
//! tags ──┐
//!        ├─ join ── filter (liked after tagged) ── aggregate ── sink
//! likes ─┘
//! ```
//!
//! The functions here are ordinary [`crate::functions`] implementations; the
//! engine knows nothing about photos or likes.

use anyhow::Result;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use eventide_core::{Event, Timestamp};

/// A user was tagged on a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoTag {
    pub photo_id: i32,
    pub user_id: i32,
}

/// A user liked a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoLike {
    pub user_id: i32,
    pub photo_id: i32,
}

/// A tag and a like for the same (photo, user) pair within one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagLikeMatch {
    pub tagged_at: Timestamp,
    pub liked_at: Timestamp,
    pub photo_id: i32,
    pub user_id: i32,
}

/// Per-window like count for one photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoLikeCount {
    pub photo_id: i32,
    pub count: u32,
}

/// Join predicate: a tag (left) matches a like (right) when they name the
/// same photo and the same user.
pub fn tag_like_join(
    output_timestamp: Timestamp,
    tag: &Event,
    like: &Event,
) -> Result<Option<Event>> {
    let t: PhotoTag = tag.decode()?;
    let l: PhotoLike = like.decode()?;
    if t.photo_id != l.photo_id || t.user_id != l.user_id {
        return Ok(None);
    }
    let matched = TagLikeMatch {
        tagged_at: tag.timestamp,
        liked_at: like.timestamp,
        photo_id: t.photo_id,
        user_id: t.user_id,
    };
    Ok(Some(Event::encode(output_timestamp, &matched)?))
}

/// Filter predicate: keep matches where the user liked the photo after
/// being tagged on it.
pub fn liked_after_tagged(event: &Event) -> Result<bool> {
    let matched: TagLikeMatch = event.decode()?;
    Ok(matched.tagged_at < matched.liked_at)
}

/// Window aggregate: count matches per photo, one output event per photo at
/// the window start, ascending by photo id so output does not depend on
/// arrival order within the window.
pub fn photo_like_counts(window_start: Timestamp, events: &[Event]) -> Result<Vec<Event>> {
    let mut counts: FxHashMap<i32, u32> = FxHashMap::default();
    for event in events {
        let matched: TagLikeMatch = event.decode()?;
        *counts.entry(matched.photo_id).or_default() += 1;
    }

    let mut photos: Vec<(i32, u32)> = counts.into_iter().collect();
    photos.sort_unstable_by_key(|(photo_id, _)| *photo_id);

    photos
        .into_iter()
        .map(|(photo_id, count)| Event::encode(window_start, &PhotoLikeCount { photo_id, count }))
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}
