//! Per-session lyrics memoization.

use crate::lrc::LyricsDocument;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory map from track id to its resolved lyrics, kept for the process
/// lifetime with no eviction. Entries are small text payloads and a
/// listening session touches at most a few hundred distinct tracks.
///
/// A cached [`LyricsDocument::Absent`] records that a lookup already came
/// back empty, so repeat plays of the same track skip the remote round trip.
/// `get` returning `None` is the third, distinct state: never looked up.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: HashMap<String, Arc<LyricsDocument>>,
}

impl SessionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, track_id: &str) -> Option<Arc<LyricsDocument>> {
        self.entries.get(track_id).cloned()
    }

    pub fn put(&mut self, track_id: impl Into<String>, document: Arc<LyricsDocument>) {
        self.entries.insert(track_id.into(), document);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lrc::LyricsLine;

    #[test]
    fn unknown_track_is_not_cached() {
        let cache = SessionCache::new();
        assert!(cache.get("never-seen").is_none());
    }

    #[test]
    fn cached_absent_is_distinct_from_unknown() {
        let mut cache = SessionCache::new();
        cache.put("track-1", Arc::new(LyricsDocument::Absent));

        let hit = cache.get("track-1");
        assert!(hit.is_some_and(|doc| doc.is_absent()));
        assert!(cache.get("track-2").is_none());
    }

    #[test]
    fn put_overwrites_an_existing_entry() {
        let mut cache = SessionCache::new();
        cache.put("track-1", Arc::new(LyricsDocument::Absent));
        cache.put(
            "track-1",
            Arc::new(LyricsDocument::Synced(vec![LyricsLine {
                offset_seconds: 1.0,
                text: "found after all".to_string(),
            }])),
        );

        let doc = cache.get("track-1").unwrap();
        assert_eq!(doc.synced_lines().map(<[LyricsLine]>::len), Some(1));
        assert_eq!(cache.len(), 1);
    }
}
