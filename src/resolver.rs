//! Picks the clip that follows the current one.

use log::trace;

use crate::model::{catalog_index, Clip, PlaylistSet};

/// Index of the clip to play after `current_index`.
///
/// The active playlist wins when it has at least two entries, contains the
/// current clip, and its next entry exists in the catalog. Anything else falls
/// back to cycling through the catalog in order. Catalogs of zero or one clip
/// return `current_index` unchanged.
pub fn next_index(catalog: &[Clip], playlists: &PlaylistSet, active_playlist: &str, current_index: usize) -> usize {
    if catalog.len() <= 1 {
        return current_index;
    }

    if let Some(next) = playlist_successor(catalog, playlists, active_playlist, current_index) {
        trace!("Playlist '{}' resolves {} -> {}", active_playlist, current_index, next);
        return next;
    }

    (current_index + 1) % catalog.len()
}

fn playlist_successor(catalog: &[Clip], playlists: &PlaylistSet, active_playlist: &str, current_index: usize) -> Option<usize> {
    let playlist = playlists.get(active_playlist).filter(|p| p.len() >= 2)?;
    let current = catalog.get(current_index)?;
    let position = playlist.iter().position(|name| *name == current.filename)?;
    let next_name = &playlist[(position + 1) % playlist.len()];
    catalog_index(catalog, next_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> Vec<Clip> {
        names.iter()
            .map(|n| Clip { filename: n.to_string(), locator: format!("/videos/{}", n) })
            .collect()
    }

    fn playlists(entries: &[(&str, &[&str])]) -> PlaylistSet {
        entries.iter()
            .map(|(name, files)| (name.to_string(), files.iter().map(|f| f.to_string()).collect()))
            .collect()
    }

    #[test]
    fn single_clip_keeps_index() {
        let cat = catalog(&["a"]);
        assert_eq!(next_index(&cat, &PlaylistSet::new(), "default", 0), 0);
        assert_eq!(next_index(&[], &PlaylistSet::new(), "default", 3), 3);
    }

    #[test]
    fn empty_default_playlist_cycles_catalog() {
        let cat = catalog(&["a", "b", "c"]);
        let lists = playlists(&[("default", &[])]);
        let mut index = 0;
        let mut seen = Vec::new();
        for _ in 0..4 {
            index = next_index(&cat, &lists, "default", index);
            seen.push(cat[index].filename.as_str());
        }
        assert_eq!(seen, vec!["b", "c", "a", "b"]);
    }

    #[test]
    fn playlist_order_wraps() {
        let cat = catalog(&["a", "b", "c"]);
        let lists = playlists(&[("default", &["c", "a"])]);
        assert_eq!(next_index(&cat, &lists, "default", 0), 2);
        assert_eq!(next_index(&cat, &lists, "default", 2), 0);
    }

    #[test]
    fn clip_outside_playlist_falls_back() {
        let cat = catalog(&["a", "b", "c"]);
        let lists = playlists(&[("default", &["c", "a"])]);
        assert_eq!(next_index(&cat, &lists, "default", 1), 2);
    }

    #[test]
    fn one_entry_playlist_falls_back() {
        let cat = catalog(&["a", "b", "c"]);
        let lists = playlists(&[("default", &["a"])]);
        assert_eq!(next_index(&cat, &lists, "default", 0), 1);
    }

    #[test]
    fn missing_playlist_falls_back() {
        let cat = catalog(&["a", "b"]);
        let lists = playlists(&[("default", &["b", "a"])]);
        assert_eq!(next_index(&cat, &lists, "evening", 1), 0);
    }

    #[test]
    fn unknown_filename_in_playlist_falls_back() {
        let cat = catalog(&["a", "b", "c"]);
        let lists = playlists(&[("default", &["a", "gone.mp4", "c"])]);
        assert_eq!(next_index(&cat, &lists, "default", 0), 1);
    }

    #[test]
    fn out_of_range_current_still_yields_valid_index() {
        let cat = catalog(&["a", "b", "c"]);
        let lists = playlists(&[("default", &["c", "a"])]);
        let next = next_index(&cat, &lists, "default", 7);
        assert!(next < cat.len());
    }
}
