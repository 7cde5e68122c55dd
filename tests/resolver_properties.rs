use kiosk_player::model::{Clip, PlaylistSet};
use kiosk_player::resolver::next_index;
use proptest::prelude::*;

fn catalog(len: usize) -> Vec<Clip> {
    (0..len)
        .map(|i| Clip { filename: format!("clip{}.mp4", i), locator: format!("/videos/clip{}.mp4", i) })
        .collect()
}

/// Playlist entries drawn from the catalog plus a few names it does not contain.
fn playlist_entries(catalog_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(0..catalog_len + 2, 0..6).prop_map(move |picks| {
        picks.into_iter()
            .map(|i| if i < catalog_len { format!("clip{}.mp4", i) } else { format!("missing{}.mp4", i) })
            .collect()
    })
}

fn scenario() -> impl Strategy<Value = (usize, Vec<String>, usize)> {
    (2usize..8).prop_flat_map(|len| (Just(len), playlist_entries(len), 0..len))
}

fn active(entries: Vec<String>) -> PlaylistSet {
    let mut playlists = PlaylistSet::new();
    playlists.insert("default".to_string(), Vec::new());
    playlists.insert("show".to_string(), entries);
    playlists
}

proptest! {
    #[test]
    fn always_lands_inside_catalog((len, entries, current) in scenario()) {
        let next = next_index(&catalog(len), &active(entries), "show", current);
        prop_assert!(next < len);
    }

    #[test]
    fn follows_playlist_when_successor_is_known((len, entries, current) in scenario()) {
        let cat = catalog(len);
        let name = &cat[current].filename;
        let next = next_index(&cat, &active(entries.clone()), "show", current);

        let position = entries.iter().position(|e| e == name);
        match position {
            Some(p) if entries.len() >= 2 => {
                let successor = &entries[(p + 1) % entries.len()];
                match cat.iter().position(|c| &c.filename == successor) {
                    Some(expected) => prop_assert_eq!(next, expected),
                    None => prop_assert_eq!(next, (current + 1) % len),
                }
            }
            _ => prop_assert_eq!(next, (current + 1) % len),
        }
    }

    #[test]
    fn unknown_playlist_cycles_catalog((len, entries, current) in scenario()) {
        let next = next_index(&catalog(len), &active(entries), "missing", current);
        prop_assert_eq!(next, (current + 1) % len);
    }

    #[test]
    fn tiny_catalogs_keep_their_index(len in 0usize..2, current in 0usize..4) {
        let next = next_index(&catalog(len), &active(vec!["clip0.mp4".into(), "clip1.mp4".into()]), "show", current);
        prop_assert_eq!(next, current);
    }
}
