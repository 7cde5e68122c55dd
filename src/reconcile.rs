//! Turns two configuration snapshots into the list of changes to apply.
//!
//! Deltas come out in application order: audio first, then playlists, then
//! selection, so a forced restart re-resolves its preload against the new
//! playlist data when both changed in the same poll.

use crate::model::Configuration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigDelta {
    VolumeChanged(u8),
    MutedChanged(bool),
    PlaylistsChanged,
    SelectionChanged(Option<String>),
}

/// Field-by-field comparison of the cached configuration against a new poll.
pub fn diff(cached: &Configuration, next: &Configuration) -> Vec<ConfigDelta> {
    let mut deltas = Vec::new();
    if next.volume != cached.volume {
        deltas.push(ConfigDelta::VolumeChanged(next.volume));
    }
    if next.muted != cached.muted {
        deltas.push(ConfigDelta::MutedChanged(next.muted));
    }
    if next.playlists != cached.playlists || next.active_playlist != cached.active_playlist {
        deltas.push(ConfigDelta::PlaylistsChanged);
    }
    if next.selected_filename != cached.selected_filename {
        deltas.push(ConfigDelta::SelectionChanged(next.selected_filename.clone()));
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_snapshots_produce_nothing() {
        let cfg = Configuration::default();
        assert!(diff(&cfg, &cfg.clone()).is_empty());
    }

    #[test]
    fn each_field_maps_to_its_delta() {
        let cached = Configuration::default();

        let louder = Configuration { volume: 80, ..cached.clone() };
        assert_eq!(diff(&cached, &louder), vec![ConfigDelta::VolumeChanged(80)]);

        let unmuted = Configuration { muted: false, ..cached.clone() };
        assert_eq!(diff(&cached, &unmuted), vec![ConfigDelta::MutedChanged(false)]);

        let selected = Configuration { selected_filename: Some("b.mp4".into()), ..cached.clone() };
        assert_eq!(diff(&cached, &selected), vec![ConfigDelta::SelectionChanged(Some("b.mp4".into()))]);
    }

    #[test]
    fn playlist_contents_are_compared_deeply() {
        let cached = Configuration::default();
        let mut next = cached.clone();
        next.playlists.get_mut("default").unwrap().push("a.mp4".into());
        assert_eq!(diff(&cached, &next), vec![ConfigDelta::PlaylistsChanged]);
    }

    #[test]
    fn switching_active_playlist_counts_as_playlist_change() {
        let cached = Configuration::default();
        let next = Configuration { active_playlist: "evening".into(), ..cached.clone() };
        assert_eq!(diff(&cached, &next), vec![ConfigDelta::PlaylistsChanged]);
    }

    #[test]
    fn selection_comes_after_playlists() {
        let cached = Configuration::default();
        let mut next = Configuration {
            volume: 10,
            muted: false,
            selected_filename: Some("c.mp4".into()),
            ..cached.clone()
        };
        next.playlists.insert("evening".into(), vec!["c.mp4".into(), "a.mp4".into()]);

        assert_eq!(diff(&cached, &next), vec![
            ConfigDelta::VolumeChanged(10),
            ConfigDelta::MutedChanged(false),
            ConfigDelta::PlaylistsChanged,
            ConfigDelta::SelectionChanged(Some("c.mp4".into())),
        ]);
    }
}
