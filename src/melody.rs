use thiserror::Error;

use crate::notes::{key_idx_from_note, KeyIdx, NO_NOTE};
use crate::songs;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MelodyError {
    #[error("melody has no next note; reset the player first")]
    Exhausted,
}

/// A named, immutable sequence of key indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Melody {
    id: String,
    notes: Vec<KeyIdx>,
}

impl Melody {
    pub fn new(id: impl Into<String>, notes: Vec<KeyIdx>) -> Self {
        Self {
            id: id.into(),
            notes,
        }
    }

    /// Parses a whitespace separated list of note names. Unreadable names become silent
    /// notes instead of failing the whole melody, and blank text is a single silent note.
    pub fn from_text(id: impl Into<String>, text: &str) -> Self {
        let id = id.into();
        let mut notes: Vec<KeyIdx> = text.split_whitespace().map(key_idx_from_note).collect();
        if notes.is_empty() {
            notes.push(NO_NOTE);
        }
        log::debug!("Loaded melody '{id}' ({} notes)", notes.len());
        Self { id, notes }
    }

    /// Every melody in the built-in catalog, in catalog order.
    pub fn all() -> Vec<Melody> {
        songs::CATALOG
            .iter()
            .map(|&(id, text)| Melody::from_text(id, text))
            .collect()
    }

    /// The catalog melodies named in `ids`, in catalog order. Unknown ids are skipped.
    pub fn selected<S: AsRef<str>>(ids: &[S]) -> Vec<Melody> {
        for id in ids {
            if !songs::CATALOG.iter().any(|&(known, _)| known == id.as_ref()) {
                log::warn!("Unknown melody '{}' ignored", id.as_ref());
            }
        }
        songs::CATALOG
            .iter()
            .filter(|&&(known, _)| ids.iter().any(|id| id.as_ref() == known))
            .map(|&(id, text)| Melody::from_text(id, text))
            .collect()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn notes(&self) -> &[KeyIdx] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Hands out "the next note" regardless of which key was pressed.
pub trait MelodyPlayer {
    fn has_next_note(&self) -> bool;
    fn next_note(&mut self) -> Result<KeyIdx, MelodyError>;
    fn reset(&mut self);
}

pub struct SingleSongPlayer {
    melody: Melody,
    cursor: usize,
}

impl SingleSongPlayer {
    pub fn new(melody: Melody) -> Self {
        Self { melody, cursor: 0 }
    }

    pub fn melody(&self) -> &Melody {
        &self.melody
    }
}

impl MelodyPlayer for SingleSongPlayer {
    fn has_next_note(&self) -> bool {
        self.cursor < self.melody.len()
    }

    fn next_note(&mut self) -> Result<KeyIdx, MelodyError> {
        let note = *self
            .melody
            .notes
            .get(self.cursor)
            .ok_or(MelodyError::Exhausted)?;
        self.cursor += 1;
        Ok(note)
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// Plays several melodies back to back, looping to the first after the last one.
pub struct MultiSongPlayer {
    songs: Vec<SingleSongPlayer>,
    current: usize,
}

impl MultiSongPlayer {
    pub fn new(melodies: Vec<Melody>) -> Self {
        Self {
            songs: melodies.into_iter().map(SingleSongPlayer::new).collect(),
            current: 0,
        }
    }

    pub fn current_melody(&self) -> Option<&Melody> {
        self.songs.get(self.current).map(|s| s.melody())
    }

    pub fn song_count(&self) -> usize {
        self.songs.len()
    }
}

impl MelodyPlayer for MultiSongPlayer {
    fn has_next_note(&self) -> bool {
        match self.songs.get(self.current) {
            Some(song) => self.current + 1 < self.songs.len() || song.has_next_note(),
            None => false,
        }
    }

    fn next_note(&mut self) -> Result<KeyIdx, MelodyError> {
        let count = self.songs.len();
        let song = self.songs.get_mut(self.current).ok_or(MelodyError::Exhausted)?;
        if !song.has_next_note() {
            // Leave the finished song at its start, so it replays from the top next time.
            song.reset();
            self.current = (self.current + 1) % count;
            self.songs[self.current].reset();
            log::debug!("Moving on to melody '{}'", self.songs[self.current].melody().id());
        }
        self.songs[self.current].next_note()
    }

    fn reset(&mut self) {
        if let Some(song) = self.songs.get_mut(self.current) {
            song.reset();
        }
        self.current = 0;
        if let Some(first) = self.songs.first_mut() {
            first.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_note(id: &str, note: i32) -> Melody {
        Melody::new(id, vec![KeyIdx(note)])
    }

    #[test]
    fn single_song_plays_then_runs_out() {
        let mut p = SingleSongPlayer::new(Melody::from_text("t", "C D E"));
        let mut got = Vec::new();
        while p.has_next_note() {
            got.push(p.next_note().unwrap().0);
        }
        assert_eq!(got, vec![0, 2, 4]);
        assert_eq!(p.next_note(), Err(MelodyError::Exhausted));

        p.reset();
        assert_eq!(p.next_note(), Ok(KeyIdx(0)));
    }

    #[test]
    fn bad_note_names_turn_silent() {
        let m = Melody::from_text("t", "C  nope\tE#\n  ");
        assert_eq!(m.notes(), &[KeyIdx(0), NO_NOTE, KeyIdx(6)]);
    }

    #[test]
    fn multi_song_wraps_around() {
        let mut p = MultiSongPlayer::new(vec![
            one_note("a", 11),
            one_note("b", 22),
            one_note("c", 33),
        ]);

        assert!(p.has_next_note());
        assert_eq!(p.next_note(), Ok(KeyIdx(11)));
        assert!(p.has_next_note());
        assert_eq!(p.next_note(), Ok(KeyIdx(22)));
        assert!(p.has_next_note());
        assert_eq!(p.next_note(), Ok(KeyIdx(33)));
        assert!(!p.has_next_note());
        assert_eq!(p.next_note(), Ok(KeyIdx(11)));
        assert!(p.has_next_note());
    }

    #[test]
    fn reset_after_the_last_song_rearms_the_player() {
        let mut p = MultiSongPlayer::new(vec![
            one_note("a", 11),
            one_note("b", 22),
            one_note("c", 33),
        ]);
        for _ in 0..3 {
            p.next_note().unwrap();
        }
        assert!(!p.has_next_note());

        p.reset();
        assert!(p.has_next_note());
        assert_eq!(p.next_note(), Ok(KeyIdx(11)));
    }

    #[test]
    fn blank_song_plays_a_silent_note() {
        assert_eq!(Melody::from_text("x", "   ").notes(), &[NO_NOTE]);

        let mut p = MultiSongPlayer::new(vec![
            one_note("a", 1),
            Melody::from_text("blank", " \n\t"),
            one_note("c", 3),
        ]);
        let got: Vec<_> = (0..3).map(|_| p.next_note()).collect();
        assert_eq!(got, vec![Ok(KeyIdx(1)), Ok(NO_NOTE), Ok(KeyIdx(3))]);
    }

    #[test]
    fn finished_songs_restart_from_the_top() {
        let mut p = MultiSongPlayer::new(vec![
            Melody::new("a", vec![KeyIdx(1), KeyIdx(2)]),
            Melody::new("b", vec![KeyIdx(3)]),
        ]);
        let got: Vec<i32> = (0..7).map(|_| p.next_note().unwrap().0).collect();
        assert_eq!(got, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn reset_goes_back_to_the_first_song() {
        let mut p = MultiSongPlayer::new(vec![
            Melody::new("a", vec![KeyIdx(1), KeyIdx(2)]),
            Melody::new("b", vec![KeyIdx(3), KeyIdx(4)]),
        ]);
        p.next_note().unwrap();
        p.next_note().unwrap();
        p.next_note().unwrap();
        assert_eq!(p.current_melody().map(Melody::id), Some("b"));

        p.reset();
        assert_eq!(p.current_melody().map(Melody::id), Some("a"));
        assert_eq!(p.next_note(), Ok(KeyIdx(1)));

        // Resetting twice in a row is harmless.
        p.reset();
        p.reset();
        assert_eq!(p.next_note(), Ok(KeyIdx(1)));
    }

    #[test]
    fn last_song_still_has_notes() {
        let mut p = MultiSongPlayer::new(vec![Melody::new("a", vec![KeyIdx(1), KeyIdx(2)])]);
        assert!(p.has_next_note());
        p.next_note().unwrap();
        assert!(p.has_next_note());
        p.next_note().unwrap();
        assert!(!p.has_next_note());
        assert_eq!(p.next_note(), Ok(KeyIdx(1)));
    }

    #[test]
    fn empty_player_reports_exhausted() {
        let mut p = MultiSongPlayer::new(Vec::new());
        assert!(!p.has_next_note());
        assert_eq!(p.next_note(), Err(MelodyError::Exhausted));
        p.reset();
        assert_eq!(p.next_note(), Err(MelodyError::Exhausted));
    }

    #[test]
    fn selection_follows_catalog_order() {
        let picked = Melody::selected(&["brother_john", "nope", "twinkle"]);
        let ids: Vec<&str> = picked.iter().map(Melody::id).collect();
        assert_eq!(ids, vec!["twinkle", "brother_john"]);
    }

    #[test]
    fn catalog_melodies_are_playable() {
        let all = Melody::all();
        assert_eq!(all.len(), songs::CATALOG.len());
        for m in &all {
            assert!(!m.is_empty(), "{}", m.id());
            assert!(
                m.notes().iter().all(|&n| n != NO_NOTE),
                "{} has unreadable notes",
                m.id()
            );
        }
    }
}
