/// Index of a key on the keyboard, and of the sample played for it.
///
/// Big keys sit on even indices, flats on odd ones. Per octave there are 14 slots, two of
/// which (E-F and B-C) are placeholders without a key. Any value may reach the engine;
/// every consumer range-checks on its own.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KeyIdx(pub i32);

#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd)]
pub struct MidiNote(pub u8);

/// Reserved index for "not a note": it maps to the E-F placeholder, which is always silent.
pub const NO_NOTE: KeyIdx = KeyIdx(5);

/// Key slots per octave, placeholders included.
pub const SLOTS_PER_OCTAVE: i32 = 14;

/// Octaves the note names can address (C1..B2).
pub const NOTE_OCTAVES: i32 = 2;

/// MIDI pitch of key 0.
pub const MIDI_BASE: MidiNote = MidiNote(60);

/// Semitone above C -> key slot within the octave. Slots 5 and 13 are skipped.
const CHROMATIC_TO_SLOT: [i32; 12] = [0, 1, 2, 3, 4, 6, 7, 8, 9, 10, 11, 12];

impl KeyIdx {
    pub fn is_big(self) -> bool {
        self.0.rem_euclid(2) == 0
    }

    /// Slot within the octave (0..14).
    pub fn slot_in_octave(self) -> i32 {
        self.0.rem_euclid(SLOTS_PER_OCTAVE)
    }

    /// Semitone offset from key 0, or `None` for the placeholder slots.
    pub fn semitone(self) -> Option<i32> {
        let slot = self.slot_in_octave();
        let pc = CHROMATIC_TO_SLOT.iter().position(|&s| s == slot)? as i32;
        Some(self.0.div_euclid(SLOTS_PER_OCTAVE) * 12 + pc)
    }

    pub fn to_midi(self) -> Option<MidiNote> {
        let midi = MIDI_BASE.0 as i32 + self.semitone()?;
        if (0..=127).contains(&midi) {
            Some(MidiNote(midi as u8))
        } else {
            None
        }
    }
}

fn pitch_class(letter: char) -> Option<i32> {
    match letter {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Converts common note notations ("C1", "D#1", "Eb1", "G♭1", "A") to key indices.
///
/// The octave defaults to 1 when left off. Enharmonic spellings resolve to the same key,
/// including the ones that cross an octave edge (`B#0` is `C1`, `Cb3` is `B2`).
/// Anything unparseable or out of range yields [`NO_NOTE`].
pub fn key_idx_from_note(note: &str) -> KeyIdx {
    parse_note(note).unwrap_or(NO_NOTE)
}

fn parse_note(note: &str) -> Option<KeyIdx> {
    let mut chars = note.chars().map(|c| match c {
        '♭' => 'b',
        '♯' => '#',
        c => c,
    });

    let pc = pitch_class(chars.next()?)?;

    let mut rest: Vec<char> = chars.collect();
    let accidental = match rest.first() {
        Some('#') => 1,
        Some('b') => -1,
        _ => 0,
    };
    if accidental != 0 {
        rest.remove(0);
    }

    let octave = match rest.as_slice() {
        [] => 1,
        [d] => d.to_digit(10)? as i32,
        _ => return None,
    };

    let semitone = (octave - 1) * 12 + pc + accidental;
    if !(0..NOTE_OCTAVES * 12).contains(&semitone) {
        return None;
    }

    Some(KeyIdx(
        semitone.div_euclid(12) * SLOTS_PER_OCTAVE + CHROMATIC_TO_SLOT[semitone.rem_euclid(12) as usize],
    ))
}
