use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use thiserror::Error;

use crate::engine::PianoListener;
use crate::melody::MelodyPlayer;
use crate::notes::KeyIdx;

/// Number of samples a sound set provides: two octaves of 14 slots, placeholders included.
pub const SOUNDSET_SAMPLES_SIZE: usize = 28;

/// Sound-set names are stored and looked up with this prefix.
pub const PREFIX: &str = "soundset_";

pub const SILENT: &str = "silent";
pub const SYNTH: &str = "synth";
pub const MIDI: &str = "midi";

pub fn add_prefix(name: &str) -> String {
    if name.starts_with(PREFIX) {
        name.to_string()
    } else {
        format!("{PREFIX}{name}")
    }
}

pub fn strip_prefix(name: &str) -> &str {
    name.strip_prefix(PREFIX).unwrap_or(name)
}

#[derive(Debug, Error)]
pub enum SoundSetError {
    #[error("unknown sound set '{0}'")]
    Unknown(String),
    #[error("sound set '{0}' is not built into this binary")]
    NotBuilt(String),
    #[error("no audio device: {0}")]
    NoDevice(String),
    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Something that can play the sample for a key. Playback is fire-and-forget.
/// Dropping the sound set releases whatever it holds.
pub trait SoundSet {
    fn name(&self) -> &str;
    fn play_note(&mut self, key: KeyIdx);
}

/// Returns the key if a sample exists for it, logging the ones that don't.
pub fn sample_for(key: KeyIdx) -> Option<KeyIdx> {
    if (0..SOUNDSET_SAMPLES_SIZE as i32).contains(&key.0) {
        Some(key)
    } else {
        log::warn!(
            "No sample for key {} (sound sets hold {SOUNDSET_SAMPLES_SIZE})",
            key.0
        );
        None
    }
}

/// Plays nothing. Used when no audio backend is available.
pub struct SilentSoundSet;

impl SoundSet for SilentSoundSet {
    fn name(&self) -> &str {
        SILENT
    }

    fn play_note(&mut self, key: KeyIdx) {
        if let Some(key) = sample_for(key) {
            log::debug!("(silent) key {}", key.0);
        }
    }
}

/// Keys a [`ChannelSoundSet`] holds for its receiver before it starts dropping new ones.
pub const CHANNEL_QUEUE_CAPACITY: usize = 64;

/// Forwards every playable key over a bounded channel, for hosts that own the real audio.
/// Keys played while the queue is full are dropped.
pub struct ChannelSoundSet {
    name: String,
    tx: SyncSender<KeyIdx>,
}

impl ChannelSoundSet {
    pub fn new(name: &str) -> (Self, Receiver<KeyIdx>) {
        let (tx, rx) = mpsc::sync_channel(CHANNEL_QUEUE_CAPACITY);
        (
            Self {
                name: strip_prefix(name).to_string(),
                tx,
            },
            rx,
        )
    }
}

impl SoundSet for ChannelSoundSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn play_note(&mut self, key: KeyIdx) {
        let Some(key) = sample_for(key) else {
            return;
        };
        match self.tx.try_send(key) {
            Ok(()) => {}
            Err(TrySendError::Full(key)) => {
                log::warn!("Sound set '{}' queue is full; dropping key {}", self.name, key.0);
            }
            Err(TrySendError::Disconnected(key)) => {
                log::debug!("Sound set '{}' has no receiver; dropping key {}", self.name, key.0);
            }
        }
    }
}

/// Names of the sound sets this build can open.
pub fn available_sound_sets() -> Vec<&'static str> {
    let mut names = vec![SILENT];
    if cfg!(feature = "synth") {
        names.push(SYNTH);
    }
    if cfg!(feature = "midi") {
        names.push(MIDI);
    }
    names
}

/// Opens a built-in sound set by name, with or without [`PREFIX`].
pub fn open_sound_set(name: &str, a4_tuning_hz: u16) -> Result<Box<dyn SoundSet>, SoundSetError> {
    let bare = strip_prefix(name);
    log::info!("Opening sound set '{bare}'");
    match bare {
        SILENT => Ok(Box::new(SilentSoundSet)),
        SYNTH => open_synth(a4_tuning_hz),
        MIDI => open_midi(),
        other => Err(SoundSetError::Unknown(other.to_string())),
    }
}

#[cfg(feature = "synth")]
fn open_synth(a4_tuning_hz: u16) -> Result<Box<dyn SoundSet>, SoundSetError> {
    Ok(Box::new(crate::output_synth::SynthSoundSet::new(a4_tuning_hz)?))
}

#[cfg(not(feature = "synth"))]
fn open_synth(_a4_tuning_hz: u16) -> Result<Box<dyn SoundSet>, SoundSetError> {
    Err(SoundSetError::NotBuilt(SYNTH.to_string()))
}

#[cfg(feature = "midi")]
fn open_midi() -> Result<Box<dyn SoundSet>, SoundSetError> {
    Ok(Box::new(crate::output_midir::MidiSoundSet::connect()?))
}

#[cfg(not(feature = "midi"))]
fn open_midi() -> Result<Box<dyn SoundSet>, SoundSetError> {
    Err(SoundSetError::NotBuilt(MIDI.to_string()))
}

/// Opens `name`, falling back to the silent set if it can't be opened.
pub fn open_or_silent(name: &str, a4_tuning_hz: u16) -> Box<dyn SoundSet> {
    open_sound_set(name, a4_tuning_hz).unwrap_or_else(|e| {
        log::error!("Can't open sound set '{}': {e}; staying silent", strip_prefix(name));
        Box::new(SilentSoundSet)
    })
}

pub enum DispatchStrategy {
    /// Play the key that was pressed.
    Straight,
    /// Play the melody's next note, whatever key was pressed.
    Melodic(Box<dyn MelodyPlayer>),
}

impl DispatchStrategy {
    pub fn is_melodic(&self) -> bool {
        matches!(self, DispatchStrategy::Melodic(_))
    }
}

/// Turns key-downs into sounds. Key-ups are ignored: samples ring out and may overlap.
pub struct SoundDispatch {
    sound_set: Box<dyn SoundSet>,
    strategy: DispatchStrategy,
}

impl SoundDispatch {
    pub fn new(sound_set: Box<dyn SoundSet>, strategy: DispatchStrategy) -> Self {
        Self {
            sound_set,
            strategy,
        }
    }

    pub fn sound_set_name(&self) -> &str {
        self.sound_set.name()
    }

    pub fn set_sound_set(&mut self, sound_set: Box<dyn SoundSet>) {
        log::info!(
            "Sound set '{}' replaced by '{}'",
            self.sound_set.name(),
            sound_set.name()
        );
        self.sound_set = sound_set;
    }

    pub fn strategy(&self) -> &DispatchStrategy {
        &self.strategy
    }

    pub fn set_strategy(&mut self, strategy: DispatchStrategy) {
        self.strategy = strategy;
    }

    fn note_for(&mut self, key: KeyIdx) -> Option<KeyIdx> {
        match &mut self.strategy {
            DispatchStrategy::Straight => Some(key),
            DispatchStrategy::Melodic(player) => {
                if !player.has_next_note() {
                    player.reset();
                }
                match player.next_note() {
                    Ok(note) => Some(note),
                    Err(e) => {
                        log::warn!("Melodic dispatch skipped key {}: {e}", key.0);
                        None
                    }
                }
            }
        }
    }
}

impl PianoListener for SoundDispatch {
    fn on_key_down(&mut self, key: KeyIdx) {
        if let Some(note) = self.note_for(key) {
            self.sound_set.play_note(note);
        }
    }

    fn on_key_up(&mut self, _key: KeyIdx) {}
}
