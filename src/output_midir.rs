use std::collections::BTreeSet;

use crate::notes::{KeyIdx, MidiNote};
use crate::sound::{sample_for, SoundSet, SoundSetError, MIDI};

use midir::{MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "PianOli";
const PORT_NAME: &str = "PianOli Output";
const VELOCITY: u8 = 100;

/// Sound set that sends every key as a MIDI note, for an external synth to play.
pub struct MidiSoundSet {
    conn: MidiOutputConnection,
    channel: u8,
    // Notes we have struck, so they can be silenced on close.
    sounded: BTreeSet<u8>,
}

impl MidiSoundSet {
    /// Opens a virtual port where the platform has them, else the first hardware port.
    pub fn connect() -> Result<Self, SoundSetError> {
        let conn = open_connection()?;
        Ok(Self::with_connection(conn, 0))
    }

    pub fn with_connection(conn: MidiOutputConnection, channel: u8) -> Self {
        Self {
            conn,
            channel: channel & 0x0F,
            sounded: BTreeSet::new(),
        }
    }

    fn send(&mut self, msg: [u8; 3]) {
        if let Err(e) = self.conn.send(&msg) {
            log::error!("MIDI send failed: {e}");
        }
    }
}

#[cfg(unix)]
fn open_connection() -> Result<MidiOutputConnection, SoundSetError> {
    use midir::os::unix::VirtualOutput;

    let midi_out = new_output()?;
    match midi_out.create_virtual(PORT_NAME) {
        Ok(conn) => {
            log::info!("Created virtual MIDI port '{PORT_NAME}'");
            Ok(conn)
        }
        Err(e) => {
            log::warn!("Virtual MIDI port failed ({e}); trying hardware ports");
            connect_first_port()
        }
    }
}

#[cfg(not(unix))]
fn open_connection() -> Result<MidiOutputConnection, SoundSetError> {
    connect_first_port()
}

fn new_output() -> Result<MidiOutput, SoundSetError> {
    MidiOutput::new(CLIENT_NAME).map_err(|e| SoundSetError::NoDevice(format!("MIDI init: {e}")))
}

fn connect_first_port() -> Result<MidiOutputConnection, SoundSetError> {
    let midi_out = new_output()?;
    let ports = midi_out.ports();
    let port = ports
        .first()
        .ok_or_else(|| SoundSetError::NoDevice("no MIDI output ports".into()))?;
    let name = midi_out
        .port_name(port)
        .unwrap_or_else(|_| "<unnamed>".to_string());
    log::info!("Connecting to MIDI port '{name}'");
    midi_out
        .connect(port, PORT_NAME)
        .map_err(|e| SoundSetError::Stream(format!("MIDI connect: {e}")))
}

impl SoundSet for MidiSoundSet {
    fn name(&self) -> &str {
        MIDI
    }

    fn play_note(&mut self, key: KeyIdx) {
        let Some(MidiNote(note)) = sample_for(key).and_then(KeyIdx::to_midi) else {
            return;
        };
        // Off first, so a note still ringing is struck again rather than ignored.
        self.send([0x80 | self.channel, note, 0]);
        self.send([0x90 | self.channel, note, VELOCITY]);
        self.sounded.insert(note);
    }
}

impl Drop for MidiSoundSet {
    fn drop(&mut self) {
        let notes: Vec<u8> = std::mem::take(&mut self.sounded).into_iter().collect();
        for note in notes {
            self.send([0x80 | self.channel, note, 0]);
        }
    }
}
