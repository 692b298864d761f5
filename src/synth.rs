use std::ops::RangeInclusive;

use crate::notes::MidiNote;

/// Accepted reference pitches for A4, in Hz.
pub const A4_TUNING_RANGE: RangeInclusive<u16> = 430..=450;

/// Overtone multiples and their levels. A soft, toy-piano like timbre.
const PARTIALS: [(f32, f32); 3] = [(1.0, 1.0), (2.0, 0.35), (3.0, 0.12)];

const MAX_VOICES: usize = 12;
const VOICE_AMP: f32 = 0.15;
/// Decay time constant, seconds.
const TAU_S: f32 = 0.6;

pub fn clamp_a4_tuning(a4_tuning_hz: u16) -> u16 {
    a4_tuning_hz.clamp(*A4_TUNING_RANGE.start(), *A4_TUNING_RANGE.end())
}

#[derive(Clone, Copy, Debug)]
struct Voice {
    midi: MidiNote,
    age: u64,
    phase: f32,
    phase_inc: f32,
}

/// Struck, freely decaying tones. There is no note-off: a note rings until it fades out or
/// is struck again.
pub struct ToySynth {
    sample_rate_hz: f32,
    a4_tuning_hz: f32,
    voices: Vec<Voice>,
}

impl ToySynth {
    pub fn new(sample_rate_hz: u32, a4_tuning_hz: u16) -> Self {
        Self {
            sample_rate_hz: sample_rate_hz.max(1) as f32,
            a4_tuning_hz: clamp_a4_tuning(a4_tuning_hz) as f32,
            voices: Vec::new(),
        }
    }

    pub fn a4_tuning_hz(&self) -> u16 {
        self.a4_tuning_hz.round() as u16
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn strike(&mut self, midi: MidiNote) {
        let freq_hz = midi_to_hz(midi.0 as f32, self.a4_tuning_hz);
        let voice = Voice {
            midi,
            age: 0,
            phase: 0.0,
            phase_inc: 2.0 * std::f32::consts::PI * freq_hz / self.sample_rate_hz,
        };

        // Striking a ringing note restarts it instead of stacking a copy.
        if let Some(v) = self.voices.iter_mut().find(|v| v.midi == midi) {
            *v = voice;
            return;
        }

        if self.voices.len() >= MAX_VOICES {
            if let Some(oldest) = (0..self.voices.len()).max_by_key(|&i| self.voices[i].age) {
                self.voices.swap_remove(oldest);
            }
        }
        self.voices.push(voice);
    }

    fn envelope(&self, age: u64) -> f32 {
        const ATTACK_S: f32 = 0.003;

        let age_s = age as f32 / self.sample_rate_hz;
        (age_s / ATTACK_S).min(1.0) * (-age_s / TAU_S).exp()
    }

    fn render_sample(&mut self) -> f32 {
        const SILENCE: f32 = 1.0e-4;
        let nyquist_phase = std::f32::consts::PI;

        let mut acc = 0.0f32;
        for i in 0..self.voices.len() {
            let env = self.envelope(self.voices[i].age);
            let v = &mut self.voices[i];

            let mut s = 0.0f32;
            for (mult, level) in PARTIALS {
                if v.phase_inc * mult < nyquist_phase {
                    s += level * (mult * v.phase).sin();
                }
            }
            acc += VOICE_AMP * env * s;

            v.age += 1;
            v.phase += v.phase_inc;
            if v.phase >= 2.0 * std::f32::consts::PI {
                v.phase -= 2.0 * std::f32::consts::PI;
            }
        }

        if self.voices.first().is_some_and(|v| v.age & 0xFF == 0) {
            let sr = self.sample_rate_hz;
            self.voices.retain(|v| {
                let age_s = v.age as f32 / sr;
                VOICE_AMP * (-age_s / TAU_S).exp() > SILENCE
            });
        }

        // Soft limit, several voices can pile up.
        acc / (1.0 + acc.abs())
    }

    pub fn render_f32_interleaved(&mut self, out: &mut [f32], channels: usize) {
        for frame in out.chunks_exact_mut(channels.max(1)) {
            let s = self.render_sample();
            frame.fill(s);
        }
    }

    pub fn render_i16_interleaved(&mut self, out: &mut [i16], channels: usize) {
        for frame in out.chunks_exact_mut(channels.max(1)) {
            let s = (self.render_sample() * i16::MAX as f32) as i16;
            frame.fill(s);
        }
    }
}

fn midi_to_hz(midi: f32, a4_tuning_hz: f32) -> f32 {
    a4_tuning_hz * 2.0f32.powf((midi - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strike_produces_audio() {
        let mut s = ToySynth::new(48_000, 440);
        s.strike(MidiNote(60));

        let mut buf = [0.0f32; 512];
        s.render_f32_interleaved(&mut buf, 1);
        assert!(buf.iter().any(|&x| x != 0.0));
        assert!(buf.iter().all(|&x| x.abs() < 1.0));

        let mut buf = [0i16; 512];
        s.render_i16_interleaved(&mut buf, 2);
        assert!(buf.iter().any(|&x| x != 0));
        assert!(buf.chunks(2).all(|f| f[0] == f[1]));
    }

    #[test]
    fn notes_ring_out_on_their_own() {
        let mut s = ToySynth::new(8_000, 440);
        s.strike(MidiNote(72));
        assert_eq!(s.active_voices(), 1);

        let mut buf = vec![0.0f32; 8_000 * 5];
        s.render_f32_interleaved(&mut buf, 1);
        assert_eq!(s.active_voices(), 0);
        assert!(buf[buf.len() - 100..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn restriking_does_not_stack() {
        let mut s = ToySynth::new(48_000, 440);
        s.strike(MidiNote(64));
        s.strike(MidiNote(64));
        assert_eq!(s.active_voices(), 1);

        for n in 0..40 {
            s.strike(MidiNote(40 + n));
        }
        assert_eq!(s.active_voices(), MAX_VOICES);
    }

    #[test]
    fn tuning_is_clamped() {
        assert_eq!(ToySynth::new(48_000, 432).a4_tuning_hz(), 432);
        assert_eq!(ToySynth::new(48_000, 1000).a4_tuning_hz(), 450);
        assert_eq!(ToySynth::new(48_000, 0).a4_tuning_hz(), 430);
    }

    #[test]
    fn a4_is_in_tune() {
        assert!((midi_to_hz(69.0, 440.0) - 440.0).abs() < 1e-3);
        assert!((midi_to_hz(81.0, 440.0) - 880.0).abs() < 1e-2);
        assert!((midi_to_hz(60.0, 440.0) - 261.63).abs() < 1e-1);
    }
}
