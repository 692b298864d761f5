use crate::notes::{KeyIdx, MidiNote};
use crate::sound::{sample_for, SoundSet, SoundSetError, SYNTH};
use crate::synth::ToySynth;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

/// Sound set that plays keys on the built-in synth through the default audio device.
pub struct SynthSoundSet {
    tx: Sender<MidiNote>,
    // Keep stream alive; dropping it closes the device.
    _stream: cpal::Stream,
}

impl SynthSoundSet {
    pub fn new(a4_tuning_hz: u16) -> Result<Self, SoundSetError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| SoundSetError::NoDevice("no default output device".into()))?;

        let supported = device
            .default_output_config()
            .map_err(|e| SoundSetError::NoDevice(format!("default_output_config: {e}")))?;

        let (tx, rx) = crossbeam_channel::unbounded();

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let synth = ToySynth::new(sample_rate, a4_tuning_hz);
        log::info!(
            "Synth on {sample_rate} Hz, {channels} ch, A4 = {} Hz",
            synth.a4_tuning_hz()
        );

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                build_stream::<f32>(&device, &supported.into(), rx, synth, channels, |s, out, ch| {
                    s.render_f32_interleaved(out, ch)
                })?
            }
            cpal::SampleFormat::I16 => {
                build_stream::<i16>(&device, &supported.into(), rx, synth, channels, |s, out, ch| {
                    s.render_i16_interleaved(out, ch)
                })?
            }
            other => {
                return Err(SoundSetError::Stream(format!(
                    "unsupported sample format: {other:?}"
                )))
            }
        };

        Ok(Self {
            tx,
            _stream: stream,
        })
    }
}

impl SoundSet for SynthSoundSet {
    fn name(&self) -> &str {
        SYNTH
    }

    fn play_note(&mut self, key: KeyIdx) {
        let Some(key) = sample_for(key) else {
            return;
        };
        let Some(midi) = key.to_midi() else {
            log::debug!("Key {} is a placeholder; nothing to play", key.0);
            return;
        };
        let _ = self.tx.send(midi);
    }
}

fn build_stream<T: cpal::SizedSample + 'static>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<MidiNote>,
    mut synth: ToySynth,
    channels: usize,
    render: fn(&mut ToySynth, &mut [T], usize),
) -> Result<cpal::Stream, SoundSetError> {
    let err_fn = |e| log::error!("cpal stream error: {e}");

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _| {
                while let Ok(midi) = rx.try_recv() {
                    synth.strike(midi);
                }
                render(&mut synth, data, channels);
            },
            err_fn,
            None,
        )
        .map_err(|e| SoundSetError::Stream(format!("build_output_stream: {e}")))?;

    stream
        .play()
        .map_err(|e| SoundSetError::Stream(format!("stream.play: {e}")))?;

    Ok(stream)
}
