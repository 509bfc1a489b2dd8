/// Sound engine: procedural chiptune effects via rodio.
///
/// Every effect is a short sequence of notes rendered once at startup
/// into an in-memory WAV buffer. Playback is fire-and-forget through a
/// detached rodio Sink.
///
/// Build without the "sound" feature to disable audio entirely; the stub
/// SoundEngine then ignores every call.

use crate::sim::event::GameEvent;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Pellet,
    FruitSpawn,
    Fruit,
    Caught,
    Cleared,
}

impl Sfx {
    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    const ALL: [Sfx; 5] = [Sfx::Pellet, Sfx::FruitSpawn, Sfx::Fruit, Sfx::Caught, Sfx::Cleared];

    /// (frequency Hz, seconds) per note.
    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    fn notes(self) -> &'static [(f32, f32)] {
        match self {
            Sfx::Pellet => &[(988.0, 0.03), (1319.0, 0.03)],
            Sfx::FruitSpawn => &[(659.0, 0.06), (784.0, 0.06)],
            Sfx::Fruit => &[(1047.0, 0.05), (1319.0, 0.05), (1568.0, 0.05), (2093.0, 0.10)],
            Sfx::Caught => &[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.30)],
            Sfx::Cleared => &[(523.0, 0.10), (659.0, 0.10), (784.0, 0.10), (1047.0, 0.35)],
        }
    }
}

/// The effect an event should trigger, if any.
pub fn sfx_for(event: &GameEvent) -> Option<Sfx> {
    match event {
        GameEvent::PelletEaten { .. } => Some(Sfx::Pellet),
        GameEvent::FruitSpawned { .. } => Some(Sfx::FruitSpawn),
        GameEvent::FruitEaten { .. } => Some(Sfx::Fruit),
        GameEvent::PlayerCaught { .. } => Some(Sfx::Caught),
        GameEvent::MazeCleared => Some(Sfx::Cleared),
        GameEvent::FruitExpired { .. }
        | GameEvent::PursuerWallFollow { .. }
        | GameEvent::PursuerStalled { .. } => None,
    }
}

/// Render a note sequence: sine plus a third harmonic, each note with a
/// square-root decay envelope.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn synth(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
    let tau = 2.0 * std::f32::consts::PI;
    let mut samples = Vec::new();
    for &(freq, dur) in notes {
        let n = (SAMPLE_RATE as f32 * dur) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).sqrt();
            let wave = (t * freq * tau).sin() * 0.7 + (t * freq * 3.0 * tau).sin() * 0.3;
            samples.push(wave * env * volume);
        }
    }
    samples
}

/// 16-bit mono PCM WAV.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn make_wav(samples: &[f32]) -> Vec<u8> {
    let data_size = samples.len() as u32 * 2;
    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    buf.extend_from_slice(&2u16.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }
    buf
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{make_wav, synth, Sfx};

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<(Sfx, Arc<Vec<u8>>)>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::info!("no audio output, sound disabled: {e}");
                    return None;
                }
            };
            let buffers = Sfx::ALL
                .into_iter()
                .map(|sfx| (sfx, Arc::new(make_wav(&synth(sfx.notes(), 0.25)))))
                .collect();
            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some((_, buf)) = self.buffers.iter().find(|(s, _)| *s == sfx) else { return };
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.append(src);
                    sink.detach();
                }
                Err(e) => tracing::debug!(?sfx, "could not decode effect: {e}"),
            }
        }
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

impl SoundEngine {
    pub fn play_events(&self, events: &[GameEvent]) {
        for sfx in events.iter().filter_map(sfx_for) {
            self.play(sfx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pickup::FruitKind;

    #[test]
    fn events_map_to_effects() {
        assert_eq!(sfx_for(&GameEvent::PelletEaten { points: 10 }), Some(Sfx::Pellet));
        assert_eq!(sfx_for(&GameEvent::MazeCleared), Some(Sfx::Cleared));
        assert_eq!(sfx_for(&GameEvent::FruitExpired { kind: FruitKind::Apple }), None);
        assert_eq!(sfx_for(&GameEvent::PursuerStalled { id: 0 }), None);
    }

    #[test]
    fn wav_header_and_length() {
        let samples = synth(Sfx::Pellet.notes(), 0.25);
        // 0.03 s twice at 22050 Hz
        assert_eq!(samples.len(), 2 * 661);
        assert!(samples.iter().all(|s| s.abs() <= 0.26));

        let wav = make_wav(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);
    }
}
