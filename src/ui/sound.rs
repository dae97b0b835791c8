/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// One-shot cues are fire-and-forget; the siren and the flee warble run on a
/// single looping channel that is swapped or stopped as the chase changes.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

/// Every sound the game can make.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Eat,
    Bonus,
    Death,
    PortalFire,
    PortalOpen,
    PortalTravel,
    Capture,
    Transition,
    /// Looping background while pursuers hunt.
    Siren,
    /// Looping background while pursuers flee.
    Flee,
}

#[cfg(feature = "sound")]
mod inner {
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    /// Pre-generated WAV buffers for each cue.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<(Cue, Arc<Vec<u8>>)>,
        looping: RefCell<Option<(Cue, Sink)>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "no audio output, continuing silently");
                    return None;
                }
            };

            // ── Generate all sound buffers ──
            let buffers = vec![
                (Cue::Eat, Arc::new(make_wav(&gen_eat()))),
                (Cue::Bonus, Arc::new(make_wav(&gen_bonus()))),
                (Cue::Death, Arc::new(make_wav(&gen_death()))),
                (Cue::PortalFire, Arc::new(make_wav(&gen_portal_fire()))),
                (Cue::PortalOpen, Arc::new(make_wav(&gen_portal_open()))),
                (Cue::PortalTravel, Arc::new(make_wav(&gen_portal_travel()))),
                (Cue::Capture, Arc::new(make_wav(&gen_capture()))),
                (Cue::Transition, Arc::new(make_wav(&gen_transition()))),
                (Cue::Siren, Arc::new(make_wav(&gen_siren()))),
                (Cue::Flee, Arc::new(make_wav(&gen_flee()))),
            ];

            Some(SoundEngine {
                _stream: stream,
                handle,
                buffers,
                looping: RefCell::new(None),
            })
        }

        fn buffer(&self, cue: Cue) -> Option<&Arc<Vec<u8>>> {
            self.buffers.iter().find(|(c, _)| *c == cue).map(|(_, b)| b)
        }

        fn decoder(&self, cue: Cue) -> Option<rodio::Decoder<Cursor<Vec<u8>>>> {
            let buf = self.buffer(cue)?;
            rodio::Decoder::new(Cursor::new(buf.as_ref().clone())).ok()
        }

        /// Fire-and-forget one-shot.
        pub fn play(&self, cue: Cue) {
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            if let Some(src) = self.decoder(cue) {
                sink.append(src);
                sink.detach();
            }
        }

        /// Start `cue` on the loop channel unless it is already playing there.
        pub fn play_loop(&self, cue: Cue) {
            let mut slot = self.looping.borrow_mut();
            if matches!(slot.as_ref(), Some((current, _)) if *current == cue) {
                return;
            }
            if let Some((_, old)) = slot.take() {
                old.stop();
            }
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            if let Some(src) = self.decoder(cue) {
                sink.append(src.repeat_infinite());
                *slot = Some((cue, sink));
            }
        }

        pub fn stop_loop(&self) {
            if let Some((_, sink)) = self.looping.borrow_mut().take() {
                sink.stop();
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn sample_count(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Sequence of notes, each with a soft decay.
    fn gen_notes(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = sample_count(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.5;
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Frequency sweep from `from` to `to` Hz.
    fn gen_sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = sample_count(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.5);
                (phase * TAU).sin() * env * volume
            })
            .collect()
    }

    /// Pellet: two-tone chomp
    fn gen_eat() -> Vec<f32> {
        gen_notes(&[(520.0, 0.03), (390.0, 0.03)], 0.2)
    }

    /// Bonus pellet: bright arpeggio C6→E6→G6
    fn gen_bonus() -> Vec<f32> {
        gen_notes(&[(1047.0, 0.045), (1319.0, 0.045), (1568.0, 0.06)], 0.25)
    }

    /// Death: long falling warble
    fn gen_death() -> Vec<f32> {
        let n = sample_count(1.1);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let wobble = (t * 40.0 * TAU).sin() * 60.0;
                let freq = 700.0 - t * 550.0 + wobble;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t) * 0.3
            })
            .collect()
    }

    fn gen_portal_fire() -> Vec<f32> {
        gen_sweep(300.0, 1400.0, 0.1, 0.2)
    }

    fn gen_portal_open() -> Vec<f32> {
        gen_notes(&[(880.0, 0.05), (1175.0, 0.08)], 0.22)
    }

    fn gen_portal_travel() -> Vec<f32> {
        let mut samples = gen_sweep(1500.0, 400.0, 0.08, 0.25);
        samples.extend(gen_sweep(400.0, 1500.0, 0.08, 0.25));
        samples
    }

    /// Pursuer captured: rising swoop
    fn gen_capture() -> Vec<f32> {
        gen_sweep(200.0, 1800.0, 0.25, 0.3)
    }

    /// Level banner: ascending fanfare C5→E5→G5→C6
    fn gen_transition() -> Vec<f32> {
        gen_notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3)
    }

    /// One cycle of the siren: up and back down
    fn gen_siren() -> Vec<f32> {
        let n = sample_count(0.5);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 450.0 + (t * TAU).sin().abs() * 250.0;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * 0.12
            })
            .collect()
    }

    /// One cycle of the flee warble: fast low wobble
    fn gen_flee() -> Vec<f32> {
        let n = sample_count(0.25);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 + (t * 4.0 * TAU).sin() * 80.0;
                phase += freq / SAMPLE_RATE as f32;
                let square = if (phase * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                square * 0.08
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let samples = gen_eat();
            let wav = make_wav(&samples);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + samples.len() * 2);
        }

        #[test]
        fn loops_are_short_cycles() {
            assert!(gen_siren().len() < SAMPLE_RATE as usize);
            assert!(gen_flee().len() < gen_siren().len());
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: Cue) {}
    pub fn play_loop(&self, _cue: Cue) {}
    pub fn stop_loop(&self) {}
}
