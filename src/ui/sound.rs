/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

/// Background loop selector. At most one loop plays at a time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoopCue {
    /// Two-tone siren while play is running.
    Siren,
    /// Faster wobble while any enemy is frightened.
    Fright,
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use super::LoopCue;

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_chomp_a: Arc<Vec<u8>>,
        sfx_chomp_b: Arc<Vec<u8>>,
        sfx_power: Arc<Vec<u8>>,
        sfx_eat_enemy: Arc<Vec<u8>>,
        sfx_extra_life: Arc<Vec<u8>>,
        sfx_death: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
        sfx_game_over: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
        sfx_ready: Arc<Vec<u8>>,
        loop_siren: Arc<Vec<u8>>,
        loop_fright: Arc<Vec<u8>>,
        chomp_flip: AtomicBool,
        loop_sink: Mutex<Option<(LoopCue, Sink)>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_chomp_a: Arc::new(make_wav(&gen_chomp(440.0))),
                sfx_chomp_b: Arc::new(make_wav(&gen_chomp(330.0))),
                sfx_power: Arc::new(make_wav(&gen_power())),
                sfx_eat_enemy: Arc::new(make_wav(&gen_eat_enemy())),
                sfx_extra_life: Arc::new(make_wav(&gen_extra_life())),
                sfx_death: Arc::new(make_wav(&gen_death())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
                sfx_game_over: Arc::new(make_wav(&gen_game_over())),
                sfx_win: Arc::new(make_wav(&gen_win())),
                sfx_ready: Arc::new(make_wav(&gen_ready())),
                loop_siren: Arc::new(make_wav(&gen_siren())),
                loop_fright: Arc::new(make_wav(&gen_fright())),
                chomp_flip: AtomicBool::new(false),
                loop_sink: Mutex::new(None),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        /// Pellet chomp, alternating between two pitches like the arcade.
        pub fn play_chomp(&self) {
            let flip = self.chomp_flip.fetch_xor(true, Ordering::Relaxed);
            if flip {
                self.play(&self.sfx_chomp_a);
            } else {
                self.play(&self.sfx_chomp_b);
            }
        }

        pub fn play_power(&self) { self.play(&self.sfx_power); }
        pub fn play_eat_enemy(&self) { self.play(&self.sfx_eat_enemy); }
        pub fn play_extra_life(&self) { self.play(&self.sfx_extra_life); }
        pub fn play_death(&self) { self.play(&self.sfx_death); }
        pub fn play_clear(&self) { self.play(&self.sfx_clear); }
        pub fn play_game_over(&self) { self.play(&self.sfx_game_over); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
        pub fn play_ready(&self) { self.play(&self.sfx_ready); }

        /// Start, switch or stop the background loop. Idempotent: the
        /// running loop is only restarted when the cue changes.
        pub fn set_loop(&self, cue: Option<LoopCue>) {
            let mut slot = match self.loop_sink.lock() {
                Ok(s) => s,
                Err(_) => return,
            };
            if slot.as_ref().map(|(running, _)| *running) == cue {
                return;
            }
            if let Some((_, sink)) = slot.take() {
                sink.stop();
            }
            let cue = match cue {
                Some(c) => c,
                None => return,
            };
            let buf = match cue {
                LoopCue::Siren => &self.loop_siren,
                LoopCue::Fright => &self.loop_fright,
            };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src.repeat_infinite());
                    *slot = Some((cue, sink));
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn sine(t: f32, freq: f32) -> f32 {
        (t * freq * 2.0 * std::f32::consts::PI).sin()
    }

    /// Very short "waka" blip: a fast down-up pitch sweep.
    fn gen_chomp(base: f32) -> Vec<f32> {
        let duration = 0.06;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                // Sweep down to half pitch and back
                let freq = base * (1.0 - 0.5 * (p * std::f32::consts::PI).sin());
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - p;
                sine(t, freq) * env * 0.2
            })
            .collect()
    }

    /// Power pellet: rising sweep with a wobble.
    fn gen_power() -> Vec<f32> {
        let duration = 0.35;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 200.0 + p * 600.0 + (p * 40.0).sin() * 30.0;
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - p).powf(0.4);
                sine(t, freq) * env * 0.25
            })
            .collect()
    }

    /// Enemy eaten: fast ascending arpeggio.
    fn gen_eat_enemy() -> Vec<f32> {
        let notes = [523.0_f32, 784.0, 1047.0, 1568.0]; // C5 G5 C6 G6
        let note_dur = 0.05;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = sine(t, freq) * 0.7 + sine(t, freq * 3.0) * 0.3;
                samples.push(wave * env * 0.25);
            }
        }
        samples
    }

    /// Extra life: bright two-note chime.
    fn gen_extra_life() -> Vec<f32> {
        let pairs = [(1047.0_f32, 0.08), (1568.0, 0.2)]; // C6, G6
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = sine(t, freq) * 0.7 + sine(t, freq * 2.0) * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Death: long descending spiral.
    fn gen_death() -> Vec<f32> {
        let duration = 1.0;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 600.0 * (1.0 - p * 0.8) + (p * 60.0).sin() * 40.0 * (1.0 - p);
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - p).powf(0.7);
                sine(t, freq) * env * 0.3
            })
            .collect()
    }

    /// Level clear: ascending fanfare.
    fn gen_clear() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0]; // C5 E5 G5 C6
        let note_dur = 0.1;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = sine(t, freq) * 0.6 + sine(t, freq * 2.0) * 0.3 + sine(t, freq * 3.0) * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        // Sustain the last note
        let last = 1047.0_f32;
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - i as f32 / n as f32;
            samples.push(sine(t, last) * env * 0.3);
        }
        samples
    }

    /// Game over: slow sad descent.
    fn gen_game_over() -> Vec<f32> {
        let notes = [392.0_f32, 349.0, 311.0, 262.0]; // G4 F4 Eb4 C4
        let note_dur = 0.22;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                samples.push(sine(t, freq) * env * 0.3);
            }
        }
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for i in (total - fade_len)..total {
            let ratio = (total - i) as f32 / fade_len as f32;
            samples[i] *= ratio;
        }
        samples
    }

    /// Game won: longer triumphant fanfare.
    fn gen_win() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0, 784.0, 1047.0, 1319.0];
        let note_dur = 0.13;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = sine(t, freq) * 0.6 + sine(t, freq * 2.0) * 0.4;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Siren loop: slow rise-and-fall, one full cycle per buffer so the
    /// repeat point is seamless.
    fn gen_siren() -> Vec<f32> {
        let duration = 0.5;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 320.0 + 140.0 * (p * 2.0 * std::f32::consts::PI).sin().abs();
                let t = i as f32 / SAMPLE_RATE as f32;
                sine(t, freq) * 0.08
            })
            .collect()
    }

    /// Fright loop: the same shape, higher and twice as fast.
    fn gen_fright() -> Vec<f32> {
        let duration = 0.25;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                let freq = 520.0 + 180.0 * (p * 2.0 * std::f32::consts::PI).sin().abs();
                let t = i as f32 / SAMPLE_RATE as f32;
                sine(t, freq) * 0.08
            })
            .collect()
    }

    /// Round-start jingle.
    fn gen_ready() -> Vec<f32> {
        let notes = [659.0_f32, 523.0, 659.0, 784.0]; // E5 C5 E5 G5
        let note_dur = 0.11;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.6);
                samples.push(sine(t, freq) * env * 0.25);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_chomp(&self) {}
    pub fn play_power(&self) {}
    pub fn play_eat_enemy(&self) {}
    pub fn play_extra_life(&self) {}
    pub fn play_death(&self) {}
    pub fn play_clear(&self) {}
    pub fn play_game_over(&self) {}
    pub fn play_win(&self) {}
    pub fn play_ready(&self) {}
    pub fn set_loop(&self, _cue: Option<LoopCue>) {}
}
