use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use beep_core::consts::TICK_PERIOD_US;
use beep_core::{BuzzerTrait, Level, Mailbox, OutputDriver, Player, Request, Status};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

/// How often `wait_for_completion` looks at the mailbox.
const WAIT_POLL: Duration = Duration::from_millis(5);

const SAMPLE_RATE: u32 = 48000;

// Endless square wave, gated on and off by the sink
struct SquareWave {
    frequency: f32,
    sample_rate: u32,
    current_sample: u64,
}

impl SquareWave {
    fn new(frequency: f32, sample_rate: u32) -> Self {
        Self {
            frequency,
            sample_rate,
            current_sample: 0,
        }
    }
}

impl Iterator for SquareWave {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample_position = self.current_sample as f32 / self.sample_rate as f32;
        let cycle_position = (sample_position * self.frequency) % 1.0;

        self.current_sample = (self.current_sample + 1) % self.sample_rate as u64;

        // Square wave: high for first half of cycle, low for second half
        if cycle_position < 0.5 {
            Some(0.15) // Amplitude
        } else {
            Some(-0.15)
        }
    }
}

impl Source for SquareWave {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Piezo stand-in: a paused sink playing a square wave, unpaused while on.
pub struct AudioOutput {
    // dropping the stream silences the sink
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
}

impl AudioOutput {
    pub fn new(tone_hz: u32) -> anyhow::Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| anyhow!("Failed to open audio output: {e}"))?;
        let sink = Sink::try_new(&handle).map_err(|e| anyhow!("Failed to create audio sink: {e}"))?;

        sink.pause();
        sink.append(SquareWave::new(tone_hz as f32, SAMPLE_RATE));

        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
        })
    }
}

impl OutputDriver for AudioOutput {
    fn on(&mut self) {
        self.sink.play();
    }

    fn off(&mut self) {
        self.sink.pause();
    }
}

/// Output of the simulated board: an optional speaker plus a lamp the UI reads.
pub struct SimOutput {
    audio: Option<AudioOutput>,
    lamp: Arc<AtomicBool>,
    level: Level,
}

impl SimOutput {
    pub fn new(lamp: Arc<AtomicBool>, audio: Option<AudioOutput>) -> Self {
        Self {
            audio,
            lamp,
            level: Level::Off,
        }
    }

    /// Opens the default audio device unless `mute` is set. A missing device
    /// leaves the output silent rather than failing.
    pub fn open(lamp: Arc<AtomicBool>, mute: bool, tone_hz: u32) -> Self {
        let audio = if mute {
            None
        } else {
            match AudioOutput::new(tone_hz) {
                Ok(audio) => {
                    log::info!("Audio output ready ({}Hz tone)", tone_hz);
                    Some(audio)
                }
                Err(e) => {
                    log::warn!("{e:#}, running silent");
                    None
                }
            }
        };
        Self::new(lamp, audio)
    }

    fn drive(&mut self, level: Level) {
        if level != self.level {
            log::trace!("Buzzer {:?}", level);
            self.level = level;
        }
        self.lamp.store(level.is_on(), Ordering::Relaxed);
        if let Some(audio) = self.audio.as_mut() {
            audio.set_level(level);
        }
    }
}

impl OutputDriver for SimOutput {
    fn on(&mut self) {
        self.drive(Level::On);
    }

    fn off(&mut self) {
        self.drive(Level::Off);
    }
}

/// Stand-in for the 16 Hz timer interrupt: a thread that owns the player.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    worker_thread: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns the tick thread. The output is built on that thread, so it does
    /// not have to be `Send` (audio streams are not).
    pub fn spawn<O, F>(mailbox: &'static Mailbox, make_output: F) -> anyhow::Result<Self>
    where
        O: OutputDriver,
        F: FnOnce() -> O + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = Arc::clone(&stop);

        let worker_thread = thread::Builder::new()
            .name("buzzer_tick".to_string())
            .spawn(move || tick_thread(mailbox, make_output(), &stop_thread))
            .context("Failed to spawn buzzer tick thread")?;

        Ok(Self {
            stop,
            worker_thread: Some(worker_thread),
        })
    }

    /// Stops ticking; the output is left off.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker_thread) = self.worker_thread.take() {
            if worker_thread.join().is_err() {
                log::error!("Buzzer tick thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_thread<O: OutputDriver>(mailbox: &'static Mailbox, output: O, stop: &AtomicBool) {
    let period = Duration::from_micros(TICK_PERIOD_US as u64);
    let mut player = Player::new(mailbox, output);
    let mut deadline = Instant::now();

    log::info!("Buzzer ticking every {:?}", period);

    while !stop.load(Ordering::Relaxed) {
        player.tick();

        // Schedule against the previous deadline so the rate does not drift
        deadline += period;
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        } else {
            log::warn!("Buzzer tick overran by {:?}", now - deadline);
            deadline = now;
        }
    }

    player.release();
}

/// Request side of the simulated buzzer.
#[derive(Clone, Copy)]
pub struct DesktopBuzzer {
    mailbox: &'static Mailbox,
}

impl DesktopBuzzer {
    pub fn new(mailbox: &'static Mailbox) -> Self {
        Self { mailbox }
    }

    pub fn status(&self) -> Status {
        self.mailbox.status()
    }
}

impl BuzzerTrait for DesktopBuzzer {
    fn submit(&self, request: Request) {
        log::info!(
            "Buzzer: pattern {:#010x} x{} ({}ms)",
            request.pattern,
            request.repetitions,
            request.total_ticks() * TICK_PERIOD_US / 1000
        );
        self.mailbox.post(request);
    }

    fn is_idle(&self) -> bool {
        self.mailbox.is_idle()
    }

    // There is a scheduler here, so sleep instead of spinning
    fn wait_for_completion(&self) {
        while !self.is_idle() {
            thread::sleep(WAIT_POLL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beep_core::output::Recorder;
    use std::sync::Mutex;

    struct SharedRecorder(Arc<Mutex<Recorder<64>>>);

    impl OutputDriver for SharedRecorder {
        fn on(&mut self) {
            self.0.lock().unwrap().on();
        }

        fn off(&mut self) {
            self.0.lock().unwrap().off();
        }
    }

    #[test]
    fn test_ticker_plays_and_stops() {
        static MAILBOX: Mailbox = Mailbox::new();

        let recorder = Arc::new(Mutex::new(Recorder::new()));
        let output = SharedRecorder(Arc::clone(&recorder));
        let mut ticker = Ticker::spawn(&MAILBOX, move || output).unwrap();
        let buzzer = DesktopBuzzer::new(&MAILBOX);

        buzzer.beep(125);
        buzzer.wait_for_completion();
        assert!(buzzer.status().is_idle());
        ticker.stop();

        let recorder = recorder.lock().unwrap();
        let on = recorder.levels().iter().filter(|level| level.is_on()).count();
        assert_eq!(on, 2);
        assert_eq!(recorder.last(), Level::Off);
    }

    #[test]
    fn test_sim_output_drives_lamp() {
        let lamp = Arc::new(AtomicBool::new(true));
        let mut output = SimOutput::new(Arc::clone(&lamp), None);

        output.off();
        assert!(!lamp.load(Ordering::Relaxed));
        output.set_level(Level::On);
        assert!(lamp.load(Ordering::Relaxed));
    }

    #[test]
    fn test_square_wave_alternates() {
        // 48 samples per cycle
        let samples: Vec<f32> = SquareWave::new(1000.0, SAMPLE_RATE).take(96).collect();
        assert_eq!(samples[0], 0.15);
        assert_eq!(samples[12], 0.15);
        assert_eq!(samples[36], -0.15);
        assert_eq!(samples[60], 0.15);
        assert_eq!(samples[84], -0.15);
    }
}
