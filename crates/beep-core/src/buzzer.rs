use crate::consts::{MAX_BEEP_MS, MAX_BEEP_TIMES_MS};
use crate::engine::PlaybackState;
use crate::mailbox::Mailbox;
use crate::output::{Level, OutputDriver};
use crate::pattern::Request;

/// Platform-agnostic request side of the buzzer.
///
/// None of the submit calls block; each one replaces whatever request is still
/// waiting for the player. A pattern already playing always runs to the end.
pub trait BuzzerTrait {
    fn submit(&self, request: Request);

    /// Nothing pending and nothing playing.
    fn is_idle(&self) -> bool;

    /// Sounds once for `duration_ms`, saturating at [`MAX_BEEP_MS`].
    fn beep(&self, duration_ms: u16) {
        if duration_ms > MAX_BEEP_MS {
            log::warn!("Beep of {}ms clamped to {}ms", duration_ms, MAX_BEEP_MS);
        }
        self.submit(Request::beep(duration_ms));
    }

    /// Sounds `n` times, `duration_ms` on then `duration_ms` off, saturating
    /// at [`MAX_BEEP_TIMES_MS`].
    fn beep_times(&self, n: u8, duration_ms: u16) {
        if duration_ms > MAX_BEEP_TIMES_MS {
            log::warn!(
                "Repeated beep of {}ms clamped to {}ms",
                duration_ms,
                MAX_BEEP_TIMES_MS
            );
        }
        self.submit(Request::beep_times(n, duration_ms));
    }

    /// Plays `pattern` once, one bit per tick from its highest set bit down.
    fn beep_pattern(&self, pattern: u32) {
        self.submit(Request::pattern(pattern));
    }

    /// Blocks until the buzzer has gone quiet.
    ///
    /// Busy-waits, which is all a bare-metal caller can do. Targets with a
    /// scheduler should override this to sleep or yield between polls.
    fn wait_for_completion(&self) {
        while !self.is_idle() {
            core::hint::spin_loop();
        }
    }
}

impl BuzzerTrait for Mailbox {
    fn submit(&self, request: Request) {
        self.post(request);
    }

    fn is_idle(&self) -> bool {
        Mailbox::is_idle(self)
    }
}

/// Tick side of the buzzer: owns the playback state and the output.
pub struct Player<'a, O> {
    mailbox: &'a Mailbox,
    state: PlaybackState,
    output: O,
}

impl<'a, O: OutputDriver> Player<'a, O> {
    /// Drives the output off and waits for requests on `mailbox`.
    pub fn new(mailbox: &'a Mailbox, mut output: O) -> Self {
        output.off();
        Self {
            mailbox,
            state: PlaybackState::Idle,
            output,
        }
    }

    /// Plays one tick. Call this at [`TICK_RATE_HZ`](crate::consts::TICK_RATE_HZ).
    pub fn tick(&mut self) -> Level {
        let mailbox = self.mailbox;
        let was_idle = self.state.is_idle();
        let mut loaded = None;

        let (next, level) = self.state.step(|| {
            loaded = mailbox.take();
            loaded
        });

        let mut started = false;
        if let Some(request) = loaded {
            if request.is_silent() {
                log::debug!("Ignored silent request x{}", request.repetitions);
            } else {
                log::debug!(
                    "Playing pattern {:#010x} x{}",
                    request.pattern,
                    request.repetitions
                );
                started = true;
            }
        }
        if (started || !was_idle) && next.is_idle() {
            log::debug!("Playback finished");
        }

        mailbox.publish_remaining(next.remaining());
        self.state = next;
        self.output.set_level(level);
        level
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Drives the output off and hands it back.
    pub fn release(mut self) -> O {
        self.output.off();
        self.output
    }
}
