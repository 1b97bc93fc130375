use embedded_hal::digital::{Error as _, OutputPin};

/// Level of the buzzer output for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    #[default]
    Off,
    On,
}

impl Level {
    pub fn is_on(self) -> bool {
        self == Level::On
    }
}

impl From<bool> for Level {
    fn from(on: bool) -> Self {
        if on { Level::On } else { Level::Off }
    }
}

/// Platform-agnostic two-state output the player drives once per tick.
///
/// Implementations must be idempotent: setting the level it already has is
/// harmless and expected on every idle tick.
pub trait OutputDriver {
    fn on(&mut self);
    fn off(&mut self);

    fn set_level(&mut self, level: Level) {
        match level {
            Level::On => self.on(),
            Level::Off => self.off(),
        }
    }
}

impl<O: OutputDriver + ?Sized> OutputDriver for &mut O {
    fn on(&mut self) {
        (**self).on();
    }

    fn off(&mut self) {
        (**self).off();
    }
}

/// Buzzer wired directly to a GPIO pin, driven high to sound.
pub struct PinOutput<P> {
    pin: P,
}

impl<P: OutputPin> PinOutput<P> {
    /// Takes a pin already configured as a push-pull output and drives it low.
    pub fn new(pin: P) -> Self {
        let mut output = Self { pin };
        output.off();
        output
    }

    /// Gives the pin back, leaving it at whatever level it was last driven to.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> OutputDriver for PinOutput<P> {
    fn on(&mut self) {
        if let Err(e) = self.pin.set_high() {
            log::warn!("Buzzer pin set_high failed: {:?}", e.kind());
        }
    }

    fn off(&mut self) {
        if let Err(e) = self.pin.set_low() {
            log::warn!("Buzzer pin set_low failed: {:?}", e.kind());
        }
    }
}

/// Output that remembers every level it was set to, up to `N` of them.
///
/// Lets the player run on a host without hardware. Levels past capacity are
/// dropped and counted in [`Recorder::overflowed`].
#[derive(Debug, Default)]
pub struct Recorder<const N: usize> {
    levels: heapless::Vec<Level, N>,
    overflowed: usize,
}

impl<const N: usize> Recorder<N> {
    pub const fn new() -> Self {
        Self {
            levels: heapless::Vec::new(),
            overflowed: 0,
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Most recent level, `Off` before anything was recorded.
    pub fn last(&self) -> Level {
        self.levels.last().copied().unwrap_or_default()
    }

    pub fn overflowed(&self) -> usize {
        self.overflowed
    }

    pub fn clear(&mut self) {
        self.levels.clear();
        self.overflowed = 0;
    }

    fn record(&mut self, level: Level) {
        if self.levels.push(level).is_err() {
            self.overflowed += 1;
        }
    }
}

impl<const N: usize> OutputDriver for Recorder<N> {
    fn on(&mut self) {
        self.record(Level::On);
    }

    fn off(&mut self) {
        self.record(Level::Off);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    #[derive(Default)]
    struct FakePin {
        high: bool,
        writes: usize,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn test_pin_output_starts_low() {
        let pin = FakePin {
            high: true,
            writes: 0,
        };
        let pin = PinOutput::new(pin).release();
        assert!(!pin.high);
        assert_eq!(pin.writes, 1);
    }

    #[test]
    fn test_pin_output_follows_level() {
        let mut output = PinOutput::new(FakePin::default());

        output.set_level(Level::On);
        assert!(output.pin.high);
        output.set_level(Level::On);
        assert!(output.pin.high);
        output.set_level(Level::Off);
        assert!(!output.pin.high);
    }

    #[test]
    fn test_pin_errors_are_swallowed() {
        let mut output = PinOutput::new(BrokenPin);
        output.on();
        output.off();
    }

    #[test]
    fn test_recorder_counts_overflow() {
        let mut recorder = Recorder::<2>::new();
        recorder.on();
        recorder.off();
        recorder.on();

        assert_eq!(recorder.levels(), &[Level::On, Level::Off]);
        assert_eq!(recorder.last(), Level::Off);
        assert_eq!(recorder.overflowed(), 1);
    }

    #[test]
    fn test_level_from_bool() {
        assert_eq!(Level::from(true), Level::On);
        assert_eq!(Level::from(false), Level::Off);
        assert!(!Level::default().is_on());
    }
}
