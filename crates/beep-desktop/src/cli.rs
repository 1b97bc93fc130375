use beep_core::{BuzzerTrait, Request};
use clap::{Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "beep-desktop", about = "Desktop simulator for the 16 Hz pattern buzzer")]
pub struct Cli {
    /// Do not open an audio device; the output only shows up in the panel and logs
    #[arg(long)]
    pub mute: bool,

    /// Pitch of the simulated piezo
    #[arg(long, default_value_t = 2700, value_parser = clap::value_parser!(u32).range(200..=20000))]
    pub tone_hz: u32,

    #[arg(long, default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive control panel (the default)
    Tui,
    /// Submit one request, wait until it has played and exit
    Play {
        #[command(subcommand)]
        request: RequestArg,
    },
}

impl Command {
    /// Whether the command takes over the terminal, so logs must not be printed.
    pub fn owns_terminal(&self) -> bool {
        matches!(self, Command::Tui)
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestArg {
    /// One beep, up to 2000 ms
    Duration { ms: u16 },
    /// N beeps with equal gaps, up to 1000 ms each
    Times { n: u8, ms: u16 },
    /// Raw 32-bit pattern, one bit per 1/16 s (0x.., 0b.. or decimal)
    Pattern {
        #[arg(value_parser = parse_pattern)]
        bits: u32,
    },
}

impl RequestArg {
    pub fn submit(self, buzzer: &impl BuzzerTrait) {
        match self {
            RequestArg::Duration { ms } => buzzer.beep(ms),
            RequestArg::Times { n, ms } => buzzer.beep_times(n, ms),
            RequestArg::Pattern { bits } => buzzer.beep_pattern(bits),
        }
    }

    pub fn request(self) -> Request {
        match self {
            RequestArg::Duration { ms } => Request::beep(ms),
            RequestArg::Times { n, ms } => Request::beep_times(n, ms),
            RequestArg::Pattern { bits } => Request::pattern(bits),
        }
    }
}

pub fn parse_pattern(s: &str) -> Result<u32, String> {
    let digits = s.replace('_', "");
    let parsed = if let Some(hex) = digits.strip_prefix("0x").or(digits.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if let Some(bin) = digits.strip_prefix("0b").or(digits.strip_prefix("0B")) {
        u32::from_str_radix(bin, 2)
    } else {
        digits.parse()
    };
    parsed.map_err(|e| format!("invalid pattern '{s}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_tui() {
        let cli = Cli::try_parse_from(["beep-desktop"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.tone_hz, 2700);
        assert_eq!(cli.log_level, LevelFilter::Info);
        assert!(!cli.mute);
    }

    #[test]
    fn test_play_pattern() {
        let args = ["beep-desktop", "--mute", "play", "pattern", "0b1010_0000_0000"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.mute);
        assert_eq!(
            cli.command,
            Some(Command::Play {
                request: RequestArg::Pattern { bits: 0xA00 }
            })
        );
    }

    #[test]
    fn test_play_times() {
        let cli = Cli::try_parse_from(["beep-desktop", "play", "times", "3", "250"]).unwrap();
        let Some(Command::Play { request }) = cli.command else {
            panic!("expected play command");
        };
        assert_eq!(request.request(), Request::beep_times(3, 250));
    }

    #[test]
    fn test_only_tui_owns_terminal() {
        let cli = Cli::try_parse_from(["beep-desktop"]).unwrap();
        assert!(cli.command.unwrap_or(Command::Tui).owns_terminal());

        let cli = Cli::try_parse_from(["beep-desktop", "play", "duration", "500"]).unwrap();
        assert!(!cli.command.unwrap().owns_terminal());
    }

    #[test]
    fn test_tone_out_of_range() {
        assert!(Cli::try_parse_from(["beep-desktop", "--tone-hz", "50"]).is_err());
    }

    #[test]
    fn test_parse_pattern_radixes() {
        assert_eq!(parse_pattern("0x500"), Ok(0x500));
        assert_eq!(parse_pattern("0b101"), Ok(0b101));
        assert_eq!(parse_pattern("1280"), Ok(1280));
        assert_eq!(parse_pattern("0xFFFF_FFFF"), Ok(u32::MAX));
        assert!(parse_pattern("0x1_0000_0000").is_err());
        assert!(parse_pattern("beep").is_err());
    }
}
