use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use beep_core::{BuzzerTrait, Mailbox};
use clap::Parser;

mod buzzer;
mod cli;
mod log_capture;
mod mock_hw_tui;

use buzzer::{DesktopBuzzer, SimOutput, Ticker};
use cli::{Cli, Command};

/// Hand-off slot shared by the panel and the tick thread.
static MAILBOX: Mailbox = Mailbox::new();

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log_capture::init(cli.log_level);

    log::info!("Buzzer simulator starting...");

    let command = cli.command.unwrap_or(Command::Tui);
    // Before the ticker starts, its start-up lines would land on the panel
    log_capture::set_echo(!command.owns_terminal());

    let lamp = Arc::new(AtomicBool::new(false));
    let output_lamp = Arc::clone(&lamp);
    let (mute, tone_hz) = (cli.mute, cli.tone_hz);
    let mut ticker = Ticker::spawn(&MAILBOX, move || SimOutput::open(output_lamp, mute, tone_hz))?;

    let buzzer = DesktopBuzzer::new(&MAILBOX);

    match command {
        Command::Tui => {
            let result = mock_hw_tui::run(buzzer, lamp);
            log_capture::set_echo(true);
            result?;
        }
        Command::Play { request } => {
            log::info!("Playing for {} ticks", request.request().total_ticks());
            request.submit(&buzzer);
            buzzer.wait_for_completion();
            log::info!("Done");
        }
    }

    ticker.stop();
    Ok(())
}
