#![cfg_attr(not(test), no_std)]

pub mod buzzer;
pub mod consts;
pub mod engine;
pub mod mailbox;
pub mod output;
pub mod pattern;

pub use buzzer::{BuzzerTrait, Player};
pub use engine::PlaybackState;
pub use mailbox::{Mailbox, Status};
pub use output::{Level, OutputDriver, PinOutput};
pub use pattern::Request;
