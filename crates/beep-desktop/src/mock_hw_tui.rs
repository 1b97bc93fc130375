use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use beep_core::{BuzzerTrait, Request};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::Level;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::buzzer::DesktopBuzzer;
use crate::log_capture;

/// A request bound to a key on the panel.
pub struct Preset {
    pub key: char,
    pub label: &'static str,
    pub request: Request,
}

// ...---... in Morse timing: dot one tick, dash three, one tick between
// symbols, three between letters
const SOS: u32 = 0b10101_000_11101110111_000_10101;

pub static PRESETS: [Preset; 7] = [
    Preset {
        key: '1',
        label: "Beep 125 ms",
        request: Request::beep(125),
    },
    Preset {
        key: '2',
        label: "Beep 500 ms",
        request: Request::beep(500),
    },
    Preset {
        key: '3',
        label: "Beep 2 s (full pattern)",
        request: Request::beep(2000),
    },
    Preset {
        key: '4',
        label: "3 x 250 ms",
        request: Request::beep_times(3, 250),
    },
    Preset {
        key: '5',
        label: "Pattern 0b101 (skips leading zeros)",
        request: Request::pattern(0b101),
    },
    Preset {
        key: '6',
        label: "SOS",
        request: Request::pattern(SOS),
    },
    Preset {
        key: '0',
        label: "Silent pattern (no-op)",
        request: Request::pattern(0),
    },
];

pub fn preset_for(key: char) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.key == key)
}

// Extension trait for log::Level to provide UI rendering methods
trait LevelExt {
    fn color(&self) -> Color;
    fn prefix(&self) -> &str;
}

impl LevelExt for Level {
    fn color(&self) -> Color {
        match *self {
            Level::Error => Color::Red,
            Level::Warn => Color::Yellow,
            Level::Info => Color::Cyan,
            Level::Debug => Color::Gray,
            Level::Trace => Color::DarkGray,
        }
    }

    fn prefix(&self) -> &str {
        match *self {
            Level::Error => "[ERROR]",
            Level::Warn => "[WARN] ",
            Level::Info => "[INFO] ",
            Level::Debug => "[DEBUG]",
            Level::Trace => "[TRACE]",
        }
    }
}

// TUI state
struct TuiState {
    buzzer: DesktopBuzzer,
    lamp: Arc<AtomicBool>,
    /// Set while a wait-for-completion thread is blocked.
    waiting: Arc<AtomicBool>,
    should_quit: bool,
}

impl TuiState {
    fn new(buzzer: DesktopBuzzer, lamp: Arc<AtomicBool>) -> Self {
        Self {
            buzzer,
            lamp,
            waiting: Arc::new(AtomicBool::new(false)),
            should_quit: false,
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                log::info!("Ctrl+C pressed, shutting down TUI");
                self.should_quit = true;
            }
            KeyCode::Char('w') => self.wait_in_background(),
            KeyCode::Char(key) => {
                if let Some(preset) = preset_for(key) {
                    self.buzzer.submit(preset.request);
                }
            }
            _ => {}
        }
    }

    // Block a helper thread, not the panel, the way a caller would before sleeping
    fn wait_in_background(&self) {
        if self.waiting.swap(true, Ordering::AcqRel) {
            return;
        }

        let buzzer = self.buzzer;
        let waiting = Arc::clone(&self.waiting);
        log::info!("Waiting for the buzzer to finish...");

        let spawned = thread::Builder::new()
            .name("buzzer_wait".to_string())
            .spawn(move || {
                buzzer.wait_for_completion();
                log::info!("Buzzer idle");
                waiting.store(false, Ordering::Release);
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn wait thread: {}", e);
            self.waiting.store(false, Ordering::Release);
        }
    }
}

pub fn run(buzzer: DesktopBuzzer, lamp: Arc<AtomicBool>) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut tui_state = TuiState::new(buzzer, lamp);
    log::info!("Buzzer control panel started");

    let result = event_loop(&mut terminal, &mut tui_state);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(result?)
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    tui_state: &mut TuiState,
) -> io::Result<()> {
    while !tui_state.should_quit {
        terminal.draw(|f| ui(f, tui_state))?;

        // Redraw at least twice per tick so the lamp keeps up
        if event::poll(Duration::from_millis(25))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    tui_state.handle_key(key.code, key.modifiers);
                }
            }
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, state: &TuiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                        // Title
            Constraint::Length(5),                        // Output and status
            Constraint::Length(PRESETS.len() as u16 + 2), // Presets
            Constraint::Min(6),                           // Logs
            Constraint::Length(3),                        // Help
        ])
        .split(f.area());

    // Title
    let title = Paragraph::new("Buzzer Control Panel")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_status(f, chunks[1], state);
    render_presets(f, chunks[2]);
    render_logs(f, chunks[3]);

    // Help
    let help = Paragraph::new("0-6: Submit preset | W: Wait for completion | Q/ESC/Ctrl+C: Quit")
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, chunks[4]);
}

fn render_status(f: &mut Frame, area: Rect, state: &TuiState) {
    let status = state.buzzer.status();
    let (lamp_text, lamp_style) = if state.lamp.load(Ordering::Relaxed) {
        (" ON  ", Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else {
        (" OFF ", Style::default().fg(Color::DarkGray))
    };

    let pending = if status.pending.is_empty() {
        "none".to_string()
    } else {
        format!("{:#010x} x{}", status.pending.pattern, status.pending.repetitions)
    };
    let playing = if status.active_repetitions == 0 {
        "idle".to_string()
    } else {
        format!("{} repetition(s) left", status.active_repetitions)
    };

    let mut lines = vec![
        Line::from(vec![Span::raw("Output:  "), Span::styled(lamp_text, lamp_style)]),
        Line::from(format!("Playing: {}", playing)),
        Line::from(format!("Pending: {}", pending)),
    ];
    if state.waiting.load(Ordering::Acquire) {
        lines[0].spans.push(Span::styled("   waiting...", Style::default().fg(Color::Yellow)));
    }

    let block = Block::default().borders(Borders::ALL).title("Buzzer");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_presets(f: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = PRESETS
        .iter()
        .map(|preset| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", preset.key), Style::default().fg(Color::Yellow)),
                Span::raw(preset.label),
                Span::styled(
                    format!("  {:#034b} x{}", preset.request.pattern, preset.request.repetitions),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Presets"));
    f.render_widget(list, area);
}

fn render_logs(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Logs (scrolls automatically)");

    let inner = block.inner(area);
    f.render_widget(block, area);

    // Show last N logs that fit in the area
    let log_items: Vec<ListItem> = log_capture::recent_lines(inner.height as usize)
        .into_iter()
        .map(|line| {
            let content = Line::from(vec![
                Span::styled(
                    line.level.prefix().to_string(),
                    Style::default().fg(line.level.color()),
                ),
                Span::raw(" "),
                Span::styled(format!("{}: ", line.target), Style::default().fg(Color::DarkGray)),
                Span::raw(line.message),
            ]);
            ListItem::new(content)
        })
        .collect();

    f.render_widget(List::new(log_items), inner);
}
