//! Terminal User Interface Module
//!
//! Full-screen live view of the network status. The screen is redrawn on a
//! fixed tick so the "updated N ago" header keeps moving, and immediately
//! whenever the feed or the poller publishes.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ledger_network_status::tui::run_tui;
//!
//! let poller = StatsPoller::new(api, &config).start();
//! let view = StatusView::new(&config, feed.subscribe(), poller.subscribe());
//! run_tui(view, &poller, &config.api_url).await?;
//! ```

mod app;
mod format;
mod ui;

pub use app::{App, AppState};
pub use format::{
    format_ago, format_amount, format_count, format_number, format_percent, short_address,
};

use crate::poller::PollerHandle;
use crate::view::StatusView;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Write};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Redraw period when nothing else happens.
const TICK_RATE: Duration = Duration::from_millis(250);

/// Run the TUI until the user quits.
pub async fn run_tui(
    mut view: StatusView,
    poller: &PollerHandle,
    api_url: &str,
) -> anyhow::Result<()> {
    // Setup terminal with panic handler to ensure cleanup
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = io::stdout().flush();
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    stdout.flush()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(view.render(), api_url);
    let result = event_loop(&mut terminal, &mut app, &mut view, poller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    io::stdout().flush()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    view: &mut StatusView,
    poller: &PollerHandle,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(TICK_RATE);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sources_open = true;

    info!("TUI started");

    loop {
        app.poller_state = poller.state();
        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            _ = tick.tick() => {}
            open = view.changed(), if sources_open => {
                if open {
                    app.update_report(view.render());
                } else {
                    debug!("Status sources closed");
                    sources_open = false;
                }
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key.code);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => app.quit(),
            },
        }

        if app.should_quit() {
            info!("TUI quit requested");
            return Ok(());
        }
    }
}
