mod cli;
mod config;
mod tail;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;

use kubestream_k8s::{ConnectionRegistry, KubeClient, KubeTransport, LogTransport};
use kubestream_logs::{ExportFormat, LogSink, SessionRequest};
use kubestream_tui::{
    Action, AppState, Event, EventHandler, HelpOverlay, KeyBindings, KeyContext,
    LogViewerScreen, Tui,
};
use kubestream_types::TimeRange;

use crate::cli::Args;
use crate::config::Settings;
use crate::tail::LiveTail;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let file = config::load(args.config.as_deref())?;
    let settings = Settings::resolve(args, file);

    init_tracing(settings.log_file.as_deref())?;

    let result = run_app(settings).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Diagnostics go to stderr, or to a file so they do not draw over the UI
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

async fn run_app(settings: Settings) -> Result<()> {
    let kube_client = KubeClient::new()?;

    let context = settings
        .context
        .clone()
        .or_else(|| kube_client.current_context().map(str::to_string))
        .context("No context given and the kubeconfig has no current context")?;
    let namespace = settings
        .namespace
        .clone()
        .or_else(|| kube_client.context_namespace(&context))
        .unwrap_or_else(|| "default".to_string());

    let registry = ConnectionRegistry::new();
    let connection_id = kube_client.connect(&registry, &context).await?;

    let time_range = TimeRange::from_seconds(settings.since_seconds);
    let request = SessionRequest {
        connection_id,
        namespace,
        pod_name: settings.pod.clone(),
        container_name: settings.container.clone(),
        since_seconds: settings.since_seconds,
    };

    let mut tail = LiveTail::new(KubeTransport::new(registry), request, settings.tail_lines);
    let mut sink = LogSink::new(settings.buffer_size);
    let mut state = AppState::new(tail.key(), time_range);

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(settings.tick_rate);
    let keybindings = KeyBindings::new();

    tail.start(&mut sink);
    render(&mut tui, &mut state, &sink)?;

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = if state.ui_state.help_visible {
                            keybindings.get_action(KeyContext::Help, &key)
                        } else if state.ui_state.search_active {
                            keybindings.get_search_input_action(&key)
                        } else {
                            keybindings.get_action(KeyContext::LogViewer, &key)
                        };

                        if let Some(action) = action {
                            handle_action(&mut state, &mut sink, &mut tail, &settings.export_dir, action);
                        }
                    }
                    Event::Tick | Event::Resize(_, _) => {}
                    Event::Error(e) => {
                        tracing::warn!("terminal event error: {}", e);
                        state.show_message(e);
                    }
                }
            }

            Some(event) = tail.next_event() => {
                tail.apply(event, &mut sink);
            }

            else => break,
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state, &sink)?;
    }

    tail.stop();
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn handle_action<T: LogTransport>(
    state: &mut AppState,
    sink: &mut LogSink,
    tail: &mut LiveTail<T>,
    export_dir: &Path,
    action: Action,
) {
    match action {
        Action::Quit => {
            tail.stop();
            state.should_quit = true;
        }
        Action::ToggleHelp => {
            state.ui_state.help_visible = !state.ui_state.help_visible;
        }

        Action::ScrollUp(n) => state.scroll_up(n),
        Action::ScrollDown(n) => state.scroll_down(n),
        Action::PageUp => state.page_up(),
        Action::PageDown => state.page_down(),
        Action::ScrollToTop => state.scroll_to_top(),
        Action::ScrollToBottom => state.scroll_to_bottom(),

        Action::ToggleAutoScroll => state.toggle_auto_scroll(),
        Action::ToggleTimestamps => {
            state.ui_state.show_timestamps = !state.ui_state.show_timestamps;
        }
        Action::ToggleStats => {
            state.ui_state.stats_visible = !state.ui_state.stats_visible;
        }

        Action::TogglePause => {
            let paused = sink.toggle_pause();
            tracing::debug!(paused, "intake toggled");
        }
        Action::ClearLogs => {
            sink.clear();
            state.reset_view();
            state.ui_state.search_status = None;
        }

        Action::OpenSearch => state.start_search(),
        Action::CloseSearch => state.cancel_search(),
        Action::SearchInput(c) => state.search_input_char(c),
        Action::SearchBackspace => state.search_input_backspace(),
        Action::SearchClear => state.ui_state.search_input.clear(),
        Action::SubmitSearch => {
            let term = state.submit_search();
            let hit = sink.search(&term);
            show_hit(state, sink, hit);
        }
        Action::SearchNext => {
            let hit = sink.search_next();
            show_hit(state, sink, hit);
        }
        Action::SearchPrevious => {
            let hit = sink.search_previous();
            show_hit(state, sink, hit);
        }

        Action::Export(format) => match export_to_file(sink, format, export_dir, &state.target.pod_name) {
            Ok((path, count)) => {
                state.show_message(format!("Exported {} logs to {}", count, path.display()));
            }
            Err(e) => {
                tracing::warn!("export failed: {:#}", e);
                state.show_message(format!("Export failed: {}", e));
            }
        },

        Action::CycleTimeRange | Action::CycleTimeRangeBack => {
            let range = if action == Action::CycleTimeRange {
                state.ui_state.time_range.next()
            } else {
                state.ui_state.time_range.prev()
            };
            state.ui_state.time_range = range;
            state.reset_view();
            state.ui_state.search_status = None;
            tail.restart(range.as_seconds(), sink);
        }

        Action::DismissMessage => state.dismiss_message(),
        Action::Tick => {}
    }
}

/// Move the view to a search hit and summarize its position
fn show_hit(state: &mut AppState, sink: &LogSink, hit: Option<kubestream_logs::SearchHit>) {
    state.ui_state.search_status = match hit {
        Some(hit) => {
            state.reveal(hit.index);
            Some(format!("{}/{}", hit.ordinal, hit.total))
        }
        None if sink.search_query().is_some() => Some("no matches".to_string()),
        None => None,
    };
}

fn render(tui: &mut Tui, state: &mut AppState, sink: &LogSink) -> Result<()> {
    tui.draw(|frame| {
        LogViewerScreen::render(frame, state, sink);

        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }
    })?;

    Ok(())
}

/// Write the buffered records to `{pod}_{timestamp}.{ext}` in `dir`
fn export_to_file(
    sink: &LogSink,
    format: ExportFormat,
    dir: &Path,
    pod_name: &str,
) -> Result<(PathBuf, usize)> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}_{}.{}", pod_name, timestamp, format.extension()));

    std::fs::write(&path, sink.export(format))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok((path, sink.len()))
}
