use std::borrow::Cow;

use ratatui::{
    Frame,
    layout::{Alignment, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use kubestream_logs::{LogSink, SearchQuery};
use kubestream_types::{LogLevel, LogRecord};

use crate::app::AppState;
use crate::ui::components::StatusBar;
use crate::ui::{Layout, Theme};

const PLACEHOLDER: &str = "Waiting for logs…";

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, sink: &LogSink) {
        let show_search = state.ui_state.search_active || sink.search_query().is_some();
        let areas = Layout::log_viewer(frame.area(), state.ui_state.stats_visible, show_search);

        Self::render_header(frame, areas.header, state, sink);
        if let Some(area) = areas.stats {
            Self::render_stats_bar(frame, area, sink);
        }
        if let Some(area) = areas.search {
            Self::render_search_bar(frame, area, state, sink);
        }
        Self::render_logs(frame, areas.logs, state, sink);
        Self::render_status_bar(frame, areas.status, state, sink);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, sink: &LogSink) {
        let target = &state.target;

        let mut spans = vec![
            Span::styled("kubestream", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(target.connection_id.clone(), Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(target.namespace.clone(), Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(target.pod_name.clone(), Theme::text_highlight()),
            Span::styled(format!("/{}", target.container_name), Theme::text_dim()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(
                format!("⏱ {}", state.ui_state.time_range.label()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ];

        if sink.is_paused() {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled(
                "⏸ PAUSED",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_stats_bar(frame: &mut Frame, area: Rect, sink: &LogSink) {
        let counts = sink.stats();

        let mut spans = vec![Span::styled(" ", Theme::text())];
        for level in [
            LogLevel::Error,
            LogLevel::Warning,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            spans.push(Span::styled(format!("{}:", level.short()), Theme::level(level)));
            spans.push(Span::styled(format!("{} ", counts.get(level)), Theme::text()));
        }

        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled("Total:", Theme::text_dim()));
        spans.push(Span::styled(counts.total().to_string(), Theme::text()));

        let evicted = sink.buffer().evicted();
        if evicted > 0 {
            spans.push(Span::styled(
                format!("  ({} evicted)", evicted),
                Theme::text_dim(),
            ));
        }

        let stats_widget = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Stats ", Theme::title())),
        );

        frame.render_widget(stats_widget, area);
    }

    fn render_search_bar(frame: &mut Frame, area: Rect, state: &AppState, sink: &LogSink) {
        let active = state.ui_state.search_active;
        let mut spans = vec![];

        if active {
            spans.push(Span::styled(
                " /",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                state.ui_state.search_input.clone(),
                Theme::text_highlight(),
            ));
            spans.push(Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
            spans.push(Span::styled(
                "  [Enter] Search  [Esc] Cancel",
                Theme::text_dim(),
            ));
        } else if let Some(query) = sink.search_query() {
            spans.push(Span::styled(" Search: ", Theme::text_dim()));
            spans.push(Span::styled(query.term().to_string(), Theme::text_highlight()));
            if let Some(status) = &state.ui_state.search_status {
                spans.push(Span::styled(format!("  {}", status), Theme::text()));
            }
            spans.push(Span::styled(
                "  [n] Next  [N] Prev  [/] Edit",
                Theme::text_dim(),
            ));
        }

        let search_bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if active {
                    Style::default().fg(Color::Yellow)
                } else {
                    Theme::border()
                })
                .title(Span::styled(" Search ", Theme::title())),
        );

        frame.render_widget(search_bar, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, state: &mut AppState, sink: &LogSink) {
        let total = sink.len();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border())
            .title(Span::styled(format!(" Logs ({}) ", total), Theme::title()));

        if total == 0 {
            let placeholder = if sink.is_waiting() {
                Line::from(Span::styled(PLACEHOLDER, Theme::text_dim()))
            } else {
                Line::from("")
            };
            frame.render_widget(
                Paragraph::new(placeholder)
                    .alignment(Alignment::Center)
                    .block(block),
                area,
            );
            return;
        }

        // Visible area inside the border
        let inner_height = area.height.saturating_sub(2) as usize;
        let offset = state.clamp_scroll(total, inner_height);

        // 2 for borders, 2 for scrollbar
        let inner_width = area.width.saturating_sub(4) as usize;
        let current = sink.current_match_index();
        let query = sink.search_query();

        let lines: Vec<Line> = sink
            .buffer()
            .range(offset, inner_height)
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let is_current = current == Some(offset + i);
                format_record(record, state.ui_state.show_timestamps, inner_width, query, is_current)
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);

        if total > inner_height {
            let max_scroll = total.saturating_sub(inner_height);
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(offset.min(max_scroll));

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, sink: &LogSink) {
        let counts = sink.stats();

        let mut bar = StatusBar::new().hints([
            ("/", "Search"),
            ("p", "Pause"),
            ("r", state.ui_state.time_range.label()),
            ("e/E", "Export"),
            ("?", "Help"),
            ("q", "Quit"),
        ]);

        if sink.is_paused() {
            bar = bar.alert("PAUSED");
        }
        if sink.dropped_while_paused() > 0 {
            bar = bar.alert(format!("{} dropped", sink.dropped_while_paused()));
        }
        if let Some(message) = &state.ui_state.message {
            bar = bar.alert(message.clone());
        }

        let right = format!(
            "E:{} W:{} I:{} | {} logs {}",
            counts.error,
            counts.warning,
            counts.info,
            counts.total(),
            if state.ui_state.auto_scroll { "▼" } else { " " }
        );

        frame.render_widget(bar.right(right), area);
    }
}

/// Build one display row: number, timestamp, level, pod, message
pub(crate) fn format_record(
    record: &LogRecord,
    show_timestamp: bool,
    available_width: usize,
    query: Option<&SearchQuery>,
    is_current: bool,
) -> Line<'static> {
    let mut spans = Vec::new();

    // Current match marker takes the first column
    spans.push(if is_current {
        Span::styled("▶", Theme::text_highlight())
    } else {
        Span::raw(" ")
    });

    if record.is_system() {
        spans.push(Span::styled("    -", Theme::text_dim()));
    } else {
        spans.push(Span::styled(format!("{:>5}", record.sequence), Theme::text_dim()));
    }

    if show_timestamp {
        // Approximate timestamps are marked with a trailing ~
        let time = record.timestamp.at().format("%H:%M:%S%.3f");
        let marker = if record.has_real_timestamp { ' ' } else { '~' };
        spans.push(Span::styled(format!(" {}{}", time, marker), Theme::text_dim()));
    }

    spans.push(Span::styled(
        format!(" {} {}", record.level.icon(), record.level.short()),
        Theme::level(record.level),
    ));

    if let Some(pod) = record.pod_name.as_deref() {
        spans.push(Span::styled(
            format!(" {}", pod),
            Style::default().fg(pod_color(pod)),
        ));
    }

    spans.push(Span::styled(" │ ", Theme::text_dim()));

    let prefix_width: usize = spans.iter().map(|s| s.content.width()).sum();
    let message = truncate_to_width(&record.message, available_width.saturating_sub(prefix_width));
    let style = Theme::message(record);

    match query.map(|q| q.find_matches(&message)) {
        Some(matches) if !matches.is_empty() => {
            let mut last_end = 0;
            for (start, end) in matches {
                if start > last_end {
                    spans.push(Span::styled(message[last_end..start].to_string(), style));
                }
                spans.push(Span::styled(message[start..end].to_string(), Theme::search_match()));
                last_end = end;
            }
            if last_end < message.len() {
                spans.push(Span::styled(message[last_end..].to_string(), style));
            }
        }
        _ => spans.push(Span::styled(message.into_owned(), style)),
    }

    let line = Line::from(spans);
    if is_current {
        line.style(Theme::current_match_row())
    } else {
        line
    }
}

/// Cut `s` to at most `max` display columns, ending with "..." when cut
fn truncate_to_width(s: &str, max: usize) -> Cow<'_, str> {
    if s.width() <= max {
        return Cow::Borrowed(s);
    }

    let budget = max.saturating_sub(3);
    let mut width = 0;
    let mut end = 0;
    for (i, c) in s.char_indices() {
        let w = c.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        end = i + c.len_utf8();
    }

    Cow::Owned(format!("{}...", &s[..end]))
}

/// Get a consistent color for a pod name
fn pod_color(pod_name: &str) -> Color {
    let hash: u32 = pod_name
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_add(b as u32));

    let colors = [
        Color::Cyan,
        Color::Magenta,
        Color::Blue,
        Color::Yellow,
        Color::Green,
        Color::LightCyan,
        Color::LightMagenta,
    ];

    colors[(hash as usize) % colors.len()]
}
