use ratatui::style::{Color, Modifier, Style};

use kubestream_types::{LogLevel, LogRecord, RecordKind};

/// Color theme for the application
pub struct Theme;

impl Theme {
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn level(level: LogLevel) -> Style {
        Style::default()
            .fg(level.color())
            .add_modifier(Modifier::BOLD)
    }

    /// Message style for a row
    pub fn message(record: &LogRecord) -> Style {
        match (record.kind, record.level) {
            (RecordKind::StreamError, _) => Style::default()
                .fg(Self::ERROR)
                .add_modifier(Modifier::BOLD),
            (RecordKind::StreamEnded, _) => Style::default()
                .fg(Self::FG_DIM)
                .add_modifier(Modifier::ITALIC),
            (_, LogLevel::Error) => Style::default().fg(Self::ERROR),
            (_, LogLevel::Warning) => Style::default().fg(Color::Yellow),
            (_, LogLevel::Trace) => Self::text_dim(),
            _ => Self::text(),
        }
    }

    pub fn search_match() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Background for the row holding the current search match
    pub fn current_match_row() -> Style {
        Style::default().bg(Color::Rgb(60, 60, 20))
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG_DIM).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_alert() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }
}
