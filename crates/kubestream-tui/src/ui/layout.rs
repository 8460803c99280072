use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Areas of the log viewer, top to bottom
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogViewerAreas {
    pub header: Rect,
    pub stats: Option<Rect>,
    pub search: Option<Rect>,
    pub logs: Rect,
    pub status: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Split the screen for the log viewer; optional bars take 3 rows each
    pub fn log_viewer(area: Rect, show_stats: bool, show_search: bool) -> LogViewerAreas {
        let mut constraints = vec![Constraint::Length(3)];
        if show_stats {
            constraints.push(Constraint::Length(3));
        }
        if show_search {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(1));
        constraints.push(Constraint::Length(1));

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut idx = 1;
        let mut next_if = |shown: bool| {
            shown.then(|| {
                let rect = chunks[idx];
                idx += 1;
                rect
            })
        };
        let stats = next_if(show_stats);
        let search = next_if(show_search);

        LogViewerAreas {
            header: chunks[0],
            stats,
            search,
            logs: chunks[chunks.len() - 2],
            status: chunks[chunks.len() - 1],
        }
    }

    /// A rectangle of at most `width` x `height` centered in `area`
    pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_layout() {
        let areas = Layout::log_viewer(Rect::new(0, 0, 80, 24), false, false);
        assert_eq!(areas.header.height, 3);
        assert_eq!(areas.logs.height, 20);
        assert_eq!(areas.status.y, 23);
        assert!(areas.stats.is_none() && areas.search.is_none());
    }

    #[test]
    fn test_all_bars() {
        let areas = Layout::log_viewer(Rect::new(0, 0, 80, 24), true, true);
        assert_eq!(areas.stats.map(|r| r.y), Some(3));
        assert_eq!(areas.search.map(|r| r.y), Some(6));
        assert_eq!(areas.logs.y, 9);
        assert_eq!(areas.logs.height, 14);
    }

    #[test]
    fn test_centered() {
        let popup = Layout::centered(Rect::new(0, 0, 100, 40), 50, 20);
        assert_eq!(popup, Rect::new(25, 10, 50, 20));

        let small = Layout::centered(Rect::new(0, 0, 30, 10), 50, 20);
        assert_eq!(small.width, 26);
        assert_eq!(small.height, 6);
    }
}
