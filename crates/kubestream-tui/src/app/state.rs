use kubestream_types::{SessionKey, TimeRange};

/// Lines moved by PageUp/PageDown before the first render sizes the viewport
const DEFAULT_PAGE: usize = 20;

/// UI-specific transient state
pub struct UiState {
    /// Is search input bar active?
    pub search_active: bool,

    /// Current search input text
    pub search_input: String,

    /// Position summary for the active search, e.g. "2/5"
    pub search_status: Option<String>,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Scroll position in log viewer
    pub log_scroll: usize,

    /// Auto-scroll enabled (follow mode)?
    pub auto_scroll: bool,

    pub show_timestamps: bool,

    /// Show statistics bar?
    pub stats_visible: bool,

    /// Selected time range for the session
    pub time_range: TimeRange,

    /// One-line notice shown in the status bar (export result, start failure)
    pub message: Option<String>,

    /// Rows available to the log list at the last render
    pub viewport_height: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            search_active: false,
            search_input: String::new(),
            search_status: None,
            help_visible: false,
            log_scroll: 0,
            auto_scroll: true,
            show_timestamps: true,
            stats_visible: false,
            time_range: TimeRange::default(),
            message: None,
            viewport_height: 0,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Pod being tailed, shown in the header
    pub target: SessionKey,

    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(target: SessionKey, time_range: TimeRange) -> Self {
        Self {
            target,
            ui_state: UiState {
                time_range,
                ..UiState::default()
            },
            should_quit: false,
        }
    }

    fn page(&self) -> usize {
        match self.ui_state.viewport_height {
            0 => DEFAULT_PAGE,
            h => h,
        }
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = self.ui_state.log_scroll.saturating_sub(n);
    }

    /// Scroll down; the render pass clamps to the actual bottom
    pub fn scroll_down(&mut self, n: usize) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = self.ui_state.log_scroll.saturating_add(n);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page());
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page());
    }

    pub fn scroll_to_top(&mut self) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = usize::MAX;
    }

    pub fn toggle_auto_scroll(&mut self) {
        self.ui_state.auto_scroll = !self.ui_state.auto_scroll;
    }

    /// Bring a buffer row into view, roughly centered
    pub fn reveal(&mut self, index: usize) {
        self.ui_state.auto_scroll = false;
        self.ui_state.log_scroll = index.saturating_sub(self.page() / 2);
    }

    /// Fit the scroll position to `total` rows in a viewport of `height`
    ///
    /// Follow mode pins the view to the bottom. Returns the clamped offset.
    pub fn clamp_scroll(&mut self, total: usize, height: usize) -> usize {
        self.ui_state.viewport_height = height;

        let max_scroll = total.saturating_sub(height);
        if self.ui_state.auto_scroll || self.ui_state.log_scroll > max_scroll {
            self.ui_state.log_scroll = max_scroll;
        }
        self.ui_state.log_scroll
    }

    /// Reset the view after the buffer was emptied
    pub fn reset_view(&mut self) {
        self.ui_state.log_scroll = 0;
        self.ui_state.auto_scroll = true;
    }

    /// Start search input mode
    pub fn start_search(&mut self) {
        self.ui_state.search_active = true;
        self.ui_state.search_input.clear();
    }

    pub fn cancel_search(&mut self) {
        self.ui_state.search_active = false;
        self.ui_state.search_input.clear();
    }

    /// Close the input bar and hand back what was typed
    pub fn submit_search(&mut self) -> String {
        self.ui_state.search_active = false;
        std::mem::take(&mut self.ui_state.search_input)
    }

    pub fn search_input_char(&mut self, c: char) {
        self.ui_state.search_input.push(c);
    }

    pub fn search_input_backspace(&mut self) {
        self.ui_state.search_input.pop();
    }

    pub fn show_message(&mut self, msg: impl Into<String>) {
        self.ui_state.message = Some(msg.into());
    }

    pub fn dismiss_message(&mut self) {
        self.ui_state.message = None;
    }
}
