use kubestream_types::ExportFormat;

/// All possible actions in the application (command pattern)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,

    // Scrolling
    ScrollUp(usize),
    ScrollDown(usize),
    ScrollToTop,
    ScrollToBottom,
    PageUp,
    PageDown,

    // Display toggles
    ToggleAutoScroll,
    ToggleTimestamps,
    ToggleStats,

    // Intake
    TogglePause,
    ClearLogs,

    // Search
    OpenSearch,
    CloseSearch,
    SearchInput(char),
    SearchBackspace,
    SearchClear,
    SubmitSearch,
    SearchNext,
    SearchPrevious,

    Export(ExportFormat),

    // Time range (restarts the session)
    CycleTimeRange,
    CycleTimeRangeBack,

    DismissMessage,

    // Tick (for periodic updates)
    Tick,
}
