use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use kubestream_types::ExportFormat;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    LogViewer,
    SearchInput,
    Help,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        global.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Log viewer bindings - less-like navigation
        let mut log_viewer = HashMap::new();
        log_viewer.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        log_viewer.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        log_viewer.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        log_viewer.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        log_viewer.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleAutoScroll);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('t')), Action::ToggleTimestamps);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('s')), Action::ToggleStats);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('p')), Action::TogglePause);
        log_viewer.insert(KeyBinding::new(KeyCode::Char(' ')), Action::TogglePause);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('c')), Action::ClearLogs);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('/')), Action::OpenSearch);
        log_viewer.insert(KeyBinding::new(KeyCode::Char('n')), Action::SearchNext);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('N')), Action::SearchPrevious);
        log_viewer.insert(
            KeyBinding::new(KeyCode::Char('e')),
            Action::Export(ExportFormat::Text),
        );
        log_viewer.insert(
            KeyBinding::shift(KeyCode::Char('E')),
            Action::Export(ExportFormat::Csv),
        );
        log_viewer.insert(KeyBinding::new(KeyCode::Char('r')), Action::CycleTimeRange);
        log_viewer.insert(KeyBinding::shift(KeyCode::Char('R')), Action::CycleTimeRangeBack);
        log_viewer.insert(KeyBinding::new(KeyCode::Esc), Action::DismissMessage);
        bindings.insert(KeyContext::LogViewer, log_viewer);

        // Search input bindings (when search bar is active)
        let mut search_input = HashMap::new();
        search_input.insert(KeyBinding::new(KeyCode::Enter), Action::SubmitSearch);
        search_input.insert(KeyBinding::new(KeyCode::Esc), Action::CloseSearch);
        search_input.insert(KeyBinding::new(KeyCode::Backspace), Action::SearchBackspace);
        search_input.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::SearchClear);
        search_input.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::CloseSearch);
        bindings.insert(KeyContext::SearchInput, search_input);

        // Any of these closes the help overlay
        let mut help = HashMap::new();
        help.insert(KeyBinding::new(KeyCode::Esc), Action::ToggleHelp);
        help.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        help.insert(KeyBinding::new(KeyCode::Char('q')), Action::ToggleHelp);
        bindings.insert(KeyContext::Help, help);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(context_bindings) = self.bindings.get(&context) {
            if let Some(action) = context_bindings.get(&binding) {
                return Some(action.clone());
            }
        }

        // Help swallows everything else except Ctrl-C
        if context == KeyContext::Help && binding != KeyBinding::ctrl(KeyCode::Char('c')) {
            return None;
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in search input mode
    /// Returns Some(Action) for special keys, None for unbound keys
    pub fn get_search_input_action(&self, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        if let Some(search_bindings) = self.bindings.get(&KeyContext::SearchInput) {
            if let Some(action) = search_bindings.get(&binding) {
                return Some(action.clone());
            }
        }

        // For regular characters, return SearchInput action
        if let KeyCode::Char(c) = key.code {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                return Some(Action::SearchInput(c));
            }
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_log_viewer_bindings() {
        let kb = KeyBindings::new();
        let lookup = |code, modifiers| kb.get_action(KeyContext::LogViewer, &key(code, modifiers));

        assert_eq!(lookup(KeyCode::Char('j'), KeyModifiers::NONE), Some(Action::ScrollDown(1)));
        assert_eq!(lookup(KeyCode::Char(' '), KeyModifiers::NONE), Some(Action::TogglePause));
        assert_eq!(lookup(KeyCode::Char('p'), KeyModifiers::NONE), Some(Action::TogglePause));
        assert_eq!(lookup(KeyCode::Char('N'), KeyModifiers::SHIFT), Some(Action::SearchPrevious));
        assert_eq!(
            lookup(KeyCode::Char('E'), KeyModifiers::SHIFT),
            Some(Action::Export(ExportFormat::Csv))
        );
        assert_eq!(lookup(KeyCode::Char('x'), KeyModifiers::NONE), None);
    }

    #[test]
    fn test_global_fallback() {
        let kb = KeyBindings::new();
        let quit = key(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(kb.get_action(KeyContext::LogViewer, &quit), Some(Action::Quit));

        let ctrl_c = key(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(kb.get_action(KeyContext::LogViewer, &ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn test_help_context() {
        let kb = KeyBindings::new();
        let q = key(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(kb.get_action(KeyContext::Help, &q), Some(Action::ToggleHelp));

        let j = key(KeyCode::Char('j'), KeyModifiers::NONE);
        assert_eq!(kb.get_action(KeyContext::Help, &j), None);

        let ctrl_c = key(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(kb.get_action(KeyContext::Help, &ctrl_c), Some(Action::Quit));
    }

    #[test]
    fn test_search_input() {
        let kb = KeyBindings::new();
        assert_eq!(
            kb.get_search_input_action(&key(KeyCode::Char('n'), KeyModifiers::NONE)),
            Some(Action::SearchInput('n'))
        );
        assert_eq!(
            kb.get_search_input_action(&key(KeyCode::Char('Q'), KeyModifiers::SHIFT)),
            Some(Action::SearchInput('Q'))
        );
        assert_eq!(
            kb.get_search_input_action(&key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(Action::SubmitSearch)
        );
        assert_eq!(
            kb.get_search_input_action(&key(KeyCode::Char('x'), KeyModifiers::ALT)),
            None
        );
    }
}
