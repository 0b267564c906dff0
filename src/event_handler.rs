use crate::ui::App;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

/// Rows moved per mouse wheel notch
const WHEEL_STEP: i64 = 3;

pub struct EventHandler<'a> {
    app: &'a mut App,
}

impl<'a> EventHandler<'a> {
    pub fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    /// Returns true if the app should quit
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key_event(key),
            Event::Mouse(mouse) => {
                self.handle_mouse_event(mouse);
                false
            }
            _ => false,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        match key.code {
            // In raw mode Ctrl+C arrives as a key event, not a signal
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.app.quit();
            }
            KeyCode::Char('q') => self.app.quit(),
            KeyCode::Down | KeyCode::Char('j') => self.app.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.app.select_prev(),
            // Vim-style page navigation
            KeyCode::Char('f') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.app.page_down();
            }
            KeyCode::Char('b') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.app.page_up();
            }
            KeyCode::PageDown => self.app.page_down(),
            KeyCode::PageUp => self.app.page_up(),
            KeyCode::Home | KeyCode::Char('g') => self.app.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.app.select_last(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.app.toggle_selected();
            }
            KeyCode::Char('c') => self.app.collapse_all(),
            _ => {}
        }
        self.app.should_quit
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollDown => self.app.scroll_by(WHEEL_STEP),
            MouseEventKind::ScrollUp => self.app.scroll_by(-WHEEL_STEP),
            _ => {}
        }
    }
}
