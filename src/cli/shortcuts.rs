//! Keyboard bindings.

use crossterm::event::KeyCode;
use wingoo_reader::TransportCommand;

/// Transport shortcut bound to `code`, if any.
pub fn transport_command(code: KeyCode) -> Option<TransportCommand> {
    match code {
        KeyCode::Char(' ') => Some(TransportCommand::TogglePause),
        KeyCode::Esc => Some(TransportCommand::Stop),
        KeyCode::Right => Some(TransportCommand::Next),
        KeyCode::Left => Some(TransportCommand::Previous),
        _ => None,
    }
}

/// Non-transport keys handled by the UI itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Quit,
    SelectPrevious,
    SelectNext,
    PlaySelected,
    PlayAll,
    VolumeUp,
    VolumeDown,
}

pub fn ui_action(code: KeyCode) -> Option<UiAction> {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(UiAction::Quit),
        KeyCode::Up | KeyCode::Char('k') => Some(UiAction::SelectPrevious),
        KeyCode::Down | KeyCode::Char('j') => Some(UiAction::SelectNext),
        KeyCode::Enter => Some(UiAction::PlaySelected),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(UiAction::PlayAll),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(UiAction::VolumeUp),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(UiAction::VolumeDown),
        _ => None,
    }
}
