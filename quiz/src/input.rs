use winit::event::VirtualKeyCode;

use crate::mode::Screen;
use crate::question::OptionKey;
use crate::zones::QuizEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quiz(QuizEvent),
    StartRun,
    ShowLeaderboard,
    Menu,
    Quit,
}

fn answer_key(key: VirtualKeyCode) -> Option<OptionKey> {
    match key {
        VirtualKeyCode::Key1 | VirtualKeyCode::Numpad1 => Some(OptionKey::A),
        VirtualKeyCode::Key2 | VirtualKeyCode::Numpad2 => Some(OptionKey::B),
        VirtualKeyCode::Key3 | VirtualKeyCode::Numpad3 => Some(OptionKey::C),
        VirtualKeyCode::Key4 | VirtualKeyCode::Numpad4 => Some(OptionKey::D),
        _ => None,
    }
}

/// Keyboard shortcuts. In game the digits answer and Space/Enter advances; the other screens
/// get the menu keys.
pub fn map_key(key: VirtualKeyCode, screen: Screen) -> Option<KeyAction> {
    if key == VirtualKeyCode::Escape {
        return Some(KeyAction::Quit);
    }

    match screen {
        Screen::Game => {
            if let Some(option) = answer_key(key) {
                return Some(KeyAction::Quiz(QuizEvent::Answer(option)));
            }
            match key {
                VirtualKeyCode::Space | VirtualKeyCode::Return | VirtualKeyCode::NumpadEnter => {
                    Some(KeyAction::Quiz(QuizEvent::Next))
                }
                _ => None,
            }
        }
        Screen::Start | Screen::GameOver | Screen::Leaderboard => match key {
            VirtualKeyCode::Return | VirtualKeyCode::NumpadEnter
                if screen != Screen::Leaderboard =>
            {
                Some(KeyAction::StartRun)
            }
            VirtualKeyCode::L => Some(KeyAction::ShowLeaderboard),
            VirtualKeyCode::M | VirtualKeyCode::Back => Some(KeyAction::Menu),
            _ => None,
        },
    }
}
