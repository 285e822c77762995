//! Text rendition of the screens that are not drawn into the window.

use std::fmt::Write as _;
use std::io::Write;

use crate::machine::{GameStateMachine, SubscriptionId};
use crate::mode::Screen;
use crate::state::GameState;

/// Prints the start, game-over and leaderboard screens whenever the screen changes.
pub struct TerminalOverlay;

impl TerminalOverlay {
    pub fn attach(machine: &mut GameStateMachine) -> SubscriptionId {
        Self::attach_to(machine, std::io::stdout())
    }

    pub fn attach_to(
        machine: &mut GameStateMachine,
        mut out: impl Write + 'static,
    ) -> SubscriptionId {
        let mut last: Option<Screen> = None;
        machine.subscribe(move |state| {
            let screen = state.screen();
            if last == Some(screen) {
                return;
            }
            last = Some(screen);
            if let Some(text) = format_screen(state) {
                if let Err(err) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
                    tracing::warn!("overlay write failed: {err}");
                }
            }
        })
    }
}

/// Text for the current screen, or `None` while a run is on screen.
pub fn format_screen(state: &GameState) -> Option<String> {
    let mut out = String::new();
    match state.screen() {
        Screen::Game => return None,
        Screen::Start => {
            out.push_str("\nQUIZ RUSH\n");
            let _ = writeln!(out, "  category: {}", state.selected_category);
            out.push_str("  [Enter] start  [L] leaderboard  [Esc] quit\n");
        }
        Screen::GameOver => {
            out.push_str("\nGAME OVER\n");
            let _ = writeln!(out, "  {}: {} points", state.player_name, state.score);
            out.push_str("  [Enter] play again  [L] leaderboard  [M] menu  [Esc] quit\n");
        }
        Screen::Leaderboard => {
            out.push_str("\nLEADERBOARD\n");
            if state.leaderboard.is_empty() {
                out.push_str("  no scores yet\n");
            }
            for (rank, entry) in state.leaderboard.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {:>2}. {:<20} {:>6}  {}",
                    rank + 1,
                    entry.name,
                    entry.score,
                    entry.timestamp.format("%Y-%m-%d %H:%M")
                );
            }
            out.push_str("  [M] menu  [Esc] quit\n");
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::state::LeaderboardEntry;
    use chrono::{TimeZone, Utc};

    #[test]
    fn game_screen_prints_nothing() {
        let state = GameState {
            mode: Mode::Question,
            ..GameState::default()
        };
        assert_eq!(format_screen(&state), None);
    }

    #[test]
    fn game_over_shows_final_score() {
        let state = GameState {
            mode: Mode::GameOver,
            player_name: "ada".into(),
            score: 250,
            ..GameState::default()
        };
        let text = format_screen(&state).expect("game over text");
        assert!(text.contains("GAME OVER"));
        assert!(text.contains("ada: 250 points"));
    }

    #[test]
    fn leaderboard_lists_entries_in_order() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let state = GameState {
            mode: Mode::Leaderboard {
                status: crate::mode::Status::Idle,
            },
            leaderboard: vec![
                LeaderboardEntry {
                    name: "ada".into(),
                    score: 300,
                    timestamp: at,
                },
                LeaderboardEntry {
                    name: "bob".into(),
                    score: 120,
                    timestamp: at,
                },
            ],
            ..GameState::default()
        };
        let text = format_screen(&state).expect("leaderboard text");
        let ada = text.find("ada").expect("ada listed");
        let bob = text.find("bob").expect("bob listed");
        assert!(ada < bob);
        assert!(text.contains("2024-05-01 12:30"));
        assert!(text.contains(" 1. "));
    }
}
