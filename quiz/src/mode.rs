use serde::{Deserialize, Serialize};

/// Top-level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    Start,
    Game,
    GameOver,
    Leaderboard,
}

/// Phase within a run. Only meaningful while the screen is `Game`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Idle,
    Question,
    Feedback,
    Finished,
}

/// Screen and phase folded into one tag, so impossible pairs (e.g. `Start` + `Feedback`)
/// cannot be represented. `screen()` and `status()` project it back out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Start,
    Question,
    Feedback,
    GameOver,
    /// The leaderboard keeps whatever status was current when it was opened.
    Leaderboard { status: Status },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeEvent {
    /// A run was (re)started.
    Begin,
    /// The current question got an answer or ran out of time.
    Resolve,
    /// Move on to another question in the same run.
    Advance,
    /// The last question was left.
    Finish,
    ShowLeaderboard,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeEffect {
    None,
    ResetRun,
    RecordScore,
    ReloadLeaderboard,
}

impl Mode {
    /// Pure transition function for the quiz mode.
    ///
    /// Side effects (resetting run fields, persisting a score) are reported via `ModeEffect`
    /// so the state machine can apply them in one step.
    pub fn handle(self, event: ModeEvent) -> (Mode, ModeEffect) {
        match (self, event) {
            (_, ModeEvent::Begin) => (Mode::Question, ModeEffect::ResetRun),
            (_, ModeEvent::Menu) => (Mode::Start, ModeEffect::ResetRun),
            (mode, ModeEvent::ShowLeaderboard) => (
                Mode::Leaderboard {
                    status: mode.status(),
                },
                ModeEffect::ReloadLeaderboard,
            ),

            (Mode::Question, ModeEvent::Resolve) => (Mode::Feedback, ModeEffect::None),

            (Mode::Question | Mode::Feedback, ModeEvent::Advance) => {
                (Mode::Question, ModeEffect::None)
            }
            (Mode::Question | Mode::Feedback, ModeEvent::Finish) => {
                (Mode::GameOver, ModeEffect::RecordScore)
            }

            // Ignore irrelevant events in the current state.
            (mode, _) => (mode, ModeEffect::None),
        }
    }

    pub fn screen(self) -> Screen {
        match self {
            Mode::Start => Screen::Start,
            Mode::Question | Mode::Feedback => Screen::Game,
            Mode::GameOver => Screen::GameOver,
            Mode::Leaderboard { .. } => Screen::Leaderboard,
        }
    }

    pub fn status(self) -> Status {
        match self {
            Mode::Start => Status::Idle,
            Mode::Question => Status::Question,
            Mode::Feedback => Status::Feedback,
            Mode::GameOver => Status::Finished,
            Mode::Leaderboard { status } => status,
        }
    }

    pub fn is_in_game(self) -> bool {
        self.screen() == Screen::Game
    }

    pub fn is_question(self) -> bool {
        matches!(self, Mode::Question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_start_idle() {
        assert_eq!(Mode::default().screen(), Screen::Start);
        assert_eq!(Mode::default().status(), Status::Idle);
    }

    #[test]
    fn begin_from_anywhere_enters_question_and_resets() {
        for mode in [Mode::Start, Mode::Feedback, Mode::GameOver] {
            assert_eq!(
                mode.handle(ModeEvent::Begin),
                (Mode::Question, ModeEffect::ResetRun)
            );
        }
    }

    #[test]
    fn resolve_only_leaves_question() {
        assert_eq!(
            Mode::Question.handle(ModeEvent::Resolve),
            (Mode::Feedback, ModeEffect::None)
        );
        assert_eq!(
            Mode::Feedback.handle(ModeEvent::Resolve),
            (Mode::Feedback, ModeEffect::None)
        );
        assert_eq!(
            Mode::Start.handle(ModeEvent::Resolve),
            (Mode::Start, ModeEffect::None)
        );
    }

    #[test]
    fn finish_records_score_only_in_game() {
        assert_eq!(
            Mode::Feedback.handle(ModeEvent::Finish),
            (Mode::GameOver, ModeEffect::RecordScore)
        );
        assert_eq!(
            Mode::GameOver.handle(ModeEvent::Finish),
            (Mode::GameOver, ModeEffect::None)
        );
    }

    #[test]
    fn advance_outside_game_is_ignored() {
        assert_eq!(
            Mode::Start.handle(ModeEvent::Advance),
            (Mode::Start, ModeEffect::None)
        );
        let board = Mode::Leaderboard {
            status: Status::Finished,
        };
        assert_eq!(board.handle(ModeEvent::Advance), (board, ModeEffect::None));
    }

    #[test]
    fn leaderboard_keeps_previous_status() {
        let (mode, effect) = Mode::GameOver.handle(ModeEvent::ShowLeaderboard);
        assert_eq!(mode.screen(), Screen::Leaderboard);
        assert_eq!(mode.status(), Status::Finished);
        assert_eq!(effect, ModeEffect::ReloadLeaderboard);

        let (mode, _) = Mode::Start.handle(ModeEvent::ShowLeaderboard);
        assert_eq!(mode.status(), Status::Idle);
    }
}
