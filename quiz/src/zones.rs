use std::collections::BTreeMap;

use engine::ui::Rect;
use serde::{Deserialize, Serialize};

use crate::mode::Mode;
use crate::question::OptionKey;
use crate::state::{GameState, Lifeline};

/// What a click or key press means to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuizEvent {
    Answer(OptionKey),
    Lifeline(Lifeline),
    Next,
}

/// Interactive rectangles of the last drawn frame, in logical units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneMap {
    pub answers: BTreeMap<OptionKey, Rect>,
    pub lifelines: BTreeMap<Lifeline, Rect>,
    pub next: Option<Rect>,
}

impl ZoneMap {
    pub fn clear(&mut self) {
        self.answers.clear();
        self.lifelines.clear();
        self.next = None;
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty() && self.lifelines.is_empty() && self.next.is_none()
    }
}

/// Resolves a logical pointer position against the zone map for the current phase.
pub fn locate(point: (f32, f32), zones: &ZoneMap, state: &GameState) -> Option<QuizEvent> {
    let (x, y) = point;
    match state.mode {
        Mode::Question => {
            let answer = zones
                .answers
                .iter()
                .filter(|(key, _)| !state.disabled_answers.contains(*key))
                .find(|(_, rect)| rect.contains(x, y))
                .map(|(key, _)| QuizEvent::Answer(*key));
            answer.or_else(|| {
                zones
                    .lifelines
                    .iter()
                    .filter(|(kind, _)| !state.lifelines.is_used(**kind))
                    .find(|(_, rect)| rect.contains(x, y))
                    .map(|(kind, _)| QuizEvent::Lifeline(*kind))
            })
        }
        Mode::Feedback => zones
            .next
            .filter(|rect| rect.contains(x, y))
            .map(|_| QuizEvent::Next),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones() -> ZoneMap {
        let mut z = ZoneMap::default();
        z.answers.insert(OptionKey::A, Rect::new(0.0, 0.0, 100.0, 40.0));
        z.answers.insert(OptionKey::B, Rect::new(110.0, 0.0, 100.0, 40.0));
        z.lifelines
            .insert(Lifeline::FiftyFifty, Rect::new(0.0, 100.0, 60.0, 30.0));
        z.lifelines.insert(Lifeline::Skip, Rect::new(70.0, 100.0, 60.0, 30.0));
        z
    }

    fn in_mode(mode: Mode) -> GameState {
        GameState {
            mode,
            ..GameState::default()
        }
    }

    #[test]
    fn question_phase_hits_answers_and_lifelines() {
        let s = in_mode(Mode::Question);
        assert_eq!(
            locate((10.0, 10.0), &zones(), &s),
            Some(QuizEvent::Answer(OptionKey::A))
        );
        assert_eq!(
            locate((100.0, 40.0), &zones(), &s),
            Some(QuizEvent::Answer(OptionKey::A)),
            "edges are inclusive"
        );
        assert_eq!(
            locate((80.0, 110.0), &zones(), &s),
            Some(QuizEvent::Lifeline(Lifeline::Skip))
        );
        assert_eq!(locate((105.0, 10.0), &zones(), &s), None);
    }

    #[test]
    fn disabled_answers_and_used_lifelines_are_inert() {
        let mut s = in_mode(Mode::Question);
        s.disabled_answers.insert(OptionKey::B);
        s.lifelines.skip_used = true;
        assert_eq!(locate((150.0, 10.0), &zones(), &s), None);
        assert_eq!(locate((80.0, 110.0), &zones(), &s), None);
        assert_eq!(
            locate((10.0, 110.0), &zones(), &s),
            Some(QuizEvent::Lifeline(Lifeline::FiftyFifty))
        );
    }

    #[test]
    fn feedback_phase_only_tests_next() {
        let mut z = zones();
        let s = in_mode(Mode::Feedback);
        assert_eq!(locate((10.0, 10.0), &z, &s), None);

        z.next = Some(Rect::new(0.0, 0.0, 50.0, 20.0));
        assert_eq!(locate((10.0, 10.0), &z, &s), Some(QuizEvent::Next));
    }

    #[test]
    fn no_events_outside_game() {
        let mut z = zones();
        z.next = Some(Rect::new(0.0, 0.0, 50.0, 20.0));
        for mode in [Mode::Start, Mode::GameOver] {
            assert_eq!(locate((10.0, 10.0), &z, &in_mode(mode)), None);
        }
    }
}
