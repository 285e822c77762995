//! A timed multiple-choice quiz: question bank and sampler, the gameplay state machine,
//! leaderboard persistence, an immediate-mode renderer with pointer hit testing, and the
//! session glue that drives it all from a winit window.

pub mod app;
pub mod backdrop;
pub mod bank;
pub mod input;
pub mod leaderboard;
pub mod machine;
pub mod mode;
pub mod overlay;
pub mod paths;
pub mod question;
pub mod render;
pub mod session;
pub mod settings;
pub mod state;
pub mod timers;
pub mod zones;
