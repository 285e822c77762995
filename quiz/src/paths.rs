//! Per-user file locations for settings and results.

use std::ffi::OsString;
use std::path::PathBuf;

const APP_DIR: &str = "quiz-rush";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDir {
    /// `$XDG_CONFIG_HOME`, else `~/.config`.
    Config,
    /// `$XDG_DATA_HOME`, else `~/.local/share`.
    Data,
}

impl UserDir {
    fn xdg_var(self) -> &'static str {
        match self {
            UserDir::Config => "XDG_CONFIG_HOME",
            UserDir::Data => "XDG_DATA_HOME",
        }
    }

    fn under_home(self) -> &'static [&'static str] {
        match self {
            UserDir::Config => &[".config"],
            UserDir::Data => &[".local", "share"],
        }
    }
}

/// The path named by `override_var` if set, else `<dir>/quiz-rush/<file_name>`.
pub fn user_file(override_var: &str, dir: UserDir, file_name: &str) -> PathBuf {
    if let Some(explicit) = std::env::var_os(override_var).filter(|v| !v.is_empty()) {
        return PathBuf::from(explicit);
    }
    resolve(
        std::env::var_os(dir.xdg_var()),
        std::env::var_os("HOME"),
        dir,
        file_name,
    )
}

fn resolve(xdg: Option<OsString>, home: Option<OsString>, dir: UserDir, file_name: &str) -> PathBuf {
    let base = match (xdg.filter(|v| !v.is_empty()), home) {
        (Some(xdg), _) => PathBuf::from(xdg),
        (None, Some(home)) => dir
            .under_home()
            .iter()
            .fold(PathBuf::from(home), |p, part| p.join(part)),
        // No home at all: keep files beside the working directory.
        (None, None) => PathBuf::from("."),
    };
    base.join(APP_DIR).join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_dir_wins_over_home() {
        let p = resolve(
            Some("/xdg".into()),
            Some("/home/ada".into()),
            UserDir::Config,
            "settings.json",
        );
        assert_eq!(p, PathBuf::from("/xdg/quiz-rush/settings.json"));
    }

    #[test]
    fn home_fallback_depends_on_the_kind_of_file() {
        let home = || Some(OsString::from("/home/ada"));
        assert_eq!(
            resolve(Some("".into()), home(), UserDir::Config, "settings.json"),
            PathBuf::from("/home/ada/.config/quiz-rush/settings.json")
        );
        assert_eq!(
            resolve(None, home(), UserDir::Data, "leaderboard.json"),
            PathBuf::from("/home/ada/.local/share/quiz-rush/leaderboard.json")
        );
        assert_eq!(
            resolve(None, None, UserDir::Data, "leaderboard.json"),
            PathBuf::from("./quiz-rush/leaderboard.json")
        );
    }
}
