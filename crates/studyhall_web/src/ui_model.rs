//! Page inventory shared by wasm and native builds.
//!
//! Keeping this out of the wasm-only `web` module allows us to unit-test the
//! navigation inventory and the idle-preload selection on the host.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Dashboard,
    Study,
    Flashcards,
    Quiz,
    Progress,
    Settings,
}

impl Page {
    pub fn label(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Study => "Study",
            Page::Flashcards => "Flashcards",
            Page::Quiz => "Quiz",
            Page::Progress => "Progress",
            Page::Settings => "Settings",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Page::Dashboard => "🏠",
            Page::Study => "📖",
            Page::Flashcards => "🃏",
            Page::Quiz => "❓",
            Page::Progress => "📈",
            Page::Settings => "⚙️",
        }
    }

    /// Stable unit name, used in logs and load errors.
    pub fn unit_name(self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Study => "study",
            Page::Flashcards => "flashcards",
            Page::Quiz => "quiz",
            Page::Progress => "progress",
            Page::Settings => "settings",
        }
    }

    /// Pages most sessions open soon after landing. These are warmed once the
    /// app has been idle for the preload delay.
    pub fn preload_on_idle(self) -> bool {
        matches!(self, Page::Dashboard | Page::Study | Page::Flashcards)
    }

    pub fn all() -> &'static [Page] {
        &[
            Page::Dashboard,
            Page::Study,
            Page::Flashcards,
            Page::Quiz,
            Page::Progress,
            Page::Settings,
        ]
    }

    pub fn idle_preload_set() -> Vec<Page> {
        Self::all()
            .iter()
            .copied()
            .filter(|p| p.preload_on_idle())
            .collect()
    }
}
