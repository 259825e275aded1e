//! Per-visitor UI state and page routing.
//!
//! A [`Session`] is an explicit value handed to each interaction: the page currently shown,
//! which planning slots have their recipe picker open, and notices waiting to be displayed.
//! Handlers take it, mutate it and hand it back; nothing here is global.

use crate::RepasError;
use repas_types::DaySlot;
use std::fmt;
use std::str::FromStr;

/// The four views of the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    Recettes,
    Planning,
    Liste,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::Recettes, Page::Planning, Page::Liste];

    pub fn as_str(self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Recettes => "recettes",
            Page::Planning => "planning",
            Page::Liste => "liste",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = RepasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| RepasError::InvalidInput(format!("unknown page: '{}'", s)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

/// A message shown once, on the next render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    page: Page,
    assigning: [bool; DaySlot::ALL.len()],
    notices: Vec<Notice>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Unconditionally switches to `page`.
    pub fn navigate(&mut self, page: Page) {
        self.page = page;
    }

    pub fn is_assigning(&self, slot: DaySlot) -> bool {
        self.assigning[slot.index()]
    }

    pub fn set_assigning(&mut self, slot: DaySlot, assigning: bool) {
        self.assigning[slot.index()] = assigning;
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn notify_all(&mut self, notices: impl IntoIterator<Item = Notice>) {
        self.notices.extend(notices);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Removes and returns the pending notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_home_with_no_flags() {
        let session = Session::new();
        assert_eq!(session.page(), Page::Home);
        assert!(DaySlot::ALL.iter().all(|s| !session.is_assigning(*s)));
        assert!(session.notices().is_empty());
    }

    #[test]
    fn test_navigate_overwrites() {
        let mut session = Session::new();
        session.navigate(Page::Planning);
        session.navigate(Page::Planning);
        assert_eq!(session.page(), Page::Planning);
        session.navigate(Page::Home);
        assert_eq!(session.page(), Page::Home);
    }

    #[test]
    fn test_slot_flags_are_independent() {
        let mut session = Session::new();
        session.set_assigning(DaySlot::MardiSoir, true);
        assert!(session.is_assigning(DaySlot::MardiSoir));
        assert!(!session.is_assigning(DaySlot::MardiMidi));
        session.set_assigning(DaySlot::MardiSoir, false);
        assert!(!session.is_assigning(DaySlot::MardiSoir));
    }

    #[test]
    fn test_take_notices_drains() {
        let mut session = Session::new();
        session.notify(Notice::success("Recette créée"));
        session.notify_all([Notice::error("Erreur upload: boom")]);
        let notices = session.take_notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn test_page_parse() {
        assert_eq!("liste".parse::<Page>().unwrap(), Page::Liste);
        assert!("admin".parse::<Page>().is_err());
        for page in Page::ALL {
            assert_eq!(page.as_str().parse::<Page>().unwrap(), page);
        }
    }
}
