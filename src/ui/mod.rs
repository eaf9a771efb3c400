pub mod error;
pub mod format;
pub mod dashboard;
pub mod api_keys;
pub mod strategy_form;

pub use error::*;
pub use dashboard::*;
pub use api_keys::*;
pub use strategy_form::*;

use std::collections::BTreeMap;

/// Named parts of a page that controllers redraw wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    DashboardStatus,
    StrategyList,
    ApiKeyRows,
    ApiKeyForm,
    StrategyForm,
}

/// Host the controllers render into and interact with the user through.
///
/// Controllers only ever replace whole regions; there is no incremental
/// patching.
pub trait Surface: Send {
    fn replace(&mut self, region: Region, html: String);
    /// Blocking, user-visible notice
    fn alert(&mut self, message: &str);
    /// Asks the user to approve a destructive action
    fn confirm(&mut self, prompt: &str) -> bool;
    fn navigate(&mut self, path: &str);
}

/// In-memory surface backing one rendered page.
///
/// Confirmation is answered up front: a surface built with
/// [`PageSurface::confirmed`] approves every prompt, otherwise the first
/// prompt is recorded so the page can ask the user and re-submit.
#[derive(Debug, Clone, Default)]
pub struct PageSurface {
    regions: BTreeMap<Region, String>,
    alerts: Vec<String>,
    confirmed: bool,
    pending_confirmation: Option<String>,
    redirect: Option<String>,
}

impl PageSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirmed() -> Self {
        Self {
            confirmed: true,
            ..Self::default()
        }
    }

    pub fn region(&self, region: Region) -> Option<&str> {
        self.regions.get(&region).map(String::as_str)
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    pub fn pending_confirmation(&self) -> Option<&str> {
        self.pending_confirmation.as_deref()
    }

    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }
}

impl Surface for PageSurface {
    fn replace(&mut self, region: Region, html: String) {
        self.regions.insert(region, html);
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.confirmed {
            return true;
        }
        if self.pending_confirmation.is_none() {
            self.pending_confirmation = Some(prompt.to_string());
        }
        false
    }

    fn navigate(&mut self, path: &str) {
        self.redirect = Some(path.to_string());
    }
}
