// Per-tab fault boundary.
//
// Wraps construction and rendering of one tab's module content. An `Err` or a
// panic is recorded locally, forwarded once to the error sink as
// (tab id, message), and replaced by a recovery view. Nothing escapes the tab.

use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::Result;

/// Receives `(tab_id, message)` for every caught fault.
pub type ErrorSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Construct,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Construct => write!(f, "constructing"),
            Stage::Render => write!(f, "rendering"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fault {
    pub stage: Stage,
    pub message: String,
    pub detail: String,
}

impl Fault {
    /// Recovery screen in `locale`; locales without their own copy get English.
    pub fn recovery_view(&self, show_details: bool, locale: &str) -> RecoveryView {
        let copy = RecoveryCopy::for_locale(locale);
        RecoveryView {
            title: copy.title.to_string(),
            summary: copy.summary.to_string(),
            message: self.message.clone(),
            details_label: copy.details_label.to_string(),
            detail: show_details.then(|| self.detail.clone()),
            retry_label: copy.retry_label.to_string(),
            note: copy.note.to_string(),
        }
    }
}

struct RecoveryCopy {
    title: &'static str,
    summary: &'static str,
    details_label: &'static str,
    retry_label: &'static str,
    note: &'static str,
}

impl RecoveryCopy {
    const ENGLISH: Self = Self {
        title: "Error in this tab",
        summary: "An error occurred in this module. Other tabs keep working normally.",
        details_label: "Error details",
        retry_label: "Retry",
        note: "This tab is isolated from the others. You can keep using the application.",
    };

    const FRENCH: Self = Self {
        title: "Erreur dans cet onglet",
        summary: "Une erreur s'est produite dans ce module. Les autres onglets continuent de fonctionner normalement.",
        details_label: "Détails de l'erreur",
        retry_label: "Réessayer",
        note: "Cet onglet est isolé des autres. Vous pouvez continuer à utiliser l'application.",
    };

    fn for_locale(locale: &str) -> &'static Self {
        match locale {
            "french" => &Self::FRENCH,
            _ => &Self::ENGLISH,
        }
    }
}

/// Shown in place of a failed module.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryView {
    pub title: String,
    pub summary: String,
    pub message: String,
    pub details_label: String,
    /// Collapsible diagnostic detail.
    pub detail: Option<String>,
    pub retry_label: String,
    pub note: String,
}

pub struct FaultBoundary {
    tab_id: String,
    fault: Option<Fault>,
    on_error: ErrorSink,
}

impl FaultBoundary {
    pub fn new(tab_id: &str, on_error: ErrorSink) -> Self {
        Self {
            tab_id: tab_id.to_string(),
            fault: None,
            on_error,
        }
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    pub fn has_fault(&self) -> bool {
        self.fault.is_some()
    }

    /// Runs `f` inside the boundary. While a fault is recorded nothing runs
    /// and the recorded fault is returned.
    pub fn run<T>(&mut self, stage: Stage, f: impl FnOnce() -> Result<T>) -> std::result::Result<T, Fault> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }

        let fault = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => Fault {
                stage,
                message: err.to_string(),
                detail: format!("error while {} tab '{}': {:?}", stage, self.tab_id, err),
            },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                Fault {
                    stage,
                    detail: format!("panic while {} tab '{}': {}", stage, self.tab_id, message),
                    message,
                }
            }
        };

        log::warn!("[Boundary] Tab '{}' failed: {}", self.tab_id, fault.detail);
        (self.on_error)(&self.tab_id, &fault.message);
        self.fault = Some(fault.clone());
        Err(fault)
    }

    /// Clears the local fault so the next `run` executes again. The tab's
    /// session-level error is left for the caller to clear.
    pub fn retry(&mut self) -> bool {
        self.fault.take().is_some()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
