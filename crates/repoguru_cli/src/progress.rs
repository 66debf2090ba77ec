//! Rendering of library [`AnalysisProgress`] events.
//!
//! On a terminal the events drive indicatif bars; anywhere else (CI logs,
//! pipes) each event becomes a tracing record.

mod interactive;
mod logging;

use std::sync::Arc;

use console::Term;
use repoguru::{AnalysisProgress, ProgressCallback};

pub use interactive::InteractiveReporter;
pub use logging::LoggingReporter;

pub enum ProgressReporter {
    Interactive(InteractiveReporter),
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Bars only when both stdout and stderr are terminals.
    pub fn new() -> Self {
        if Term::stderr().is_term() && Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    pub fn handle(&self, event: AnalysisProgress) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| reporter.handle(event))
    }

    /// Clear any bars still drawn. No-op when logging.
    pub fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
