use std::sync::Arc;

use chrono::{DateTime, Utc};
use firdesk_ai::{FaqMatcher, IncidentClassifier, Triage};

/// Immutable context shared by every request handler.
///
/// Built once at startup, before the listener is bound, and never mutated.
pub struct AppState {
    pub matcher: FaqMatcher,
    pub incidents: Arc<IncidentClassifier>,
    pub triage: Triage,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(matcher: FaqMatcher, incidents: Arc<IncidentClassifier>, triage: Triage) -> Self {
        Self {
            matcher,
            incidents,
            triage,
            started_at: Utc::now(),
        }
    }
}
