use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnnotatorConfig;
use crate::error::{AnnotatorError, Result};
use crate::facet;
use crate::filter::FilterSet;
use crate::highlight::HighlightSet;
use crate::import::{self, ImportProfile};
use crate::rating::{RatingLedger, RatingScale, RatingSubmission};
use crate::record::{Record, RecordStore};
use crate::report::{
    ApplicationEvaluation, ApplicationInsights, DataInsights, InsightsTemplate, ProfileSummary,
    RecordTemplate,
};

const SAMPLE_RECORDS: &[u8] = include_bytes!("../assets/sample_records.tsv");
const SAMPLE_APPLICATIONS: &[u8] = include_bytes!("../assets/sample_applications.tsv");

/// The two review screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewKind {
    DataRows,
    Applications,
}

impl ViewKind {
    pub fn import_profile(self, config: &AnnotatorConfig) -> ImportProfile {
        match self {
            ViewKind::DataRows => ImportProfile::Generic,
            ViewKind::Applications => ImportProfile::Applications {
                code_prefix: config.application_code_prefix.clone(),
            },
        }
    }

    pub fn rating_scale(self, config: &AnnotatorConfig) -> RatingScale {
        match self {
            ViewKind::DataRows => config.data_rows_rating,
            ViewKind::Applications => config.applications_rating,
        }
    }

    pub fn record_report_delay(self, config: &AnnotatorConfig) -> Duration {
        match self {
            ViewKind::DataRows => config.summary_delay(),
            ViewKind::Applications => config.evaluation_delay(),
        }
    }

    pub fn record_report_title(self) -> &'static str {
        match self {
            ViewKind::DataRows => "AI Summary",
            ViewKind::Applications => "AI Evaluation Report",
        }
    }

    pub fn insights_title(self) -> &'static str {
        match self {
            ViewKind::DataRows => "AI Generated Insights",
            ViewKind::Applications => "AI Generated Application Insights",
        }
    }

    pub fn record_title(self, record: &Record) -> String {
        match self {
            ViewKind::DataRows => format!("Details for {}", record.display("name")),
            ViewKind::Applications => record.display("brand_name"),
        }
    }

    pub fn record_subtitle(self, record: &Record) -> Option<String> {
        match self {
            ViewKind::DataRows => None,
            ViewKind::Applications => Some(format!(
                "Application Code: {}",
                record.display("application_code")
            )),
        }
    }

    pub fn rating_confirmation(self, record: &Record, score: f64) -> String {
        match self {
            ViewKind::DataRows => format!("Rating of {score} stars submitted successfully!"),
            ViewKind::Applications => format!(
                "Rating of {score}/10 submitted for {}!",
                record.display("brand_name")
            ),
        }
    }

    fn sample(self) -> &'static [u8] {
        match self {
            ViewKind::DataRows => SAMPLE_RECORDS,
            ViewKind::Applications => SAMPLE_APPLICATIONS,
        }
    }
}

/// Templates a screen renders its generated text with.
#[derive(Clone)]
pub struct ViewTemplates {
    pub record: Arc<dyn RecordTemplate>,
    pub insights: Arc<dyn InsightsTemplate>,
}

impl ViewTemplates {
    pub fn new(
        record: impl RecordTemplate + 'static,
        insights: impl InsightsTemplate + 'static,
    ) -> Self {
        Self {
            record: Arc::new(record),
            insights: Arc::new(insights),
        }
    }

    pub fn for_view(kind: ViewKind) -> Self {
        match kind {
            ViewKind::DataRows => Self::new(ProfileSummary, DataInsights),
            ViewKind::Applications => Self::new(ApplicationEvaluation, ApplicationInsights),
        }
    }
}

impl fmt::Debug for ViewTemplates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewTemplates").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GenerationKind {
    Insights,
    RecordReport,
}

/// Proof that a generation was started; handed back when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket {
    pub kind: GenerationKind,
    epoch: u64,
}

/// Everything one screen knows: loaded records, filter clauses, highlight
/// terms, the open record, the in-flight generation and submitted ratings.
#[derive(Debug)]
pub struct ViewSession {
    kind: ViewKind,
    store: RecordStore,
    filters: FilterSet,
    highlights: HighlightSet,
    selection: Option<String>,
    // Bumped whenever the screen a pending generation belongs to goes away.
    // The slot is freed at the same time.
    epoch: u64,
    pending: Option<GenerationTicket>,
    ratings: RatingLedger,
}

impl ViewSession {
    pub fn new(kind: ViewKind, store: RecordStore) -> Self {
        Self {
            kind,
            store,
            filters: FilterSet::new(),
            highlights: HighlightSet::new(),
            selection: None,
            epoch: 0,
            pending: None,
            ratings: RatingLedger::new(),
        }
    }

    /// Session preloaded with the bundled sample sheet of `kind`.
    pub fn seeded(kind: ViewKind, config: &AnnotatorConfig) -> Result<Self> {
        let outcome = import::import_delimited(kind.sample(), &kind.import_profile(config))?;
        Ok(Self::new(kind, outcome.store))
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterSet {
        &mut self.filters
    }

    pub fn highlights(&self) -> &HighlightSet {
        &self.highlights
    }

    pub fn highlights_mut(&mut self) -> &mut HighlightSet {
        &mut self.highlights
    }

    pub fn ratings(&self) -> &RatingLedger {
        &self.ratings
    }

    pub fn filtered(&self) -> Vec<&Record> {
        self.filters.apply(self.store.records())
    }

    pub fn unique_values(&self, column: &str) -> Vec<String> {
        facet::unique_values(self.store.records(), column)
    }

    pub fn record(&self, id: &str) -> Result<&Record> {
        self.store
            .get(id)
            .ok_or_else(|| AnnotatorError::RecordNotFound(id.to_string()))
    }

    pub fn selection(&self) -> Option<&Record> {
        self.selection.as_deref().and_then(|id| self.store.get(id))
    }

    pub fn select(&mut self, id: &str) -> Result<&Record> {
        if self.store.get(id).is_none() {
            return Err(AnnotatorError::RecordNotFound(id.to_string()));
        }
        self.selection = Some(id.to_string());
        self.discard_pending();
        debug!(view = ?self.kind, id, "selected record");
        self.record(id)
    }

    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.discard_pending();
            debug!(view = ?self.kind, "cleared selection");
        }
    }

    /// Swaps in a freshly imported store. Clauses and the selection refer to
    /// the old records, so both are dropped; highlights stay.
    pub fn replace_store(&mut self, store: RecordStore) {
        info!(view = ?self.kind, records = store.len(), "replaced records");
        self.store = store;
        self.filters.reset_clauses();
        self.selection = None;
        self.discard_pending();
    }

    fn discard_pending(&mut self) {
        self.epoch += 1;
        if let Some(ticket) = self.pending.take() {
            debug!(view = ?self.kind, kind = ?ticket.kind, "pending generation will be discarded");
        }
    }

    pub fn is_generating(&self) -> bool {
        self.pending.is_some()
    }

    pub fn begin_generation(&mut self, kind: GenerationKind) -> Result<GenerationTicket> {
        if self.pending.is_some() {
            return Err(AnnotatorError::GenerationInProgress);
        }
        let ticket = GenerationTicket {
            kind,
            epoch: self.epoch,
        };
        self.pending = Some(ticket);
        debug!(view = ?self.kind, ?kind, "generation started");
        Ok(ticket)
    }

    /// Frees the generation slot. Fails when the screen that asked for the
    /// text is gone, in which case the result must be dropped; its slot was
    /// already released when the screen went away.
    pub fn finish_generation(&mut self, ticket: GenerationTicket) -> Result<()> {
        if self.pending == Some(ticket) {
            self.pending = None;
        }
        if ticket.epoch != self.epoch {
            warn!(view = ?self.kind, kind = ?ticket.kind, "discarding stale generation");
            return Err(AnnotatorError::StaleGeneration);
        }
        Ok(())
    }

    pub fn submit_rating(&mut self, id: &str, input: &str, scale: RatingScale) -> Result<&RatingSubmission> {
        self.record(id)?;
        self.ratings.submit(id, input, scale)
    }
}

/// State managed by the desktop shell: configuration plus one session per
/// screen.
#[derive(Debug)]
pub struct AppState {
    config: AnnotatorConfig,
    data_rows: Mutex<ViewSession>,
    applications: Mutex<ViewSession>,
    data_rows_templates: ViewTemplates,
    applications_templates: ViewTemplates,
}

impl AppState {
    pub fn new(config: AnnotatorConfig) -> Result<Self> {
        let data_rows = ViewSession::seeded(ViewKind::DataRows, &config)?;
        let applications = ViewSession::seeded(ViewKind::Applications, &config)?;
        Ok(Self::with_sessions(config, data_rows, applications))
    }

    pub fn with_sessions(config: AnnotatorConfig, data_rows: ViewSession, applications: ViewSession) -> Self {
        Self {
            config,
            data_rows: Mutex::new(data_rows),
            applications: Mutex::new(applications),
            data_rows_templates: ViewTemplates::for_view(ViewKind::DataRows),
            applications_templates: ViewTemplates::for_view(ViewKind::Applications),
        }
    }

    /// Replaces the built-in templates of one screen.
    pub fn with_templates(mut self, kind: ViewKind, templates: ViewTemplates) -> Self {
        match kind {
            ViewKind::DataRows => self.data_rows_templates = templates,
            ViewKind::Applications => self.applications_templates = templates,
        }
        self
    }

    pub fn templates(&self, kind: ViewKind) -> &ViewTemplates {
        match kind {
            ViewKind::DataRows => &self.data_rows_templates,
            ViewKind::Applications => &self.applications_templates,
        }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn session(&self, kind: ViewKind) -> &Mutex<ViewSession> {
        match kind {
            ViewKind::DataRows => &self.data_rows,
            ViewKind::Applications => &self.applications,
        }
    }
}
