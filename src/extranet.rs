// Supplier authoring wizard
// A fixed sequence of authoring steps for one activity listing. The itinerary step
// owns the session's itinerary and persists it before moving on.

use std::{fmt, str::FromStr, sync::Arc};

use thiserror::Error;
use tracing::{error, info, warn};
use url::form_urlencoded;

use crate::{
    api_client::{ApiError, TravelApi},
    itinerary::{ItineraryAction, ItineraryData, ItineraryError, ItineraryStore},
};

pub const CURRENT_STEP_PARAM: &str = "currentStep";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtranetError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Itinerary(#[from] ItineraryError),

    #[error("No activity selected for this authoring session")]
    MissingActivity,

    #[error("Unknown wizard step: {0}")]
    UnknownStep(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WizardStep {
    #[default]
    BasicInfo,
    Description,
    Itinerary,
    Pricing,
    Availability,
    Photos,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 7] = [
        WizardStep::BasicInfo,
        WizardStep::Description,
        WizardStep::Itinerary,
        WizardStep::Pricing,
        WizardStep::Availability,
        WizardStep::Photos,
        WizardStep::Review,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            WizardStep::BasicInfo => "basic-info",
            WizardStep::Description => "description",
            WizardStep::Itinerary => "itinerary",
            WizardStep::Pricing => "pricing",
            WizardStep::Availability => "availability",
            WizardStep::Photos => "photos",
            WizardStep::Review => "review",
        }
    }

    // 1-based, as it appears in `currentStep`
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0) + 1
    }

    pub fn from_number(number: usize) -> Option<Self> {
        number.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    pub fn is_first(self) -> bool {
        self.previous().is_none()
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }

    pub fn title_key(self) -> &'static str {
        match self {
            WizardStep::BasicInfo => "wizard.basic_info",
            WizardStep::Description => "wizard.description",
            WizardStep::Itinerary => "wizard.itinerary",
            WizardStep::Pricing => "wizard.pricing",
            WizardStep::Availability => "wizard.availability",
            WizardStep::Photos => "wizard.photos",
            WizardStep::Review => "wizard.review",
        }
    }

    // Reads `currentStep` from a query string. Missing or unreadable values yield None.
    pub fn from_query(query: &str) -> Option<Self> {
        form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .find(|(key, _)| key == CURRENT_STEP_PARAM)
            .and_then(|(_, value)| match value.parse() {
                Ok(step) => Some(step),
                Err(e) => {
                    warn!(error = %e, "ignoring currentStep");
                    None
                }
            })
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// Accepts either the slug or the 1-based step number
impl FromStr for WizardStep {
    type Err = ExtranetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(number) = s.parse::<usize>() {
            return Self::from_number(number)
                .ok_or_else(|| ExtranetError::UnknownStep(s.to_string()));
        }
        Self::ALL
            .iter()
            .copied()
            .find(|step| step.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| ExtranetError::UnknownStep(s.to_string()))
    }
}

pub struct ExtranetWizard {
    api: Arc<dyn TravelApi>,
    activity_id: Option<String>,
    step: WizardStep,
    itinerary: ItineraryStore,
}

impl ExtranetWizard {
    pub fn new(api: Arc<dyn TravelApi>, activity_id: Option<String>, step: WizardStep) -> Self {
        Self {
            api,
            activity_id,
            step,
            itinerary: ItineraryStore::default(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn activity_id(&self) -> Option<&str> {
        self.activity_id.as_deref()
    }

    pub fn itinerary(&self) -> &ItineraryStore {
        &self.itinerary
    }

    // Seeds the itinerary title from the listing being edited. A failed load keeps the
    // placeholder itinerary.
    pub async fn load(&self) -> Result<(), ExtranetError> {
        let activity_id = self.activity_id.as_deref().ok_or(ExtranetError::MissingActivity)?;
        match self.api.activity_details(activity_id).await {
            Ok(details) => {
                let mut data = ItineraryData::example();
                data.title = details.summary.title;
                self.itinerary.dispatch(ItineraryAction::Replace(data))?;
                Ok(())
            }
            Err(e) => {
                error!(%activity_id, error = %e, "loading activity failed");
                Err(e.into())
            }
        }
    }

    pub fn go_to(&mut self, step: WizardStep) {
        self.step = step;
    }

    pub fn previous(&mut self) -> WizardStep {
        if let Some(step) = self.step.previous() {
            self.step = step;
        }
        self.step
    }

    pub async fn save_itinerary(&self) -> Result<(), ExtranetError> {
        let activity_id = self.activity_id.as_deref().ok_or(ExtranetError::MissingActivity)?;
        let data = self.itinerary.snapshot();
        data.validate()?;

        match self.api.save_itinerary(activity_id, &data).await {
            Ok(()) => {
                info!(%activity_id, items = data.items.len(), "itinerary saved");
                Ok(())
            }
            Err(e) => {
                error!(%activity_id, error = %e, "saving itinerary failed");
                Err(e.into())
            }
        }
    }

    // Persists the itinerary when leaving that step. The step only advances after a
    // successful save.
    pub async fn next(&mut self) -> Result<WizardStep, ExtranetError> {
        if self.step == WizardStep::Itinerary {
            self.save_itinerary().await?;
        }
        if let Some(step) = self.step.next() {
            self.step = step;
        }
        Ok(self.step)
    }
}
