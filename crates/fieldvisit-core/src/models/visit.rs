use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::roster::Roster;
use crate::error::AppError;

/// A validated visit, ready to be recorded.
///
/// Latitude and longitude are kept as typed by the technician; they are never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub visit_date: NaiveDate,
    pub visit_time: NaiveTime,
    pub latitude: String,
    pub longitude: String,
    pub preservation: String,
    pub vehicle: String,
    pub companion: String,
    pub photographer: String,
    pub materials: String,
    pub notes: String,
    /// Directory holding the visit photos, set once the recorder has persisted them.
    #[serde(default)]
    pub storage_path: Option<String>,
}

impl VisitRecord {
    /// Copy of this record pointing at the directory its photos were written to.
    pub fn with_storage_path(self, storage_path: impl Into<String>) -> Self {
        Self {
            storage_path: Some(storage_path.into()),
            ..self
        }
    }
}

/// Form state owned by the caller while the technician fills it in.
///
/// Every field is optional here; [`VisitDraft::finalize`] turns it into a
/// [`VisitRecord`] and leaves the draft untouched so a rejected draft can be fixed
/// and submitted again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct VisitDraft {
    #[validate(required(message = "visit date is required"))]
    pub visit_date: Option<NaiveDate>,
    #[validate(required(message = "visit time is required"))]
    pub visit_time: Option<NaiveTime>,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    #[serde(default)]
    pub preservation: String,
    #[serde(default)]
    pub vehicle: String,
    #[serde(default)]
    pub companion: String,
    #[serde(default)]
    pub photographer: Option<String>,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub notes: String,
}

impl VisitDraft {
    /// Empty draft with date and time set to the current minute in `tz`.
    pub fn prefilled(tz: Tz) -> Self {
        let now = Utc::now().with_timezone(&tz);
        let time = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0);
        Self {
            visit_date: Some(now.date_naive()),
            visit_time: time,
            ..Self::default()
        }
    }

    /// Validate the draft against the roster and build the record.
    ///
    /// A missing or blank photographer falls back to the first roster entry.
    pub fn finalize(&self, roster: &Roster) -> Result<VisitRecord, AppError> {
        Validate::validate(self)?;

        let (Some(visit_date), Some(visit_time)) = (self.visit_date, self.visit_time) else {
            return Err(AppError::InvalidInput(
                "visit date and time are required".to_string(),
            ));
        };

        let photographer = match self
            .photographer
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            Some(name) if roster.contains(name) => name.to_string(),
            Some(name) => {
                return Err(AppError::InvalidInput(format!(
                    "photographer '{}' is not in the roster",
                    name
                )))
            }
            None => roster.default_name().to_string(),
        };

        Ok(VisitRecord {
            visit_date,
            visit_time,
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
            preservation: self.preservation.clone(),
            vehicle: self.vehicle.clone(),
            companion: self.companion.clone(),
            photographer,
            materials: self.materials.clone(),
            notes: self.notes.clone(),
            storage_path: None,
        })
    }
}
