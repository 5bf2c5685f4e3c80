use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ROSTER;
use crate::error::AppError;

/// Ordered list of photographers allowed to sign a visit.
///
/// Never empty: the first entry is the default selection of the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    pub fn new<I, S>(names: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cleaned: Vec<String> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            if name.is_empty() {
                continue;
            }
            if !cleaned.contains(&name) {
                cleaned.push(name);
            }
        }

        if cleaned.is_empty() {
            return Err(AppError::Config(
                "Photographer roster must contain at least one name".to_string(),
            ));
        }

        Ok(Self { names: cleaned })
    }

    /// Parse a `;`-separated list, as used by `FIELDVISIT_ROSTER`.
    pub fn parse(list: &str) -> Result<Self, AppError> {
        Self::new(list.split(';'))
    }

    pub fn default_name(&self) -> &str {
        &self.names[0]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            names: DEFAULT_ROSTER.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for Roster {
    type Error = AppError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Roster::new(names)
    }
}

impl From<Roster> for Vec<String> {
    fn from(roster: Roster) -> Self {
        roster.names
    }
}
