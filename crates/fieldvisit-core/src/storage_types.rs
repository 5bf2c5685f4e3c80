use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// What to do when a visit directory for the same minute already exists.
///
/// Directory names only carry minute granularity (`YYYY-MM-DD_HH-MM`), so two
/// submissions within the same minute map to the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Share the directory; attachments with the same category and index are overwritten.
    #[default]
    Merge,
    /// Pick the first free `_2`, `_3`, ... suffix so earlier attachments are kept.
    Suffix,
}

impl FromStr for CollisionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merge" => Ok(CollisionPolicy::Merge),
            "suffix" => Ok(CollisionPolicy::Suffix),
            _ => Err(anyhow::anyhow!("Invalid collision policy: {}", s)),
        }
    }
}

impl Display for CollisionPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CollisionPolicy::Merge => write!(f, "merge"),
            CollisionPolicy::Suffix => write!(f, "suffix"),
        }
    }
}
