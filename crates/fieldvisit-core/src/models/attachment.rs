use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Photo category of the form.
///
/// Declaration order is the order categories are written and listed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Facade,
    Access,
    Traces,
    PrintsDna,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Facade,
        Category::Access,
        Category::Traces,
        Category::PrintsDna,
    ];

    /// Maximum number of photos kept for this category; extras are dropped.
    pub fn max_count(self) -> usize {
        match self {
            Category::Facade => 1,
            Category::Access => 3,
            Category::Traces => 10,
            Category::PrintsDna => 5,
        }
    }

    /// Name used for the category subdirectory and as file prefix.
    pub fn slug(self) -> &'static str {
        match self {
            Category::Facade => "facade",
            Category::Access => "access",
            Category::Traces => "traces",
            Category::PrintsDna => "prints_dna",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Facade => "facade",
            Category::Access => "access",
            Category::Traces => "traces",
            Category::PrintsDna => "prints/DNA",
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "facade" => Ok(Category::Facade),
            "access" => Ok(Category::Access),
            "traces" => Ok(Category::Traces),
            "prints_dna" | "prints/dna" | "prints-dna" | "prints" => Ok(Category::PrintsDna),
            _ => Err(anyhow::anyhow!("Invalid photo category: {}", s)),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.slug())
    }
}

/// One photo supplied by the form, already checked to be JPEG or PNG content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name as picked by the user. Informational only.
    pub filename_hint: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(filename_hint: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename_hint: filename_hint.into(),
            data: data.into(),
        }
    }
}

/// Photos of one submission grouped by category.
#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    by_category: BTreeMap<Category, Vec<Attachment>>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`AttachmentSet::extend`].
    pub fn with(mut self, category: Category, attachments: Vec<Attachment>) -> Self {
        self.extend(category, attachments);
        self
    }

    pub fn push(&mut self, category: Category, attachment: Attachment) {
        self.by_category.entry(category).or_default().push(attachment);
    }

    pub fn extend(&mut self, category: Category, attachments: Vec<Attachment>) {
        self.by_category
            .entry(category)
            .or_default()
            .extend(attachments);
    }

    /// Everything supplied for a category, including photos beyond the cap.
    pub fn get(&self, category: Category) -> &[Attachment] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Photos that will be stored for a category, in submission order.
    pub fn retained(&self, category: Category) -> &[Attachment] {
        let all = self.get(category);
        &all[..all.len().min(category.max_count())]
    }

    /// Remove a category from the set, handing back only the photos within its cap.
    pub fn take_retained(&mut self, category: Category) -> Vec<Attachment> {
        let mut kept = self.by_category.remove(&category).unwrap_or_default();
        kept.truncate(category.max_count());
        kept
    }

    /// Number of photos beyond the category cap.
    pub fn dropped(&self, category: Category) -> usize {
        self.get(category)
            .len()
            .saturating_sub(category.max_count())
    }

    pub fn total(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
