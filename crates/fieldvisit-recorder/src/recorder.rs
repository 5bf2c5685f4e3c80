use std::collections::BTreeMap;
use std::sync::Arc;

use fieldvisit_core::{AppError, AttachmentSet, Category, CollisionPolicy, Config, VisitRecord};
use fieldvisit_storage::keys::{
    attachment_key, category_key, suffixed_dir_name, visit_dir_key, visit_dir_name,
};
use fieldvisit_storage::{create_storage, Storage};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::ledger::{Ledger, LedgerRow};

/// Upper bound on `_n` suffixes tried for one minute under [`CollisionPolicy::Suffix`].
const MAX_DIR_SUFFIX: u32 = 1000;

/// Outcome of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    /// The recorded visit, with `storage_path` set.
    pub visit: VisitRecord,
    /// Location of the visit directory, as written to the ledger.
    pub storage_path: String,
    /// Name of the visit directory (`YYYY-MM-DD_HH-MM`, possibly suffixed).
    pub visit_dir_name: String,
    /// Storage keys of the photos written, in category order.
    pub written: Vec<String>,
    /// Photos discarded per category because they exceeded its limit.
    pub dropped: BTreeMap<Category, usize>,
    /// Ledger size after this submission.
    pub ledger_rows: usize,
}

impl Receipt {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Persists a visit: photos into its directory, then one ledger row.
///
/// Submissions going through the same recorder are serialized, so two concurrent
/// calls cannot both read the ledger before either has rewritten it. Separate
/// processes sharing a ledger file are not coordinated.
pub struct SubmissionRecorder {
    storage: Arc<dyn Storage>,
    ledger: Ledger,
    collision_policy: CollisionPolicy,
    submit_lock: Mutex<()>,
}

impl SubmissionRecorder {
    pub fn new(storage: Arc<dyn Storage>, ledger: Ledger, collision_policy: CollisionPolicy) -> Self {
        Self {
            storage,
            ledger,
            collision_policy,
            submit_lock: Mutex::new(()),
        }
    }

    /// Local storage under the configured base directory and the configured ledger.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let storage = create_storage(config).await?;
        Ok(Self::new(
            storage,
            Ledger::new(config.ledger_path()),
            config.collision_policy(),
        ))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    /// Record one visit.
    ///
    /// Photos beyond a category's limit are dropped and reported in the receipt.
    /// Every category directory is created, even when it receives no photo. A failure
    /// aborts the submission as is: photos already written stay on disk even if the
    /// ledger could not be updated.
    pub async fn record(
        &self,
        visit: VisitRecord,
        mut attachments: AttachmentSet,
    ) -> Result<Receipt, AppError> {
        let _guard = self.submit_lock.lock().await;
        let start = std::time::Instant::now();

        let (dir_name, visit_key) = self.resolve_visit_dir(&visit).await?;
        self.storage.create_dir(&visit_key).await?;

        let mut written = Vec::new();
        let mut dropped = BTreeMap::new();
        for category in Category::ALL {
            self.storage
                .create_dir(&category_key(&visit_key, category))
                .await?;

            let extra = attachments.dropped(category);
            if extra > 0 {
                tracing::debug!(
                    category = %category,
                    supplied = attachments.get(category).len(),
                    max_count = category.max_count(),
                    dropped = extra,
                    "Photos beyond category limit dropped"
                );
                dropped.insert(category, extra);
            }

            for (i, attachment) in attachments.take_retained(category).into_iter().enumerate() {
                let key = attachment_key(&visit_key, category, i + 1);
                self.storage.write(&key, attachment.data).await?;
                written.push(key);
            }
        }

        let storage_path = self.storage.location(&visit_key)?;
        let ledger_rows = self
            .ledger
            .append(LedgerRow::new(&visit, storage_path.clone()))
            .await?;

        tracing::info!(
            storage_path = %storage_path,
            photographer = %visit.photographer,
            files = written.len(),
            dropped = dropped.values().sum::<usize>(),
            ledger_rows,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Visit recorded"
        );

        Ok(Receipt {
            visit: visit.with_storage_path(storage_path.clone()),
            storage_path,
            visit_dir_name: dir_name,
            written,
            dropped,
            ledger_rows,
        })
    }

    /// Pick the directory for this visit according to the collision policy.
    async fn resolve_visit_dir(&self, visit: &VisitRecord) -> Result<(String, String), AppError> {
        let base_name = visit_dir_name(visit.visit_date, visit.visit_time);
        let base_key = visit_dir_key(&base_name);

        match self.collision_policy {
            CollisionPolicy::Merge => {
                if self.storage.exists(&base_key).await? {
                    tracing::warn!(
                        visit_dir = %base_name,
                        "Visit directory already exists, photos with the same index will be overwritten"
                    );
                }
                Ok((base_name, base_key))
            }
            CollisionPolicy::Suffix => {
                if !self.storage.exists(&base_key).await? {
                    return Ok((base_name, base_key));
                }
                for n in 2..=MAX_DIR_SUFFIX {
                    let name = suffixed_dir_name(&base_name, n);
                    let key = visit_dir_key(&name);
                    if !self.storage.exists(&key).await? {
                        return Ok((name, key));
                    }
                }
                Err(AppError::Storage(format!(
                    "No free directory name left for visit {}",
                    base_name
                )))
            }
        }
    }
}
