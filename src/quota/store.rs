//! Configuration Store
//!
//! The async load/save boundary around the allocator, and the dashboard's
//! JSON record shape (`feedInteractions` / `keywordTargets`, plus
//! `subredditTargets` from the multi-platform screen). Records are checked
//! when they become a [`Configuration`]. Targets stored without an id get
//! one derived from their list, position and label, so every load of the
//! same record yields the same ids. Saving writes all targets, with ids,
//! under `keywordTargets`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::allocator;
use super::model::{Allocation, Budget, Configuration, ModelError, Target, TargetId, Totals};

/// Maximum revisions kept by the in-memory store
const MAX_REVISIONS: usize = 1000;

/// Budget as stored alongside a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRecord {
    pub max_likes: u32,
    pub max_comments: u32,
}

/// Likes/comments pair as the dashboard stores it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    #[serde(default)]
    pub num_likes: i64,
    #[serde(default)]
    pub num_comments: i64,
}

/// One keyword or community target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordTargetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TargetId>,
    pub keyword: String,
    #[serde(default)]
    pub num_likes: i64,
    #[serde(default)]
    pub num_comments: i64,
}

/// One community target as the multi-platform screen stores it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubredditTargetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TargetId>,
    pub subreddit: String,
    #[serde(default)]
    pub num_likes: i64,
    #[serde(default)]
    pub num_comments: i64,
}

/// Persisted form of a configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetRecord>,
    #[serde(default)]
    pub feed_interactions: InteractionRecord,
    #[serde(default)]
    pub keyword_targets: Vec<KeywordTargetRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subreddit_targets: Vec<SubredditTargetRecord>,
}

impl ConfigurationRecord {
    /// Build a configuration, using `default_budget` when none is stored.
    pub fn into_configuration(self, default_budget: Budget) -> Result<Configuration, ModelError> {
        let budget = self
            .budget
            .map(|b| Budget::new(b.max_likes, b.max_comments))
            .unwrap_or(default_budget);

        let feed = Allocation::new(
            count("feedInteractions.numLikes", self.feed_interactions.num_likes)?,
            count("feedInteractions.numComments", self.feed_interactions.num_comments)?,
        );

        let keywords = self
            .keyword_targets
            .into_iter()
            .map(|r| (r.id, r.keyword, r.num_likes, r.num_comments));
        let subreddits = self
            .subreddit_targets
            .into_iter()
            .map(|r| (r.id, r.subreddit, r.num_likes, r.num_comments));

        let mut targets = stored_targets("keywordTargets", keywords)?;
        targets.extend(stored_targets("subredditTargets", subreddits)?);

        Configuration::new(budget, feed, targets)
    }
}

impl From<&Configuration> for ConfigurationRecord {
    fn from(config: &Configuration) -> Self {
        let budget = config.budget();
        let feed = config.feed();
        Self {
            budget: Some(BudgetRecord {
                max_likes: budget.max_likes,
                max_comments: budget.max_comments,
            }),
            feed_interactions: InteractionRecord {
                num_likes: i64::from(feed.likes),
                num_comments: i64::from(feed.comments),
            },
            keyword_targets: config
                .targets()
                .iter()
                .map(|t| KeywordTargetRecord {
                    id: Some(t.id),
                    keyword: t.label.clone(),
                    num_likes: i64::from(t.allocation.likes),
                    num_comments: i64::from(t.allocation.comments),
                })
                .collect(),
            subreddit_targets: Vec::new(),
        }
    }
}

fn stored_targets(
    list: &str,
    records: impl Iterator<Item = (Option<TargetId>, String, i64, i64)>,
) -> Result<Vec<Target>, ModelError> {
    records
        .enumerate()
        .map(|(i, (id, label, likes, comments))| {
            let allocation = Allocation::new(
                count(&format!("{list}[{i}].numLikes"), likes)?,
                count(&format!("{list}[{i}].numComments"), comments)?,
            );
            let id = id.unwrap_or_else(|| TargetId::derived(&format!("{list}[{i}]:{label}")));
            Ok(Target::new(id, label, allocation))
        })
        .collect()
}

fn count(field: &str, value: i64) -> Result<u32, ModelError> {
    if value < 0 {
        return Err(ModelError::NegativeCount {
            field: field.to_string(),
            value,
        });
    }
    u32::try_from(value).map_err(|_| ModelError::CountOutOfRange {
        field: field.to_string(),
        value,
    })
}

/// Async persistence boundary for configurations.
///
/// Concurrent saves to the same scope are last-write-wins.
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Load the configuration of a scope
    async fn load(&self, scope: &str) -> Result<Configuration>;

    /// Persist a committed configuration
    async fn save(&self, scope: &str, config: &Configuration) -> Result<()>;
}

/// Record of one save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    pub scope: String,
    pub saved_at: chrono::DateTime<chrono::Utc>,
    pub target_count: usize,
    pub totals: Totals,
}

/// In-memory store
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    default_budget: Budget,
    records: Arc<RwLock<HashMap<String, ConfigurationRecord>>>,
    revisions: Arc<RwLock<Vec<Revision>>>,
}

impl InMemoryStore {
    pub fn new(default_budget: Budget) -> Self {
        Self {
            default_budget,
            records: Arc::new(RwLock::new(HashMap::new())),
            revisions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Seed a raw record, bypassing validation (simulates external data)
    pub async fn insert_record(&self, scope: &str, record: ConfigurationRecord) {
        self.records.write().await.insert(scope.to_string(), record);
    }

    /// Save history for a scope, oldest first
    pub async fn revisions(&self, scope: &str) -> Vec<Revision> {
        let revisions = self.revisions.read().await;
        revisions.iter().filter(|r| r.scope == scope).cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Budget::default())
    }
}

#[async_trait]
impl ConfigurationStore for InMemoryStore {
    async fn load(&self, scope: &str) -> Result<Configuration> {
        let record = self
            .records
            .read()
            .await
            .get(scope)
            .cloned()
            .with_context(|| format!("No configuration stored for scope '{}'", scope))?;

        let config = record
            .into_configuration(self.default_budget)
            .with_context(|| format!("Invalid configuration for scope '{}'", scope))?;
        tracing::debug!(scope, targets = config.target_count(), "Loaded configuration");
        Ok(config)
    }

    async fn save(&self, scope: &str, config: &Configuration) -> Result<()> {
        self.records
            .write()
            .await
            .insert(scope.to_string(), ConfigurationRecord::from(config));

        let revision = Revision {
            scope: scope.to_string(),
            saved_at: chrono::Utc::now(),
            target_count: config.target_count(),
            totals: allocator::totals(config),
        };

        let mut revisions = self.revisions.write().await;
        revisions.push(revision);
        if revisions.len() > MAX_REVISIONS {
            let excess = revisions.len() - MAX_REVISIONS;
            revisions.drain(0..excess);
        }

        tracing::debug!(scope, "Saved configuration");
        Ok(())
    }
}

/// One `<scope>.json` file per scope in a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    default_budget: Budget,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P, default_budget: Budget) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            default_budget,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a scope
    ///
    /// # Errors
    ///
    /// Scope names are restricted to ASCII letters, digits, '-' and '_'.
    pub fn scope_path(&self, scope: &str) -> Result<PathBuf> {
        let valid = !scope.is_empty()
            && scope
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            bail!("Invalid scope name: '{}'", scope);
        }
        Ok(self.dir.join(format!("{}.json", scope)))
    }

    pub async fn exists(&self, scope: &str) -> Result<bool> {
        let path = self.scope_path(scope)?;
        tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check for configuration at {:?}", path))
    }
}

#[async_trait]
impl ConfigurationStore for JsonFileStore {
    async fn load(&self, scope: &str) -> Result<Configuration> {
        let path = self.scope_path(scope)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read configuration from {:?}", path))?;

        let record: ConfigurationRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse configuration from {:?}", path))?;

        let config = record
            .into_configuration(self.default_budget)
            .with_context(|| format!("Invalid configuration in {:?}", path))?;
        tracing::debug!(scope, path = ?path, "Loaded configuration");
        Ok(config)
    }

    async fn save(&self, scope: &str, config: &Configuration) -> Result<()> {
        let path = self.scope_path(scope)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create store directory {:?}", self.dir))?;

        let json = serde_json::to_string_pretty(&ConfigurationRecord::from(config))
            .context("Failed to serialize configuration")?;

        // Write-then-rename so readers never see a partial file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write configuration to {:?}", tmp))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to move configuration into {:?}", path))?;

        tracing::info!(scope, path = ?path, "Saved configuration");
        Ok(())
    }
}
