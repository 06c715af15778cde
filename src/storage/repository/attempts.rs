// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Provisioning attempt records.
//!
//! Every wallet-provisioning call writes its progress here before and
//! between the external custody calls. A run that dies after vault creation
//! leaves a failed record naming the orphaned vault, which the admin
//! listing exposes for reconciliation. Nothing sweeps these automatically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::db::{AppDatabase, DbError, DbResult, ATTEMPTS};

/// Furthest step a provisioning run has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    Started,
    VaultCreated,
    AssetActivated,
    AddressDerived,
    Persisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Failed,
}

/// Lifecycle record of one provisioning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProvisioningAttempt {
    /// Unique attempt identifier (UUID).
    pub attempt_id: String,
    pub user_id: String,
    /// Asset the run tried to activate.
    pub asset_id: String,
    pub step: ProvisioningStep,
    pub status: AttemptStatus,
    /// Custody vault created by this run, once known. A failed attempt with
    /// a vault id is an orphaned external resource.
    pub vault_id: Option<String>,
    /// Failure context from the step that aborted the run.
    pub failure: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProvisioningAttempt {
    pub fn start(user_id: &str, asset_id: &str) -> Self {
        let now = Utc::now();
        Self {
            attempt_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            asset_id: asset_id.to_string(),
            step: ProvisioningStep::Started,
            status: AttemptStatus::InProgress,
            vault_id: None,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn advance(&mut self, step: ProvisioningStep) {
        self.step = step;
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self) {
        self.status = AttemptStatus::Completed;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, context: impl Into<String>) {
        self.status = AttemptStatus::Failed;
        self.failure = Some(context.into());
        self.updated_at = Utc::now();
    }
}

/// Repository for provisioning attempt records.
pub struct AttemptRepository<'a> {
    db: &'a AppDatabase,
}

impl<'a> AttemptRepository<'a> {
    pub fn new(db: &'a AppDatabase) -> Self {
        Self { db }
    }

    /// Insert or overwrite an attempt record.
    pub fn save(&self, attempt: &ProvisioningAttempt) -> DbResult<()> {
        self.db.write_json(ATTEMPTS, &attempt.attempt_id, attempt)
    }

    pub fn get(&self, attempt_id: &str) -> DbResult<ProvisioningAttempt> {
        self.db
            .read_json(ATTEMPTS, attempt_id)?
            .ok_or_else(|| DbError::NotFound(format!("Attempt {attempt_id}")))
    }

    /// Failed attempts, newest first: the reconciliation surface for
    /// orphaned custody vaults.
    pub fn list_failed(&self) -> DbResult<Vec<ProvisioningAttempt>> {
        let mut failed: Vec<ProvisioningAttempt> = self
            .db
            .list_json(ATTEMPTS)?
            .into_iter()
            .filter(|attempt: &ProvisioningAttempt| attempt.status == AttemptStatus::Failed)
            .collect();
        failed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (tempfile::TempDir, AppDatabase) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = AppDatabase::open(&dir.path().join("test.redb")).expect("open db");
        (dir, db)
    }

    #[test]
    fn lifecycle_advances_and_completes() {
        let (_dir, db) = temp_db();
        let repo = AttemptRepository::new(&db);

        let mut attempt = ProvisioningAttempt::start("user-1", "HBAR_TEST");
        repo.save(&attempt).unwrap();

        attempt.vault_id = Some("42".to_string());
        attempt.advance(ProvisioningStep::VaultCreated);
        attempt.advance(ProvisioningStep::Persisted);
        attempt.complete();
        repo.save(&attempt).unwrap();

        let loaded = repo.get(&attempt.attempt_id).unwrap();
        assert_eq!(loaded.status, AttemptStatus::Completed);
        assert_eq!(loaded.step, ProvisioningStep::Persisted);
        assert!(repo.list_failed().unwrap().is_empty());
    }

    #[test]
    fn failed_attempts_surface_orphaned_vaults() {
        let (_dir, db) = temp_db();
        let repo = AttemptRepository::new(&db);

        let mut ok = ProvisioningAttempt::start("user-1", "HBAR_TEST");
        ok.complete();
        repo.save(&ok).unwrap();

        let mut orphaned = ProvisioningAttempt::start("user-2", "HBAR_TEST");
        orphaned.vault_id = Some("77".to_string());
        orphaned.advance(ProvisioningStep::VaultCreated);
        orphaned.fail("activate_asset: provider returned 500");
        repo.save(&orphaned).unwrap();

        let failed = repo.list_failed().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].vault_id.as_deref(), Some("77"));
        assert!(failed[0].failure.as_deref().unwrap().contains("activate_asset"));
    }
}
