//! Ordered, run-once data migrations.
//!
//! An [`Updater`] is built from the names already applied (read with
//! [`MigrationRecord::read`]) and a registry whose declaration order is the
//! execution order. [`Updater::update`] runs what is pending against a store;
//! the caller writes [`Updater::done_migrations`] back afterwards.

mod record;
mod registry;

use std::fmt;

use crate::store::Store;
use crate::{LinkshelfError, Result};

pub use record::MigrationRecord;
pub use registry::builtin_migrations;

/// Migration body: `Ok(true)` once applied, `Ok(false)` to stay pending.
pub type MigrationFn = fn(&mut Store) -> Result<bool>;

#[derive(Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub run: MigrationFn,
}

impl Migration {
    #[must_use]
    pub const fn new(name: &'static str, run: MigrationFn) -> Self {
        Self { name, run }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration").field("name", &self.name).finish()
    }
}

#[derive(Debug)]
pub struct Updater {
    done: Vec<String>,
    registry: Vec<Migration>,
    authenticated: bool,
}

impl Updater {
    /// Updater over the built-in registry.
    #[must_use]
    pub fn new(done: Vec<String>, authenticated: bool) -> Self {
        Self::with_registry(done, builtin_migrations(), authenticated)
    }

    #[must_use]
    pub fn with_registry(done: Vec<String>, registry: Vec<Migration>, authenticated: bool) -> Self {
        Self {
            done,
            registry,
            authenticated,
        }
    }

    /// Run every pending migration in registry order and return the names
    /// applied by this call.
    ///
    /// Anonymous callers never run migrations. The first error stops the
    /// run; migrations applied before it stay in the done-set and are listed
    /// in the returned [`LinkshelfError::Migration`].
    pub fn update(&mut self, store: &mut Store) -> Result<Vec<String>> {
        if !self.authenticated {
            return Ok(Vec::new());
        }
        let mut ran = Vec::new();
        for migration in &self.registry {
            if self.done.iter().any(|name| name == migration.name) {
                continue;
            }
            tracing::debug!(migration = migration.name, "running migration");
            match (migration.run)(store) {
                Ok(true) => {
                    tracing::info!(migration = migration.name, "migration applied");
                    ran.push(migration.name.to_string());
                    self.done.push(migration.name.to_string());
                }
                Ok(false) => {
                    tracing::debug!(migration = migration.name, "migration left pending");
                }
                Err(err) => {
                    tracing::warn!(migration = migration.name, "migration failed: {err}");
                    return Err(LinkshelfError::Migration {
                        name: migration.name,
                        completed: ran,
                        source: Box::new(err),
                    });
                }
            }
        }
        Ok(ran)
    }

    /// Names applied so far: the initial done-set plus this updater's runs.
    #[must_use]
    pub fn done_migrations(&self) -> &[String] {
        &self.done
    }

    #[must_use]
    pub fn registry(&self) -> &[Migration] {
        &self.registry
    }
}
