use super::events::EventSink;
use super::index::FileIndex;
use super::license::LicenseRegistry;
use super::schema::{Context, LicenseChanged, LicenseUpdateOutcome};
use crate::error::{CourseFilesError, Result};
use std::collections::BTreeSet;

/// Upper bound on files relicensed by one request.
pub const MAX_FILES: usize = 500;

/// Validated bulk update of the `license` field.
pub struct LicenseUpdate<'a> {
    index: &'a FileIndex,
    registry: &'a LicenseRegistry,
    sink: &'a dyn EventSink,
}

impl<'a> LicenseUpdate<'a> {
    pub fn new(
        index: &'a FileIndex,
        registry: &'a LicenseRegistry,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            index,
            registry,
            sink,
        }
    }

    /// Relicense the files among `ids` that lie in `scope`.
    ///
    /// Scope membership is read from storage, never taken from the caller;
    /// ids outside the scope are dropped without an error and show up only
    /// as missing from `updated`. Events are emitted after the commit, one
    /// per updated file.
    pub fn apply(
        &self,
        ids: impl IntoIterator<Item = i64>,
        license: &str,
        scope: &Context,
    ) -> Result<LicenseUpdateOutcome> {
        if !self.registry.is_allowed(license) {
            return Err(CourseFilesError::InvalidLicense(license.to_string()));
        }

        let requested: Vec<i64> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        if requested.len() > MAX_FILES {
            return Err(CourseFilesError::TooManyFiles {
                count: requested.len(),
                max: MAX_FILES,
            });
        }
        if requested.is_empty() {
            return Ok(LicenseUpdateOutcome::default());
        }

        let mut updated: Vec<i64> = self
            .index
            .file_scopes(&requested)?
            .into_iter()
            .filter(|file| scope.contains(file.context_id, &file.path))
            .map(|file| file.id)
            .collect();
        updated.sort_unstable();

        if updated.len() < requested.len() {
            tracing::warn!(
                scope = scope.id,
                requested = requested.len(),
                retained = updated.len(),
                "dropping files outside the scope from relicensing"
            );
        }

        self.index.update_license(&updated, license)?;
        tracing::info!(scope = scope.id, license, files = updated.len(), "files relicensed");

        for id in &updated {
            self.sink.trigger(&LicenseChanged::new(scope.id, *id, license));
        }

        Ok(LicenseUpdateOutcome { requested, updated })
    }
}
