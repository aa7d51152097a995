use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Result;
use log::debug;

use crate::config::DashboardConfig;
use crate::data::compare::month_options;
use crate::data::loader::{load_dataset, DatasetKind};
use crate::data::model::Table;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Load-once dataset cache
// ---------------------------------------------------------------------------

struct CacheEntry {
    modified: Option<SystemTime>,
    table: Arc<Table>,
}

/// Loaded tables keyed by path and kind.  An entry is reused until the file's
/// modification time changes or [`DatasetCache::invalidate`] is called.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<(PathBuf, DatasetKind), CacheEntry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table or load it on first access / after a change.
    pub fn get_or_load(&mut self, path: &Path, kind: DatasetKind) -> Result<Arc<Table>> {
        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        let key = (path.to_path_buf(), kind);

        if let Some(entry) = self.entries.get(&key) {
            if entry.modified == modified {
                debug!("Cache hit for {} ({kind})", path.display());
                return Ok(Arc::clone(&entry.table));
            }
            debug!("{} changed on disk, reloading", path.display());
        } else {
            debug!("Cache miss for {} ({kind})", path.display());
        }

        let table = Arc::new(load_dataset(path, kind)?);
        self.entries.insert(
            key,
            CacheEntry {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Drop every entry; the next access reloads from disk.
    pub fn invalidate(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Both datasets, ready for the pages
// ---------------------------------------------------------------------------

/// The two period tables plus the month selector options, which are taken
/// from the unfiltered prior table once per load.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub current: Arc<Table>,
    pub prior: Arc<Table>,
    pub month_options: Vec<String>,
}

impl Datasets {
    /// Load both configured files.  Every missing path is reported together
    /// before anything is read.
    pub fn load(config: &DashboardConfig, cache: &mut DatasetCache) -> Result<Self> {
        let missing: Vec<PathBuf> = [&config.current_file, &config.prior_file]
            .into_iter()
            .filter(|p| !p.exists())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(DashboardError::MissingFile { paths: missing }.into());
        }

        let current = cache.get_or_load(&config.current_file, DatasetKind::Current)?;
        let prior = cache.get_or_load(&config.prior_file, DatasetKind::Prior)?;
        let month_options = month_options(&prior)?;

        Ok(Datasets {
            current,
            prior,
            month_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, body: &str) {
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn second_access_is_served_from_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("current.csv");
        write(&path, "State Name,Sales Qty\nMH,1\n");

        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(&path, DatasetKind::Current).unwrap();
        let second = cache.get_or_load(&path, DatasetKind::Current).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.entries.len(), 1);
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("current.csv");
        write(&path, "State Name,Sales Qty\nMH,1\n");

        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(&path, DatasetKind::Current).unwrap();
        cache.invalidate();
        assert!(cache.entries.is_empty());

        let second = cache.get_or_load(&path, DatasetKind::Current).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn changed_modification_time_forces_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("current.csv");
        write(&path, "State Name,Sales Qty\nMH,1\n");

        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(&path, DatasetKind::Current).unwrap();

        write(&path, "State Name,Sales Qty\nMH,1\nGA,2\n");
        let later = SystemTime::now() + std::time::Duration::from_secs(60);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let second = cache.get_or_load(&path, DatasetKind::Current).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);

        let third = cache.get_or_load(&path, DatasetKind::Current).unwrap();
        assert!(Arc::ptr_eq(&second, &third));
    }

    #[test]
    fn datasets_report_all_missing_files() {
        let dir = tempdir().unwrap();
        let config = DashboardConfig {
            current_file: dir.path().join("a.xlsx"),
            prior_file: dir.path().join("b.xlsx"),
            ..DashboardConfig::default()
        };

        let err = Datasets::load(&config, &mut DatasetCache::new()).unwrap_err();
        match err.downcast_ref::<DashboardError>() {
            Some(DashboardError::MissingFile { paths }) => assert_eq!(paths.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn datasets_load_month_options() {
        let dir = tempdir().unwrap();
        let current = dir.path().join("current.csv");
        let prior = dir.path().join("prior.csv");
        write(&current, "State Name,Sales Qty,Sales Amt\nMH,1,10\n");
        write(
            &prior,
            "State Name,Month,Sales Qty,Sales Amt\nMH,2024-09-01,1,10\nMH,2024-10-05,2,20\nMH,oops,3,30\n",
        );
        let config = DashboardConfig {
            current_file: current,
            prior_file: prior,
            ..DashboardConfig::default()
        };

        let ds = Datasets::load(&config, &mut DatasetCache::new()).unwrap();
        assert_eq!(ds.prior.len(), 3);
        assert_eq!(ds.month_options, vec!["October-2024", "September-2024"]);
    }
}
