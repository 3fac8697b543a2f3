// Process-wide district cache.
//
// Each district table is loaded on first access and then shared read-only
// for the rest of the process. Entries are never invalidated.
use crate::error::EngineError;
use crate::loader::{district_files, load_district};
use crate::types::DistrictTable;
use log::debug;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

static GLOBAL_CACHE: OnceCell<DistrictCache> = OnceCell::new();

#[derive(Debug)]
pub struct DistrictCache {
    dir: PathBuf,
    tables: RwLock<HashMap<String, Arc<DistrictTable>>>,
}

impl DistrictCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        DistrictCache {
            dir: dir.as_ref().to_path_buf(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// District names available in the data directory, sorted.
    pub fn districts(&self) -> Result<Vec<String>, EngineError> {
        Ok(district_files(&self.dir)?.into_keys().collect())
    }

    /// Shared table for `district`, loading it on first access.
    pub fn get(&self, district: &str) -> Result<Arc<DistrictTable>, EngineError> {
        {
            let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
            if let Some(t) = tables.get(district) {
                return Ok(Arc::clone(t));
            }
        }

        let files = district_files(&self.dir)?;
        let path = files
            .get(district)
            .ok_or_else(|| EngineError::DistrictNotFound(district.to_string()))?;
        let (table, _) = load_district(path)?;

        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        // Another caller may have loaded it while we were reading the file.
        let entry = Arc::clone(
            tables
                .entry(district.to_string())
                .or_insert_with(|| Arc::new(table)),
        );
        debug!("cache holds {} district(s)", tables.len());
        Ok(entry)
    }

    pub fn is_cached(&self, district: &str) -> bool {
        self.tables
            .read()
            .map(|t| t.contains_key(district))
            .unwrap_or(false)
    }
}

/// Install the process-wide cache. Returns the existing cache if one was
/// already installed; the directory of the first call wins.
pub fn init_global<P: AsRef<Path>>(dir: P) -> &'static DistrictCache {
    GLOBAL_CACHE.get_or_init(|| DistrictCache::new(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lookup_reuses_loaded_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Golaghat.csv"),
            "year,yield,precip_flux_6\n2018,2.0,100\n2019,2.5,120\n",
        )
        .unwrap();
        let cache = DistrictCache::new(dir.path());

        let first = cache.get("Golaghat").unwrap();
        assert_eq!(first.years(), vec![2018, 2019]);
        let second = cache.get("Golaghat").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_cached("Golaghat"));
        assert!(!cache.is_cached("Jorhat"));
    }
}
