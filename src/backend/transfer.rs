use std::path::Path;

use crate::backend::atomic;
use crate::backend::profile_store::read_collection;
use crate::error::{Error, Result};
use crate::model::ProfileCollection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep existing profiles; add only names not present yet.
    Merge,
    /// Discard existing profiles.
    Replace,
}

/// Write profiles to an arbitrary JSON file in the `launches.json` format.
pub fn export(collection: &ProfileCollection, path: &Path) -> Result<()> {
    atomic::write_json(path, collection)?;
    log::info!("Exported {} profile(s) to {}", collection.len(), path.display());
    Ok(())
}

/// Read profiles from a JSON file. Unlike the store, a missing file is an error.
pub fn import(path: &Path) -> Result<ProfileCollection> {
    if !path.exists() {
        return Err(Error::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "import file not found"),
        ));
    }
    read_collection(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, Profile};

    #[test]
    fn export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launches_export.json");
        let collection =
            ProfileCollection::from(vec![Profile::new("Dev", vec![Entry::new("code")])]);

        export(&collection, &path).unwrap();
        assert_eq!(import(&path).unwrap(), collection);
    }

    #[test]
    fn import_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = import(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn import_non_array_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"launches": []}"#).unwrap();
        assert!(import(&path).unwrap_err().is_corrupt());
    }
}
