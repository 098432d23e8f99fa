use std::path::{Path, PathBuf};

pub const SCENE_EXTENSION: &str = "scene";

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read asset directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no .scene files found in {}", .0.display())]
    Empty(PathBuf),
}

/// Selectable scene files found in the asset directory, sorted by path.
#[derive(Debug, Clone, Default)]
pub struct SceneCatalog {
    entries: Vec<PathBuf>,
}

impl SceneCatalog {
    /// Scans `dir` once (non-recursive) for files with the scene extension.
    pub fn discover(dir: &Path) -> Result<Self, CatalogError> {
        let read_dir = std::fs::read_dir(dir).map_err(|source| CatalogError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut entries: Vec<PathBuf> = read_dir
            .filter_map(|entry| {
                entry
                    .map_err(|err| log::warn!("Skipping unreadable entry in {}: {}", dir.display(), err))
                    .ok()
            })
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_scene_extension(path))
            .collect();
        entries.sort();

        log::info!(
            "Scene catalog: {} file(s) in {}",
            entries.len(),
            dir.display()
        );
        Ok(Self { entries })
    }

    /// Like [`SceneCatalog::discover`] but an empty result is an error.
    pub fn discover_non_empty(dir: &Path) -> Result<Self, CatalogError> {
        let catalog = Self::discover(dir)?;
        if catalog.is_empty() {
            return Err(CatalogError::Empty(dir.to_path_buf()));
        }
        Ok(catalog)
    }

    /// Picks the startup scene: an explicit path bypasses discovery and
    /// leaves the catalog empty, otherwise the first discovered file is used.
    pub fn startup(
        explicit: Option<PathBuf>,
        assets: &Path,
    ) -> Result<(Self, PathBuf), CatalogError> {
        if let Some(path) = explicit {
            return Ok((Self::default(), path));
        }
        let catalog = Self::discover_non_empty(assets)?;
        let first = catalog
            .first()
            .map(Path::to_path_buf)
            .ok_or_else(|| CatalogError::Empty(assets.to_path_buf()))?;
        Ok((catalog, first))
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.entries.get(index).map(PathBuf::as_path)
    }

    pub fn first(&self) -> Option<&Path> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|entry| entry == path)
    }

    pub fn display_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("scene")
                    .to_string()
            })
            .collect()
    }
}

fn has_scene_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == SCENE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_scene_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.scene", "a.scene", "notes.txt", "b.scene", "scene"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.scene")).unwrap();

        let catalog = SceneCatalog::discover(dir.path()).unwrap();
        assert_eq!(catalog.display_names(), vec!["a.scene", "b.scene", "c.scene"]);
        assert_eq!(catalog.first(), Some(dir.path().join("a.scene").as_path()));
        assert_eq!(catalog.position(&dir.path().join("c.scene")), Some(2));
    }

    #[test]
    fn empty_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SceneCatalog::discover(dir.path()).unwrap().is_empty());
        assert!(matches!(
            SceneCatalog::discover_non_empty(dir.path()),
            Err(CatalogError::Empty(_))
        ));
    }

    #[test]
    fn startup_picks_first_sorted_scene_or_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.scene", "b.scene", "a.scene"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }

        let (catalog, path) = SceneCatalog::startup(None, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("a.scene"));
        assert_eq!(catalog.len(), 3);

        let explicit = dir.path().join("elsewhere.scene");
        let (catalog, path) = SceneCatalog::startup(Some(explicit.clone()), dir.path()).unwrap();
        assert_eq!(path, explicit);
        assert!(catalog.is_empty());

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            SceneCatalog::startup(None, empty.path()),
            Err(CatalogError::Empty(_))
        ));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("assets");
        assert!(matches!(
            SceneCatalog::discover(&missing),
            Err(CatalogError::ReadDir { .. })
        ));
    }
}
