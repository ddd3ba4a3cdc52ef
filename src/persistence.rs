use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::model::Wishlist;

pub const WISHLISTS_FILE_NAME: &str = "wishlists.json";

/// Durable storage for the whole wishlist collection.
pub trait Persistence: Send {
    /// Reads the stored collection. Absence and corruption both read as empty.
    fn load(&self) -> Vec<Wishlist>;

    /// Replaces the stored collection with `wishlists`.
    fn save(&self, wishlists: &[Wishlist]) -> Result<()>;
}

/// Keeps the collection in a single JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<documents>/wishlists.json`, or the home directory when there is no
    /// documents folder.
    pub fn default_path() -> Option<PathBuf> {
        let dir = dirs::document_dir().or_else(dirs::home_dir)?;
        Some(dir.join(WISHLISTS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|value| value.to_os_string())
            .unwrap_or_else(|| WISHLISTS_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn atomic_write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("create data dir failed: {}", dir.display()))?;
        }

        let tmp_path = self.temp_path();
        let written = File::create(&tmp_path).and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        });
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(err)
                .with_context(|| format!("write temp file failed: {}", tmp_path.display()));
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "rename temp file to target failed: {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;
        sync_parent_dir(&self.path)
    }
}

/// Flushes the directory entry so the rename itself survives a power loss.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    File::open(dir)
        .and_then(|handle| handle.sync_all())
        .with_context(|| format!("sync data dir failed: {}", dir.display()))
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

impl Persistence for JsonFileStorage {
    fn load(&self) -> Vec<Wishlist> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(
                    "[wishcraft:persistence] No wishlists file at {}, starting empty",
                    self.path.display()
                );
                return Vec::new();
            }
            Err(err) => {
                warn!(
                    "[wishcraft:persistence] Failed to read {}: {err}. Starting fresh.",
                    self.path.display()
                );
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<Wishlist>>(&bytes) {
            Ok(wishlists) => wishlists,
            Err(err) => {
                warn!(
                    "[wishcraft:persistence] Discarding unreadable wishlists file {} ({} bytes): {err}. Starting fresh.",
                    self.path.display(),
                    bytes.len()
                );
                Vec::new()
            }
        }
    }

    fn save(&self, wishlists: &[Wishlist]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(wishlists).context("serialize wishlists failed")?;
        self.atomic_write(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WishlistItem;
    use tempfile::TempDir;

    fn sample_collection() -> Vec<Wishlist> {
        let mut books = Wishlist::new("Books");
        books
            .items
            .push(WishlistItem::new("Dune", "https://example.com/dune", "").unwrap());
        books
            .items
            .push(WishlistItem::new("Hyperion", "", "paperback is fine").unwrap());

        let mut travel = Wishlist::new("Travel");
        travel.set_cover_image(Some(b"not really a png".to_vec()));
        travel.set_cover_offset(-20.0, 35.5);

        vec![books, travel]
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join(WISHLISTS_FILE_NAME));

        assert!(storage.load().is_empty());
    }

    #[test]
    fn non_json_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(WISHLISTS_FILE_NAME);
        fs::write(&path, "definitely not json").unwrap();

        assert!(JsonFileStorage::new(&path).load().is_empty());
    }

    #[test]
    fn truncated_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(WISHLISTS_FILE_NAME);
        let storage = JsonFileStorage::new(&path);
        storage.save(&sample_collection()).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(storage.load().is_empty());
    }

    #[test]
    fn save_load_save_is_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(WISHLISTS_FILE_NAME);
        let storage = JsonFileStorage::new(&path);
        let collection = sample_collection();

        storage.save(&collection).unwrap();
        let first = fs::read(&path).unwrap();

        let loaded = storage.load();
        assert_eq!(loaded, collection);

        storage.save(&loaded).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn save_creates_parent_dir_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data").join(WISHLISTS_FILE_NAME);
        let storage = JsonFileStorage::new(&path);

        storage.save(&sample_collection()).unwrap();

        assert!(path.exists());
        assert!(!storage.temp_path().exists());
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(WISHLISTS_FILE_NAME)]);
    }

    #[test]
    fn parent_dir_sync_accepts_bare_file_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(WISHLISTS_FILE_NAME);

        sync_parent_dir(&path).unwrap();
        sync_parent_dir(Path::new(WISHLISTS_FILE_NAME)).unwrap();
    }

    #[test]
    fn non_finite_cover_offset_survives_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(WISHLISTS_FILE_NAME);
        let storage = JsonFileStorage::new(&path);
        let mut collection = sample_collection();
        collection[0].set_cover_offset(f64::NAN, f64::INFINITY);

        storage.save(&collection).unwrap();
        assert!(!fs::read_to_string(&path).unwrap().contains("null"));

        let loaded = storage.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].items.len(), 2);
        assert_eq!(loaded[0].cover_offset(), (0.0, 0.0));
    }

    #[test]
    fn null_offset_in_file_keeps_the_rest_of_the_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(WISHLISTS_FILE_NAME);
        let storage = JsonFileStorage::new(&path);
        storage.save(&sample_collection()).unwrap();

        let edited = fs::read_to_string(&path)
            .unwrap()
            .replacen("\"coverImageOffsetX\": 0.0", "\"coverImageOffsetX\": null", 1);
        assert!(edited.contains("null"));
        fs::write(&path, edited).unwrap();

        let loaded = storage.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "Books");
        assert_eq!(loaded[0].cover_offset(), (0.0, 0.0));
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join(WISHLISTS_FILE_NAME));

        storage.save(&sample_collection()).unwrap();
        let only = vec![Wishlist::new("Only")];
        storage.save(&only).unwrap();

        assert_eq!(storage.load(), only);
    }

    #[test]
    fn save_reports_failure_without_touching_existing_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a file where a directory should be").unwrap();
        let storage = JsonFileStorage::new(blocker.join(WISHLISTS_FILE_NAME));

        let result = storage.save(&sample_collection());

        assert!(result.is_err());
        assert_eq!(
            fs::read_to_string(&blocker).unwrap(),
            "a file where a directory should be"
        );
    }

    #[test]
    fn empty_collection_round_trips_as_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(WISHLISTS_FILE_NAME);
        let storage = JsonFileStorage::new(&path);

        storage.save(&[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");
        assert!(storage.load().is_empty());
    }
}
