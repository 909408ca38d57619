//! Directory-backed catalog persistence.
//!
//! One JSON file per entity plus a small manifest, all written into a
//! staging directory and swapped into place by rename as the final step.
//! An interrupted save leaves either the prior records directory or the
//! backup created right before the swap, and load recovers from either.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{
    core::store::{CatalogSnapshot, CatalogStore},
    movie::MovieRecord,
    performer::PerformerRecord,
    types::{MovieId, PerformerId},
};

use super::{CatalogSink, LoadReport, PersistError, PersistResult};

const CATALOG_FORMAT_VERSION: u16 = 1;

const RECORDS_DIR: &str = "records";
const STAGING_DIR: &str = "records.new";
const BACKUP_DIR: &str = "records.old";
const IMAGES_DIR: &str = "images";
const MANIFEST_FILE: &str = "catalog.json";
const MOVIE_PREFIX: &str = "movie-";
const PERFORMER_PREFIX: &str = "performer-";
const RECORD_EXT: &str = ".json";

/// Display orders and id counters stored alongside the entity files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestV1 {
    format_version: u16,
    next_movie_id: MovieId,
    next_performer_id: PerformerId,
    movie_order: Vec<MovieId>,
    performer_order: Vec<PerformerId>,
}

/// Directory-backed implementation of [`CatalogSink`].
#[derive(Debug, Clone)]
pub struct CatalogDir {
    root: PathBuf,
}

impl CatalogDir {
    /// Points at a catalog root directory. Nothing is touched on disk until
    /// the first save; a missing directory loads as an empty catalog.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The catalog root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a movie's image file, named by the movie id.
    ///
    /// Image bytes are a GUI concern; the engine only hands out the
    /// location derived from the identifier.
    pub fn movie_image_path(&self, id: MovieId) -> PathBuf {
        self.root.join(IMAGES_DIR).join(format!("{MOVIE_PREFIX}{id}"))
    }

    /// Path for a performer's image file, named by the performer id.
    pub fn performer_image_path(&self, id: PerformerId) -> PathBuf {
        self.root
            .join(IMAGES_DIR)
            .join(format!("{PERFORMER_PREFIX}{id}"))
    }

    /// Writes the full graph atomically.
    ///
    /// Everything lands in a staging directory first; the live directory is
    /// renamed aside, the staging directory renamed live, and only then is
    /// the backup discarded. A failure at any earlier point leaves the
    /// prior state loadable.
    pub fn save(&self, snapshot: &CatalogSnapshot) -> PersistResult<()> {
        fs::create_dir_all(&self.root)?;

        let staging = self.root.join(STAGING_DIR);
        if staging.exists() {
            // Leftover from a save that never reached the swap.
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir(&staging)?;

        let manifest = ManifestV1 {
            format_version: CATALOG_FORMAT_VERSION,
            next_movie_id: snapshot.next_movie_id,
            next_performer_id: snapshot.next_performer_id,
            movie_order: snapshot.movie_order.clone(),
            performer_order: snapshot.performer_order.clone(),
        };
        fs::write(
            staging.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest)?,
        )?;

        for rec in &snapshot.movies {
            fs::write(
                staging.join(format!("{MOVIE_PREFIX}{}{RECORD_EXT}", rec.id)),
                serde_json::to_vec_pretty(rec)?,
            )?;
        }
        for rec in &snapshot.performers {
            fs::write(
                staging.join(format!("{PERFORMER_PREFIX}{}{RECORD_EXT}", rec.id)),
                serde_json::to_vec_pretty(rec)?,
            )?;
        }

        let live = self.root.join(RECORDS_DIR);
        let backup = self.root.join(BACKUP_DIR);
        if backup.exists() {
            fs::remove_dir_all(&backup)?;
        }
        if live.exists() {
            fs::rename(&live, &backup)?;
        }
        fs::rename(&staging, &live)?;
        if backup.exists() {
            // Best effort; a stale backup is harmless and replaced next save.
            let _ = fs::remove_dir_all(&backup);
        }

        Ok(())
    }

    /// Reads the full graph back.
    ///
    /// Movie records carry their performer id lists; the performer side is
    /// rebuilt here. Unresolvable references and unreadable files are
    /// skipped, logged, and counted in the [`LoadReport`].
    pub fn load(&self) -> PersistResult<(CatalogSnapshot, LoadReport)> {
        let mut report = LoadReport::default();

        let live = self.root.join(RECORDS_DIR);
        let backup = self.root.join(BACKUP_DIR);
        let dir = if live.is_dir() {
            live
        } else if backup.is_dir() {
            // A crash between the two final renames of a save leaves only
            // the backup behind.
            tracing::warn!(root = %self.root.display(), "live records missing, loading backup");
            report.recovered_from_backup = true;
            backup
        } else {
            return Ok((CatalogSnapshot::empty(), report));
        };

        let mut manifest: Option<ManifestV1> = None;
        let mut movies: HashMap<MovieId, MovieRecord> = HashMap::new();
        let mut performers: HashMap<PerformerId, PerformerRecord> = HashMap::new();

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            if name == MANIFEST_FILE {
                let parsed: ManifestV1 = serde_json::from_slice(&fs::read(&path)?)?;
                if parsed.format_version != CATALOG_FORMAT_VERSION {
                    return Err(PersistError::Message(format!(
                        "unsupported catalog format version {}",
                        parsed.format_version
                    )));
                }
                manifest = Some(parsed);
            } else if record_id(name, MOVIE_PREFIX).is_some() {
                match read_record::<MovieRecord>(&path) {
                    Ok(rec) => {
                        movies.insert(rec.id, rec);
                    }
                    Err(err) => {
                        tracing::warn!(file = %path.display(), %err, "skipping unreadable movie record");
                        report.skipped_files += 1;
                    }
                }
            } else if record_id(name, PERFORMER_PREFIX).is_some() {
                match read_record::<PerformerRecord>(&path) {
                    Ok(rec) => {
                        performers.insert(rec.id, rec);
                    }
                    Err(err) => {
                        tracing::warn!(file = %path.display(), %err, "skipping unreadable performer record");
                        report.skipped_files += 1;
                    }
                }
            }
        }

        let (next_movie_id, next_performer_id, mut movie_order, mut performer_order) =
            match manifest {
                Some(m) => (m.next_movie_id, m.next_performer_id, m.movie_order, m.performer_order),
                None => (
                    movies.keys().max().map_or(1, |id| id + 1),
                    performers.keys().max().map_or(1, |id| id + 1),
                    sorted_ids(&movies),
                    sorted_ids(&performers),
                ),
            };
        movie_order.retain(|id| movies.contains_key(id));
        performer_order.retain(|id| performers.contains_key(id));
        append_unlisted(&mut movie_order, &movies);
        append_unlisted(&mut performer_order, &performers);

        // Relink: the movie side is authoritative, the performer side derived.
        for mid in &movie_order {
            let Some(movie) = movies.get_mut(mid) else {
                continue;
            };
            let mut kept = Vec::with_capacity(movie.performers.len());
            for pid in &movie.performers {
                if let Some(p) = performers.get_mut(pid) {
                    p.movies.push(*mid);
                    kept.push(*pid);
                } else {
                    tracing::warn!(movie = mid, performer = pid, "skipping dangling performer link");
                    report.dangling_links += 1;
                }
            }
            movie.performers = kept;
        }

        let snapshot = CatalogSnapshot {
            next_movie_id,
            next_performer_id,
            movies: movie_order
                .iter()
                .filter_map(|id| movies.remove(id))
                .collect(),
            performers: performer_order
                .iter()
                .filter_map(|id| performers.remove(id))
                .collect(),
            movie_order,
            performer_order,
        };

        Ok((snapshot, report))
    }

    /// Loads a ready-to-use store, convenience over [`CatalogDir::load`].
    pub fn load_store(&self) -> PersistResult<(CatalogStore, LoadReport)> {
        let (snapshot, report) = self.load()?;
        Ok((CatalogStore::from_snapshot(snapshot), report))
    }
}

impl CatalogSink for CatalogDir {
    fn save(&mut self, snapshot: &CatalogSnapshot) -> PersistResult<()> {
        CatalogDir::save(self, snapshot)
    }

    fn load(&mut self) -> PersistResult<(CatalogSnapshot, LoadReport)> {
        CatalogDir::load(self)
    }
}

fn record_id(name: &str, prefix: &str) -> Option<u64> {
    name.strip_prefix(prefix)?
        .strip_suffix(RECORD_EXT)?
        .parse()
        .ok()
}

fn read_record<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}

fn sorted_ids<V>(map: &HashMap<u64, V>) -> Vec<u64> {
    let mut ids: Vec<u64> = map.keys().copied().collect();
    ids.sort_unstable();
    ids
}

fn append_unlisted<V>(order: &mut Vec<u64>, map: &HashMap<u64, V>) {
    let mut extra: Vec<u64> = map.keys().copied().filter(|id| !order.contains(id)).collect();
    extra.sort_unstable();
    order.append(&mut extra);
}
