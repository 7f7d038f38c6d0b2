//! Local persistence with file locking.
//!
//! The store keeps four independent JSON slots in the data directory:
//! actions, plans, records and the profile. Each slot is read and written
//! whole; there is no transaction across slots.

use crate::catalog::{seed_actions, seed_plans};
use crate::session::RecordSink;
use crate::{Action, Error, Result, UserProfile, WorkoutPlan, WorkoutRecord};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const ACTIONS_FILE: &str = "actions.json";
const PLANS_FILE: &str = "plans.json";
const RECORDS_FILE: &str = "records.json";
const PROFILE_FILE: &str = "profile.json";

/// Handle on the data directory
#[derive(Clone, Debug)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn actions_path(&self) -> PathBuf {
        self.dir.join(ACTIONS_FILE)
    }

    pub fn plans_path(&self) -> PathBuf {
        self.dir.join(PLANS_FILE)
    }

    pub fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    pub fn profile_path(&self) -> PathBuf {
        self.dir.join(PROFILE_FILE)
    }

    pub fn load_actions(&self) -> Result<Vec<Action>> {
        load_slot(&self.actions_path())
    }

    pub fn save_actions(&self, actions: &[Action]) -> Result<()> {
        save_slot(&self.actions_path(), actions)
    }

    pub fn load_plans(&self) -> Result<Vec<WorkoutPlan>> {
        load_slot(&self.plans_path())
    }

    pub fn save_plans(&self, plans: &[WorkoutPlan]) -> Result<()> {
        save_slot(&self.plans_path(), plans)
    }

    pub fn load_records(&self) -> Result<Vec<WorkoutRecord>> {
        load_slot(&self.records_path())
    }

    pub fn save_records(&self, records: &[WorkoutRecord]) -> Result<()> {
        save_slot(&self.records_path(), records)
    }

    /// Profile, all-null with the default theme when nothing is stored
    pub fn load_profile(&self) -> Result<UserProfile> {
        load_slot(&self.profile_path())
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        save_slot(&self.profile_path(), profile)
    }

    /// Actions, writing the built-in library first if the slot is empty
    pub fn load_actions_or_seed(&self) -> Result<Vec<Action>> {
        let actions = self.load_actions()?;
        if !actions.is_empty() {
            return Ok(actions);
        }
        let seeded = seed_actions().to_vec();
        self.save_actions(&seeded)?;
        tracing::info!("Seeded {} built-in actions", seeded.len());
        Ok(seeded)
    }

    /// Plans, writing the starter plans first if the slot is empty
    pub fn load_plans_or_seed(&self) -> Result<Vec<WorkoutPlan>> {
        let plans = self.load_plans()?;
        if !plans.is_empty() {
            return Ok(plans);
        }
        let seeded = seed_plans().to_vec();
        self.save_plans(&seeded)?;
        tracing::info!("Seeded {} starter plans", seeded.len());
        Ok(seeded)
    }

    /// Load records, modify them, and save them back
    pub fn update_records<F>(&self, f: F) -> Result<Vec<WorkoutRecord>>
    where
        F: FnOnce(&mut Vec<WorkoutRecord>),
    {
        let mut records = self.load_records()?;
        f(&mut records);
        self.save_records(&records)?;
        Ok(records)
    }
}

impl RecordSink for Store {
    /// Newest records go first
    fn append(&mut self, record: &WorkoutRecord) -> Result<()> {
        self.update_records(|records| records.insert(0, record.clone()))?;
        tracing::debug!("Appended record {} to {:?}", record.id, self.records_path());
        Ok(())
    }
}

/// Read a slot with a shared lock.
///
/// A missing slot is the default value. A slot that cannot be opened, locked,
/// read or parsed logs a warning and is also treated as the default value.
fn load_slot<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::debug!("No slot at {:?}, using empty value", path);
        return Ok(T::default());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {:?}: {}. Using empty value.", path, e);
            return Ok(T::default());
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {:?}: {}. Using empty value.", path, e);
        return Ok(T::default());
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {:?}: {}. Using empty value.", path, e);
        return Ok(T::default());
    }

    file.unlock()?;

    if contents.trim().is_empty() {
        return Ok(T::default());
    }

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded {:?}", path);
            Ok(value)
        }
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Using empty value.", path, e);
            Ok(T::default())
        }
    }
}

/// Replace a slot atomically: temp file, fsync, rename.
fn save_slot<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let parent = path.parent().ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "slot path missing parent",
        ))
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved {:?}", path);
    Ok(())
}
