// quill-service/src/store/mod.rs
//
// Persistence collaborator: one JSON file per record, one directory per
// entity. The handle is created once at process start and shared through
// web::Data; no component reaches for a process-wide connection.
//
// Each single-record save is atomic at the filesystem level (one write);
// multi-entity protocols in the sharing coordinator are sequences of such
// saves, not transactions.
use crate::models::{Document, ServiceError, Team, User};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const USERS_DIR: &str = "users";
const TEAMS_DIR: &str = "teams";
const FILES_DIR: &str = "files";

#[derive(Clone, Debug)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open (and lay out) a storage root. Called once in main and once per
    /// test with a scratch directory.
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Store> {
        let root = root.into();
        for dir in [USERS_DIR, TEAMS_DIR, FILES_DIR] {
            fs::create_dir_all(root.join(dir))?;
        }
        Ok(Store { root })
    }

    fn record_path(&self, dir: &str, id: &str) -> PathBuf {
        self.root.join(dir).join(format!("{}.json", id))
    }

    fn write_record<T: Serialize>(&self, dir: &str, id: &str, record: &T) -> Result<(), ServiceError> {
        let json = serde_json::to_string_pretty(record).map_err(|e| {
            error!("Failed to serialize record {}/{}: {:?}", dir, id, e);
            ServiceError::Internal
        })?;
        fs::write(self.record_path(dir, id), json).map_err(|e| {
            error!("Failed to write record {}/{}: {:?}", dir, id, e);
            ServiceError::Internal
        })
    }

    fn read_record<T: DeserializeOwned>(&self, dir: &str, id: &str) -> Result<Option<T>, ServiceError> {
        let path = self.record_path(dir, id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read record {}/{}: {:?}", dir, id, e);
            ServiceError::Internal
        })?;
        let record = serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse record {}/{}: {:?}", dir, id, e);
            ServiceError::Internal
        })?;
        Ok(Some(record))
    }

    fn delete_record(&self, dir: &str, id: &str) -> Result<bool, ServiceError> {
        let path = self.record_path(dir, id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| {
            error!("Failed to delete record {}/{}: {:?}", dir, id, e);
            ServiceError::Internal
        })?;
        Ok(true)
    }

    /// Scan every record in a directory. Unparseable files are skipped with
    /// a warning rather than failing the whole listing.
    fn scan_dir<T: DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>, ServiceError> {
        let dir_path = self.root.join(dir);
        let mut records = Vec::new();

        for entry in fs::read_dir(&dir_path).map_err(|e| {
            error!("Failed to read directory {:?}: {:?}", dir_path, e);
            ServiceError::Internal
        })? {
            let entry = entry.map_err(|e| {
                error!("Failed to read directory entry: {:?}", e);
                ServiceError::Internal
            })?;
            let path = entry.path();
            if !is_json_file(&path) {
                continue;
            }
            let content = fs::read_to_string(&path).map_err(|e| {
                error!("Failed to read {:?}: {:?}", path, e);
                ServiceError::Internal
            })?;
            match serde_json::from_str(&content) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unparseable record {:?}: {:?}", path, e),
            }
        }

        Ok(records)
    }

    // Users

    pub fn save_user(&self, user: &User) -> Result<(), ServiceError> {
        self.write_record(USERS_DIR, &user.id, user)
    }

    pub fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        self.read_record(USERS_DIR, id)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .list_users()?
            .into_iter()
            .find(|u| u.username == username))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.list_users()?.into_iter().find(|u| u.email == email))
    }

    pub fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        self.scan_dir(USERS_DIR)
    }

    pub fn delete_user(&self, id: &str) -> Result<bool, ServiceError> {
        self.delete_record(USERS_DIR, id)
    }

    // Teams

    pub fn save_team(&self, team: &Team) -> Result<(), ServiceError> {
        self.write_record(TEAMS_DIR, &team.id, team)
    }

    pub fn find_team_by_id(&self, id: &str) -> Result<Option<Team>, ServiceError> {
        self.read_record(TEAMS_DIR, id)
    }

    pub fn list_teams(&self) -> Result<Vec<Team>, ServiceError> {
        self.scan_dir(TEAMS_DIR)
    }

    pub fn teams_for_user(&self, user_id: &str) -> Result<Vec<Team>, ServiceError> {
        Ok(self
            .list_teams()?
            .into_iter()
            .filter(|t| t.is_member(user_id))
            .collect())
    }

    pub fn delete_team(&self, id: &str) -> Result<bool, ServiceError> {
        self.delete_record(TEAMS_DIR, id)
    }

    // Documents

    pub fn save_document(&self, document: &Document) -> Result<(), ServiceError> {
        self.write_record(FILES_DIR, &document.id, document)
    }

    pub fn find_document_by_id(&self, id: &str) -> Result<Option<Document>, ServiceError> {
        self.read_record(FILES_DIR, id)
    }

    pub fn list_documents(&self) -> Result<Vec<Document>, ServiceError> {
        self.scan_dir(FILES_DIR)
    }

    pub fn delete_document(&self, id: &str) -> Result<bool, ServiceError> {
        self.delete_record(FILES_DIR, id)
    }
}

fn is_json_file(path: &Path) -> bool {
    path.is_file() && path.extension().map_or(false, |ext| ext == "json")
}
