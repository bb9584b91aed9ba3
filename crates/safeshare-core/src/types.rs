use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SafeshareError, SafeshareResult};

/// Visibility of a stored file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    #[default]
    Private,
    Public,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Private => "private",
            FileStatus::Public => "public",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of days a shared file stays downloadable (1..=30)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExpiryDays(u32);

impl ExpiryDays {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 30;

    pub fn new(days: u32) -> SafeshareResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&days) {
            return Err(SafeshareError::InvalidInput(format!(
                "expiry must be between {} and {} days, got {days}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(days))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for ExpiryDays {
    type Error = SafeshareError;

    fn try_from(days: u32) -> SafeshareResult<Self> {
        Self::new(days)
    }
}

/// A persisted file record as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub id: u64,
    pub name: String,
    /// Stored (encrypted) size in bytes
    pub size: u64,
    pub extension: String,
    pub status: FileStatus,
    pub expiry_date: Option<DateTime<Utc>>,
    pub uploaded_date: DateTime<Utc>,
    /// Opaque download handle
    pub download_link: Option<String>,
}

impl FileDescriptor {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Regular,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Guest => "guest",
            Role::Regular => "regular",
            Role::Admin => "admin",
        })
    }
}

/// Storage summary for the authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub name: String,
    pub total_files_shared: u64,
    pub used_storage: u64,
    #[serde(default)]
    pub allocated_storage: Option<u64>,
    pub current_role: Role,
}

/// Body of a share request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    pub emails: Vec<String>,
}
