use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, YabuError};

/// One named backup's persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupDefinition {
    /// Absolute paths copied recursively into the scratch directory, in order.
    pub files: Vec<String>,
    /// Retention ceiling. The wire format is a one-element list (legacy
    /// format, preserved as-is); use [`BackupDefinition::max_backups`].
    pub maxbackups: Vec<u32>,
    /// Shell command run before staging begins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight: Option<String>,
    /// Shell command run after the archive has been created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postflight: Option<String>,
    /// Keys this version doesn't know about ride along untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl BackupDefinition {
    pub fn new(files: Vec<String>, max_backups: u32) -> Self {
        Self {
            files,
            maxbackups: vec![max_backups],
            preflight: None,
            postflight: None,
            extra: BTreeMap::new(),
        }
    }

    /// The number of remote archives to retain. Zero if the legacy list is
    /// empty, which no valid configurator output produces.
    pub fn max_backups(&self) -> u32 {
        self.maxbackups.first().copied().unwrap_or(0)
    }
}

/// The whole control file: backup name → definition. Writing is whole-file
/// replace semantics — load, mutate one key, save everything back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlFile {
    entries: BTreeMap<String, BackupDefinition>,
}

impl ControlFile {
    /// Load the control file. Fails if it is absent, unreadable, or does not
    /// deserialize to a mapping of backup definitions.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            YabuError::Config(format!("cannot read '{}': {e}", path.display()))
        })?;
        let entries: BTreeMap<String, BackupDefinition> = serde_yaml::from_str(&contents)
            .map_err(|e| {
                YabuError::Config(format!(
                    "'{}' is not a valid backup mapping: {e}",
                    path.display()
                ))
            })?;
        Ok(Self { entries })
    }

    pub fn lookup(&self, name: &str) -> Result<&BackupDefinition> {
        self.entries.get(name).ok_or_else(|| {
            YabuError::Config(format!("no backup named '{name}' in control file"))
        })
    }

    /// Insert or fully overwrite the definition for `name`.
    pub fn upsert(&mut self, name: &str, def: BackupDefinition) {
        self.entries.insert(name.to_string(), def);
    }

    pub fn entries(&self) -> &BTreeMap<String, BackupDefinition> {
        &self.entries
    }

    /// Serialize the whole mapping and write it with owner-only permissions.
    /// The write goes through a temp file in the target directory followed by
    /// a rename, so readers never observe a torn file. Lost updates between
    /// concurrent writers are still possible (single-writer assumption).
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.entries).map_err(|e| {
            YabuError::Config(format!("cannot serialize control file: {e}"))
        })?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        tmp.persist(path).map_err(|e| YabuError::Io(e.error))?;
        Ok(())
    }
}
