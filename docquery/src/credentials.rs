//! Credential loading from local secret files.
//!
//! Each secret lives in its own UTF-8 file holding a single value. Values are
//! trimmed of leading and trailing whitespace.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Read a file and trim leading/trailing whitespace.
pub fn read_trimmed(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::credentials(path, e))?;
    Ok(content.trim().to_owned())
}

/// Locations of the three secret files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialPaths {
    /// File holding the API key.
    pub api_key_path: PathBuf,
    /// File holding the organization id.
    pub organization_id_path: PathBuf,
    /// File holding the project id.
    pub project_id_path: PathBuf,
}

impl Default for CredentialPaths {
    fn default() -> Self {
        Self {
            api_key_path: PathBuf::from("keys/openAi_key.txt"),
            organization_id_path: PathBuf::from("keys/openAi_organization_id.txt"),
            project_id_path: PathBuf::from("keys/openAi_project_id.txt"),
        }
    }
}

/// Credentials for the remote service.
#[derive(Clone)]
pub struct Credentials {
    api_key: SecretString,
    organization_id: String,
    project_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("organization_id", &self.organization_id)
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl Credentials {
    /// Create credentials from values.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        organization_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            organization_id: organization_id.into(),
            project_id: project_id.into(),
        }
    }

    /// Load the api key, organization id and project id, in that order.
    pub fn load(paths: &CredentialPaths) -> Result<Self> {
        let api_key = read_trimmed(&paths.api_key_path)?;
        let organization_id = read_trimmed(&paths.organization_id_path)?;
        let project_id = read_trimmed(&paths.project_id_path)?;
        tracing::debug!(
            organization = %organization_id,
            project = %project_id,
            "loaded credentials"
        );
        Ok(Self::new(api_key, organization_id, project_id))
    }

    /// The API key.
    #[must_use]
    pub const fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// The organization id.
    #[must_use]
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// The project id.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The three values as plain strings, in (api key, organization, project)
    /// order.
    #[must_use]
    pub fn expose(&self) -> (&str, &str, &str) {
        (
            self.api_key.expose_secret(),
            &self.organization_id,
            &self.project_id,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    mod read_trimmed {
        use super::*;

        #[test]
        fn trims_surrounding_whitespace() {
            let dir = tempfile::tempdir().unwrap();
            let path = write(dir.path(), "key.txt", " something \n");
            assert_eq!(read_trimmed(&path).unwrap(), "something");
        }

        #[test]
        fn keeps_internal_whitespace() {
            let dir = tempfile::tempdir().unwrap();
            let path = write(dir.path(), "key.txt", "\t some  thing\nelse \r\n");
            assert_eq!(read_trimmed(&path).unwrap(), "some  thing\nelse");
        }

        #[test]
        fn missing_file_names_path() {
            let err = read_trimmed("no/such/key.txt").unwrap_err();
            assert!(matches!(err, Error::Credentials { .. }));
            assert!(err.to_string().contains("no/such/key.txt"));
        }
    }

    mod load {
        use super::*;

        #[test]
        fn returns_values_in_order() {
            let dir = tempfile::tempdir().unwrap();
            let paths = CredentialPaths {
                api_key_path: write(dir.path(), "key", "sk-test\n"),
                organization_id_path: write(dir.path(), "org", " org-1 "),
                project_id_path: write(dir.path(), "proj", "proj_1"),
            };

            let creds = Credentials::load(&paths).unwrap();
            assert_eq!(creds.expose(), ("sk-test", "org-1", "proj_1"));
        }

        #[test]
        fn identical_files_give_identical_values() {
            let dir = tempfile::tempdir().unwrap();
            let path = write(dir.path(), "same", "test_value\n");
            let paths = CredentialPaths {
                api_key_path: path.clone(),
                organization_id_path: path.clone(),
                project_id_path: path,
            };

            let creds = Credentials::load(&paths).unwrap();
            let (key, org, project) = creds.expose();
            assert_eq!(key, "test_value");
            assert_eq!(org, "test_value");
            assert_eq!(project, "test_value");
        }

        #[test]
        fn fails_on_first_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let paths = CredentialPaths {
                api_key_path: write(dir.path(), "key", "sk"),
                organization_id_path: dir.path().join("missing-org"),
                project_id_path: write(dir.path(), "proj", "p"),
            };
            let err = Credentials::load(&paths).unwrap_err();
            assert!(err.to_string().contains("missing-org"));
        }

        #[test]
        fn debug_redacts_key() {
            let creds = Credentials::new("sk-secret", "org", "proj");
            let s = format!("{creds:?}");
            assert!(!s.contains("sk-secret"));
            assert!(s.contains("REDACTED"));
        }
    }
}
