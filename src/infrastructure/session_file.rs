use crate::domain::chat::SessionId;
use crate::domain::ports::SessionVault;
use crate::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// File-backed slot for the chat session identifier, the one piece of
/// browser-local state this system keeps. Unreadable or corrupt content is
/// treated as absent, so a fresh id gets generated and written over it.
pub struct FileSessionVault {
    path: PathBuf,
}

impl FileSessionVault {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionVault for FileSessionVault {
    fn load(&self) -> Result<Option<SessionId>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(SessionId::parse(&content)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn store(&self, session_id: &SessionId) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, session_id.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let vault = FileSessionVault::new(dir.path().join("state/chat-session"));

        assert!(vault.load().unwrap().is_none());

        let id = SessionId::generate();
        vault.store(&id).unwrap();
        assert_eq!(vault.load().unwrap(), Some(id));
    }

    #[test]
    fn test_corrupt_content_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat-session");
        fs::write(&path, "not a uuid").unwrap();

        let vault = FileSessionVault::new(path);
        assert!(vault.load().unwrap().is_none());
    }
}
