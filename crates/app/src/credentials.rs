use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Expands a leading `~` to `$HOME`. Other paths are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Reads an API key from a file, trimming surrounding whitespace.
pub fn load_api_key(path: &Path) -> Result<String> {
    let resolved = expand_home(path);
    let key = fs::read_to_string(&resolved).map_err(|err| match err.kind() {
        ErrorKind::NotFound => AppError::MissingCredential {
            path: resolved.clone(),
        },
        _ => AppError::io(&resolved, err),
    })?;

    let key = key.trim();
    if key.is_empty() {
        return Err(AppError::EmptyCredential { path: resolved });
    }
    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        env::temp_dir().join(format!("arm-sim-cred-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_key_is_trimmed() {
        let path = scratch("trim");
        fs::write(&path, "  sk-test-123\n").unwrap();
        assert_eq!(load_api_key(&path).unwrap(), "sk-test-123");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_key_file() {
        let err = load_api_key(&scratch("missing")).unwrap_err();
        assert!(matches!(err, AppError::MissingCredential { .. }));
    }

    #[test]
    fn test_blank_key_file() {
        let path = scratch("blank");
        fs::write(&path, "\n\n").unwrap();
        let err = load_api_key(&path).unwrap_err();
        assert!(matches!(err, AppError::EmptyCredential { .. }));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_plain_paths_are_not_expanded() {
        assert_eq!(expand_home(Path::new("/etc/key")), PathBuf::from("/etc/key"));
        assert_eq!(expand_home(Path::new("rel/key")), PathBuf::from("rel/key"));
        assert_eq!(expand_home(Path::new("~user/key")), PathBuf::from("~user/key"));
    }
}
