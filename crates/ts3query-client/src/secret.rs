//! Secret reference resolver.
//!
//! Passwords in configuration files can point at secrets stored elsewhere:
//!
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - `pass::path/in/store` runs `pass show path/in/store` and takes the first line
//! - `file::/path/to/file` takes the first line of a file
//! - anything else is used as-is

use std::path::Path;

use crate::error::{ClientError, ClientResult};

/// Resolves a value that may be a secret reference.
pub fn resolve(value: &str) -> ClientResult<String> {
    if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(path) = value.strip_prefix("file::") {
        resolve_file(Path::new(path))
    } else {
        Ok(value.to_string())
    }
}

/// Returns true if `value` uses one of the reference prefixes.
pub fn is_reference(value: &str) -> bool {
    ["env::", "pass::", "file::"]
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

fn resolve_env(var: &str) -> ClientResult<String> {
    std::env::var(var)
        .map_err(|_| ClientError::Config(format!("environment variable `{}` is not set", var)))
}

fn resolve_pass(path: &str) -> ClientResult<String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| ClientError::Config(format!("failed to run `pass show {}`: {}", path, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ClientError::Config(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        )));
    }

    first_line(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| ClientError::Config(format!("`pass show {}` produced no output", path)))
}

fn resolve_file(path: &Path) -> ClientResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ClientError::Config(format!("failed to read secret file {}: {}", path.display(), e))
    })?;
    first_line(&content)
        .ok_or_else(|| ClientError::Config(format!("secret file {} is empty", path.display())))
}

fn first_line(text: &str) -> Option<String> {
    text.lines().next().map(|line| line.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("hunter2").unwrap(), "hunter2");
        assert_eq!(resolve("").unwrap(), "");
        assert!(!is_reference("hunter2"));
    }

    #[test]
    fn env_reference() {
        unsafe {
            std::env::set_var("_TS3QUERY_TEST_SECRET", "from-env");
        }
        assert!(is_reference("env::_TS3QUERY_TEST_SECRET"));
        assert_eq!(resolve("env::_TS3QUERY_TEST_SECRET").unwrap(), "from-env");
        unsafe {
            std::env::remove_var("_TS3QUERY_TEST_SECRET");
        }
    }

    #[test]
    fn missing_env_var() {
        let err = resolve("env::_TS3QUERY_NONEXISTENT_VAR_12345").unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn file_reference_takes_first_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "s3cret").unwrap();
        writeln!(file, "ignored").unwrap();

        let reference = format!("file::{}", file.path().display());
        assert_eq!(resolve(&reference).unwrap(), "s3cret");
    }

    #[test]
    fn pass_reference_failure() {
        assert!(resolve("pass::nonexistent/entry/that/should/not/exist/12345").is_err());
    }
}
