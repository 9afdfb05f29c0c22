//! File/directory delete executor.

use async_trait::async_trait;
use gyro_core::registry::{ActionExecutor, Capability, ParamKind, ParamSpec};
use gyro_core::{ExecutorPanic, FailureReason, Outcome};

use crate::{io_failure, require_str};

pub struct FileDelete;

#[async_trait]
impl ActionExecutor for FileDelete {
    fn capability(&self) -> Capability {
        Capability {
            name: "file_delete".into(),
            description: "Delete a file or directory".into(),
            params: vec![ParamSpec::required("path", ParamKind::Text)],
        }
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Outcome, ExecutorPanic> {
        let path = require_str(params, "path", "file_delete")?;

        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Outcome::failure(
                    FailureReason::NotFound,
                    format!("Path does not exist: {path}"),
                ));
            }
            Err(e) => return Ok(io_failure(path, "deleting", e)),
        };

        let (result, kind) = if meta.is_dir() {
            (tokio::fs::remove_dir_all(path).await, "directory")
        } else {
            (tokio::fs::remove_file(path).await, "file")
        };

        match result {
            Ok(()) => Ok(Outcome::success(format!(
                "Successfully deleted {kind}: {path}"
            ))),
            Err(e) => Ok(io_failure(path, "deleting", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(path: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut m = serde_json::Map::new();
        m.insert("path".into(), path.into());
        m
    }

    #[tokio::test]
    async fn delete_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "x").unwrap();

        let outcome = FileDelete
            .execute(&params(file.to_str().unwrap()))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn delete_directory_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("inner.txt"), "x").unwrap();

        let outcome = FileDelete
            .execute(&params(sub.to_str().unwrap()))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(!sub.exists());
    }

    #[tokio::test]
    async fn delete_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let outcome = FileDelete
            .execute(&params(missing.to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(outcome.failure_reason(), Some(FailureReason::NotFound));
    }
}
