//! Directory listing executor.

use async_trait::async_trait;
use gyro_core::registry::{ActionExecutor, Capability, ParamKind, ParamSpec};
use gyro_core::{ExecutorPanic, FailureReason, Outcome};

use crate::{io_failure, require_str};

pub struct DirList;

#[async_trait]
impl ActionExecutor for DirList {
    fn capability(&self) -> Capability {
        Capability {
            name: "dir_list".into(),
            description: "List files and directories in a given path".into(),
            params: vec![ParamSpec::required("path", ParamKind::Text)],
        }
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Outcome, ExecutorPanic> {
        let path = require_str(params, "path", "dir_list")?;

        match tokio::fs::metadata(path).await {
            Ok(meta) if !meta.is_dir() => {
                return Ok(Outcome::failure(
                    FailureReason::WrongType,
                    format!("Path is not a directory: {path}"),
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Outcome::failure(
                    FailureReason::NotFound,
                    format!("Directory does not exist: {path}"),
                ));
            }
            Err(e) => return Ok(io_failure(path, "listing", e)),
        }

        let mut entries = match tokio::fs::read_dir(path).await {
            Ok(rd) => rd,
            Err(e) => return Ok(io_failure(path, "listing", e)),
        };

        let mut lines = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    match entry.metadata().await {
                        Ok(meta) if meta.is_dir() => lines.push(format!("{name} (directory)")),
                        Ok(meta) => lines.push(format!("{name} (file, {} bytes)", meta.len())),
                        Err(_) => lines.push(format!("{name} (unknown)")),
                    }
                }
                Ok(None) => break,
                Err(e) => return Ok(io_failure(path, "listing", e)),
            }
        }
        lines.sort();

        let mut metadata = serde_json::Map::new();
        metadata.insert("count".into(), lines.len().into());
        metadata.insert("path".into(), path.into());
        Ok(Outcome::Success {
            content: lines.join("\n"),
            metadata,
        })
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
    async fn list_names_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "12345").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let outcome = DirList
            .execute(&params(dir.path().to_str().unwrap()))
            .await
            .unwrap();

        match outcome {
            Outcome::Success { content, metadata } => {
                assert!(content.contains("a.txt (file, 5 bytes)"));
                assert!(content.contains("sub (directory)"));
                assert_eq!(metadata["count"], 2);
            }
            other => panic!("Expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let outcome = DirList
            .execute(&params(missing.to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(outcome.failure_reason(), Some(FailureReason::NotFound));
    }

    #[tokio::test]
    async fn list_file_is_wrong_type() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "x").unwrap();
        let outcome = DirList
            .execute(&params(file.to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(outcome.failure_reason(), Some(FailureReason::WrongType));
    }
}
