//! Directory creation executor.

use async_trait::async_trait;
use gyro_core::registry::{ActionExecutor, Capability, ParamKind, ParamSpec};
use gyro_core::{ExecutorPanic, Outcome};

use crate::{io_failure, require_str};

pub struct DirCreate;

#[async_trait]
impl ActionExecutor for DirCreate {
    fn capability(&self) -> Capability {
        Capability {
            name: "dir_create".into(),
            description: "Create a directory (and parent directories if needed)".into(),
            params: vec![ParamSpec::required("path", ParamKind::Text)],
        }
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Outcome, ExecutorPanic> {
        let path = require_str(params, "path", "dir_create")?;

        match tokio::fs::create_dir_all(path).await {
            Ok(()) => Ok(Outcome::success(format!(
                "Successfully created directory: {path}"
            ))),
            Err(e) => Ok(io_failure(path, "creating directory", e)),
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
    async fn create_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        let outcome = DirCreate
            .execute(&params(nested.to_str().unwrap()))
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn create_existing_directory_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = DirCreate
            .execute(&params(dir.path().to_str().unwrap()))
            .await
            .unwrap();
        assert!(outcome.is_success());
    }
}
