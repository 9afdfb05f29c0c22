//! File read executor.

use async_trait::async_trait;
use gyro_core::registry::{ActionExecutor, Capability, ParamKind, ParamSpec};
use gyro_core::{ExecutorPanic, FailureReason, Outcome};

use crate::{io_failure, require_str};

pub struct FileRead;

#[async_trait]
impl ActionExecutor for FileRead {
    fn capability(&self) -> Capability {
        Capability {
            name: "file_read".into(),
            description: "Read the contents of a file".into(),
            params: vec![ParamSpec::required("path", ParamKind::Text)],
        }
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Outcome, ExecutorPanic> {
        let path = require_str(params, "path", "file_read")?;

        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => {
                return Ok(Outcome::failure(
                    FailureReason::WrongType,
                    format!("Path is not a file: {path}"),
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Outcome::failure(
                    FailureReason::NotFound,
                    format!("File does not exist: {path}"),
                ));
            }
            Err(e) => return Ok(io_failure(path, "reading", e)),
        }

        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let mut metadata = serde_json::Map::new();
                metadata.insert("file_size".into(), content.len().into());
                metadata.insert("path".into(), path.into());
                Ok(Outcome::Success { content, metadata })
            }
            Err(e) => Ok(io_failure(path, "reading", e)),
        }
    }
}
