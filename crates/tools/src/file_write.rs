//! File write executor — creates or overwrites, making parents as needed.

use async_trait::async_trait;
use gyro_core::registry::{ActionExecutor, Capability, ParamKind, ParamSpec};
use gyro_core::{ExecutorPanic, Outcome};
use std::path::Path;

use crate::{io_failure, require_str};

pub struct FileWrite;

#[async_trait]
impl ActionExecutor for FileWrite {
    fn capability(&self) -> Capability {
        Capability {
            name: "file_write".into(),
            description: "Write content to a file (creates or overwrites)".into(),
            params: vec![
                ParamSpec::required("path", ParamKind::Text),
                ParamSpec::required("content", ParamKind::Text),
            ],
        }
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Outcome, ExecutorPanic> {
        let path = require_str(params, "path", "file_write")?;
        let content = require_str(params, "content", "file_write")?;

        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(io_failure(path, "writing", e));
        }

        match tokio::fs::write(path, content).await {
            Ok(()) => {
                let mut metadata = serde_json::Map::new();
                metadata.insert("bytes_written".into(), content.len().into());
                metadata.insert("path".into(), path.into());
                Ok(Outcome::Success {
                    content: format!("Successfully wrote {} characters to {path}", content.len()),
                    metadata,
                })
            }
            Err(e) => Ok(io_failure(path, "writing", e)),
        }
    }
}
