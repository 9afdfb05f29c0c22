//! File edit executor — find/replace over an existing file.

use async_trait::async_trait;
use gyro_core::registry::{ActionExecutor, Capability, ParamKind, ParamSpec};
use gyro_core::{ExecutorPanic, FailureReason, Outcome};

use crate::{io_failure, require_str};

pub struct FileEdit;

#[async_trait]
impl ActionExecutor for FileEdit {
    fn capability(&self) -> Capability {
        Capability {
            name: "file_edit".into(),
            description: "Edit a file by replacing text patterns".into(),
            params: vec![
                ParamSpec::required("path", ParamKind::Text),
                ParamSpec::required("find_text", ParamKind::Text),
                ParamSpec::required("replace_text", ParamKind::Text),
            ],
        }
    }

    async fn execute(
        &self,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Outcome, ExecutorPanic> {
        let path = require_str(params, "path", "file_edit")?;
        let find_text = require_str(params, "find_text", "file_edit")?;
        let replace_text = require_str(params, "replace_text", "file_edit")?;

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Outcome::failure(
                    FailureReason::NotFound,
                    format!("File does not exist: {path}"),
                ));
            }
            Err(e) => return Ok(io_failure(path, "editing", e)),
        };

        if !content.contains(find_text) {
            return Ok(Outcome::failure(
                FailureReason::Conflict,
                format!("Text to replace not found in file: {find_text}"),
            ));
        }

        let replacements = content.matches(find_text).count();
        let new_content = content.replace(find_text, replace_text);

        match tokio::fs::write(path, new_content).await {
            Ok(()) => {
                let mut metadata = serde_json::Map::new();
                metadata.insert("replacements".into(), replacements.into());
                metadata.insert("path".into(), path.into());
                Ok(Outcome::Success {
                    content: format!("Successfully replaced {replacements} occurrence(s) in {path}"),
                    metadata,
                })
            }
            Err(e) => Ok(io_failure(path, "editing", e)),
        }
    }
}
