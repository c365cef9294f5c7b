use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::Result;
use crate::models::{Chronicle, Story, StoryBatch};

/// Keep only published stories, in the order the chronicler returned them.
pub fn filter_published(batch: StoryBatch) -> Vec<Story> {
    batch
        .stories
        .into_iter()
        .filter(Story::is_published)
        .inspect(|story| {
            for warning in story.constraint_warnings() {
                warn!("Story '{}': {}", story.id().unwrap_or("?"), warning);
            }
        })
        .collect()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize the chronicle and replace whatever was at `path`.
///
/// The document goes to a sibling temp file first and is renamed into place,
/// so readers see either the previous artifact or the complete new one.
pub async fn write_chronicle(path: &Path, chronicle: &Chronicle) -> Result<()> {
    let mut json = serde_json::to_string_pretty(chronicle)?;
    json.push('\n');

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, json.as_bytes()).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    Ok(())
}
