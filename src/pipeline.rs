use std::path::PathBuf;

use chrono::Local;
use tracing::{error, info};

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::generator::{StoryGenerator, CHRONICLER_INSTRUCTION};
use crate::models::Chronicle;
use crate::publisher::{filter_published, write_chronicle};

/// How a single run ended. Only a failed write surfaces as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No feed produced a usable entry; nothing was written
    NoCandidates,
    /// The generator failed; the previous artifact is untouched
    GenerationFailed,
    Published { count: usize, path: PathBuf },
}

/// Fetch, transform, filter and persist, once.
pub async fn run(
    config: &Config,
    fetcher: &Fetcher,
    generator: &dyn StoryGenerator,
) -> Result<RunOutcome> {
    let items = fetcher
        .fetch_candidates(&config.feeds, config.candidate_limit)
        .await;
    if items.is_empty() {
        info!("No items found, exiting");
        return Ok(RunOutcome::NoCandidates);
    }

    let batch = match generator.generate(CHRONICLER_INSTRUCTION, &items).await {
        Ok(batch) => batch,
        Err(e) => {
            error!("{} request failed: {}", generator.name(), e);
            error!("Failed to generate content");
            return Ok(RunOutcome::GenerationFailed);
        }
    };

    let stories = filter_published(batch);
    let count = stories.len();
    let chronicle = Chronicle::new(stories, Local::now());
    write_chronicle(&config.output_path, &chronicle).await?;

    Ok(RunOutcome::Published {
        count,
        path: config.output_path.clone(),
    })
}
