//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::storage::{BlobStore, FileKind};
use anyhow::Result;

/// Run the list command.
pub fn run_list(videos: bool, page: u32, page_size: Option<u32>, settings: Settings) -> Result<()> {
    let kind = if videos { FileKind::Video } else { FileKind::Document };
    let page_size = page_size
        .unwrap_or(settings.server.page_size)
        .min(settings.server.max_page_size);

    let store = BlobStore::new(&settings.sqlite_path())?;

    match store.list(kind, page, page_size) {
        Ok(result) => {
            if result.total == 0 {
                Output::info(&format!(
                    "No {}s stored yet. Use 'docqa ingest <path>' to add content.",
                    kind
                ));
            } else {
                let pages = result.total.div_ceil(u64::from(result.page_size));
                Output::header(&format!(
                    "Stored {}s ({} total, page {} of {})",
                    kind, result.total, result.page, pages
                ));
                println!();

                for item in &result.items {
                    Output::file_info(item);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list {}s: {}", kind, e));
            return Err(e.into());
        }
    }

    Ok(())
}
