//! Pinned command implementation.

use anyhow::Result;

use clipshelf_core::history::{ClipContent, HistoryEntry};

use super::PinnedArgs;

/// Run the pinned command.
pub async fn run(args: PinnedArgs) -> Result<()> {
    let config = super::load_config();
    let storage = config.storage.pinned_storage();
    let entries = storage.try_load()?;

    if args.json {
        let output = serde_json::json!({
            "path": storage.path().display().to_string(),
            "entries": entries.iter().map(entry_json).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("Pinned Entries ({})", storage.path().display());
    println!("{}", "─".repeat(70));
    if entries.is_empty() {
        println!("  (nothing pinned)");
    }
    for (index, entry) in entries.iter().enumerate() {
        println!("  {:>2}  {}", index, entry.preview(60));
    }
    println!("{}", "─".repeat(70));

    Ok(())
}

fn entry_json(entry: &HistoryEntry) -> serde_json::Value {
    match &entry.content {
        ClipContent::Text(text) => serde_json::json!({
            "type": "text",
            "text": text,
        }),
        ClipContent::Image(image) => {
            let (width, height) = image.dimensions().unzip();
            serde_json::json!({
                "type": "image",
                "bytes": image.len(),
                "width": width,
                "height": height,
                "fingerprint": image.fingerprint().to_string(),
            })
        }
    }
}
