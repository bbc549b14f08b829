//! Diagnose command implementation.
//!
//! Reports what Clipshelf needs from the desktop: clipboard access and the
//! automation tool used for paste-back.

use anyhow::Result;

use clipshelf_core::clipboard::diagnose_clipboard;
use clipshelf_core::config::Config;
use clipshelf_core::focus::automation_available;
use clipshelf_core::VERSION;

use super::DiagnoseArgs;

/// Run the diagnose command.
pub async fn run(args: DiagnoseArgs) -> Result<()> {
    let config = super::load_config();
    let clipboard = diagnose_clipboard();
    let automation = automation_available();
    let pinned_path = config.storage.pinned_storage().path().display().to_string();

    if args.json {
        let output = serde_json::json!({
            "version": VERSION,
            "config_path": Config::config_path().display().to_string(),
            "pinned_path": pinned_path,
            "clipboard": clipboard,
            "automation_available": automation,
            "auto_paste": config.paste.auto_paste,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("Clipshelf Diagnostics");
    println!("{}", "─".repeat(50));
    println!();
    println!("  Version:       {}", VERSION);
    println!("  Config file:   {}", Config::config_path().display());
    println!("  Pinned file:   {}", pinned_path);
    println!();
    println!("Clipboard:");
    for line in &clipboard {
        println!("  {}", line);
    }
    println!();
    println!("Paste-back:");
    if automation {
        println!("  Automation tool: available");
    } else {
        println!("  Automation tool: NOT FOUND");
        #[cfg(target_os = "macos")]
        println!("  osascript is required; grant Accessibility access to your terminal.");
        #[cfg(target_os = "linux")]
        println!("  Install xdotool (X11 only) to enable focus restore and auto-paste.");
    }
    println!("  Auto-paste:      {}", if config.paste.auto_paste { "on" } else { "off" });
    println!();

    Ok(())
}
