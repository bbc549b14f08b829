//! Run command implementation.
//!
//! Starts the clipboard watcher and turns the terminal into a minimal picker:
//! commands are read line by line from stdin until `quit`, end of input, or
//! Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use clipshelf_core::clipboard::{create_clipboard, ClipboardWatcher};
use clipshelf_core::config::Config;
use clipshelf_core::focus::{FocusControl, Presenter, SystemFocus};
use clipshelf_core::history::{AddOutcome, HistoryStore};
use clipshelf_core::paste::PasteController;

use super::RunArgs;

/// Characters of text shown per entry in listings.
const PREVIEW_CHARS: usize = 60;

/// A line typed at the picker prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PickerCommand {
    List,
    Select(i64),
    Pin(i64),
    Delete(i64),
    Dismiss,
    Help,
    Quit,
}

/// Parse a picker line. Blank lines yield `Ok(None)`.
fn parse_command(line: &str) -> std::result::Result<Option<PickerCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };

    let index = |words: &mut std::str::SplitWhitespace<'_>| -> std::result::Result<i64, String> {
        let arg = words
            .next()
            .ok_or_else(|| format!("'{word}' needs an entry number"))?;
        arg.parse::<i64>()
            .map_err(|_| format!("'{arg}' is not an entry number"))
    };

    let command = match word {
        "list" | "ls" | "l" => PickerCommand::List,
        "select" | "s" => PickerCommand::Select(index(&mut words)?),
        "pin" | "p" => PickerCommand::Pin(index(&mut words)?),
        "delete" | "del" | "d" => PickerCommand::Delete(index(&mut words)?),
        "dismiss" | "esc" => PickerCommand::Dismiss,
        "help" | "h" | "?" => PickerCommand::Help,
        "quit" | "exit" | "q" => PickerCommand::Quit,
        other => match other.parse::<i64>() {
            Ok(n) => PickerCommand::Select(n),
            Err(_) => return Err(format!("Unknown command '{other}' (type 'help')")),
        },
    };

    if words.next().is_some() {
        return Err(format!("Too many arguments for '{word}'"));
    }
    Ok(Some(command))
}

/// Map a typed entry number to a valid index.
fn resolve_index(n: i64, len: usize) -> Option<usize> {
    usize::try_from(n).ok().filter(|&index| index < len)
}

/// Presenter for the terminal picker; there is no window to hide.
struct TerminalPresenter;

impl Presenter for TerminalPresenter {
    fn hide(&self) {
        tracing::debug!("Picker dismissed");
    }
}

/// Apply run flags to the loaded configuration.
///
/// The terminal running the picker holds focus whenever a command is typed, so
/// a paste keystroke would land in the picker itself. Paste-back therefore
/// needs `--paste` on top of `auto_paste`.
fn apply_run_args(config: &mut Config, args: &RunArgs) {
    config.paste.auto_paste &= args.paste;
}

/// Run the run command.
pub async fn run(args: RunArgs) -> Result<()> {
    let mut config = super::load_config();
    apply_run_args(&mut config, &args);

    let store = Arc::new(
        HistoryStore::from_config(&config).with_storage(config.storage.pinned_storage()),
    );
    store.restore();

    let clipboard = create_clipboard().map_err(|e| {
        if let Some(hint) = e.suggestion() {
            eprintln!("  Hint: {}", hint);
        }
        anyhow::Error::from(e)
    })?;

    let focus: Arc<dyn FocusControl> = Arc::new(SystemFocus::new());
    let controller = PasteController::new(
        Arc::clone(&store),
        Arc::clone(&clipboard),
        focus,
        Arc::new(TerminalPresenter),
        config.paste.clone(),
    );

    let (mut changes, watcher) =
        ClipboardWatcher::with_config(config.watcher.clone()).start(Arc::clone(&store), clipboard);

    println!();
    println!("Clipshelf is watching the clipboard.");
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!();
                break;
            }
            Some(change) = changes.recv() => {
                let label = if change.outcome == AddOutcome::MovedToFront {
                    "moved up"
                } else {
                    "new"
                };
                if let Some(entry) = store.entry(0) {
                    println!("  + [0] {} ({})", entry.preview(PREVIEW_CHARS), label);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(PickerCommand::Quit)) => break,
                    Ok(Some(command)) => handle_command(&controller, command),
                    Ok(None) => {}
                    Err(message) => println!("  {}", message),
                }
            }
        }
    }

    watcher.stop().await;
    println!("Stopped.");
    Ok(())
}

fn handle_command(controller: &PasteController, command: PickerCommand) {
    let store = controller.store();

    match command {
        PickerCommand::List => print_history(store),
        PickerCommand::Help => print_help(),
        PickerCommand::Dismiss => {
            controller.remember_focus();
            drop(controller.dismiss());
        }
        PickerCommand::Select(n) => match resolve_index(n, store.len()) {
            Some(index) => {
                let preview = store
                    .entry(index)
                    .map(|e| e.preview(PREVIEW_CHARS))
                    .unwrap_or_default();
                controller.remember_focus();
                if controller.select(index).is_some() {
                    println!("  Copied [{}] {}", index, preview);
                } else {
                    println!("  Could not copy entry {}", index);
                }
            }
            None => report_bad_index(n, store.len()),
        },
        PickerCommand::Pin(n) => match resolve_index(n, store.len()) {
            Some(index) => match store.toggle_pin(index) {
                Some(true) => println!("  Pinned [{}]", index),
                Some(false) => println!("  Unpinned [{}]", index),
                None => report_bad_index(n, store.len()),
            },
            None => report_bad_index(n, store.len()),
        },
        PickerCommand::Delete(n) => match resolve_index(n, store.len()) {
            Some(index) => match store.delete(index) {
                Some(entry) => println!("  Deleted {}", entry.preview(PREVIEW_CHARS)),
                None => report_bad_index(n, store.len()),
            },
            None => report_bad_index(n, store.len()),
        },
        PickerCommand::Quit => {}
    }
}

fn report_bad_index(n: i64, len: usize) {
    if len == 0 {
        println!("  History is empty.");
    } else {
        println!("  No entry {} (valid: 0-{})", n, len - 1);
    }
}

fn print_history(store: &HistoryStore) {
    let entries = store.get();
    println!();
    println!("Clipboard History ({}/{})", entries.len(), store.capacity());
    println!("{}", "─".repeat(70));
    if entries.is_empty() {
        println!("  (nothing copied yet)");
    }
    for (index, entry) in entries.iter().enumerate() {
        let pin = if entry.pinned { "*" } else { " " };
        println!("  {:>2} {} {}", index, pin, entry.preview(PREVIEW_CHARS));
    }
    println!("{}", "─".repeat(70));
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  list              Show history (* = pinned)");
    println!("  <n> | select <n>  Copy entry n (and paste it when started with --paste)");
    println!("  pin <n>           Pin or unpin entry n");
    println!("  delete <n>        Remove entry n");
    println!("  dismiss           Return focus without pasting");
    println!("  help              Show this help");
    println!("  quit              Stop watching (or press Ctrl-C)");
    println!();
}
