use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use plotboard_core::config::{load_config, BoardConfig};
use plotboard_core::session::{BoardSession, CardEdit, SyncOutcome};
use plotboard_core::storage::LocalStore;
use plotboard_core::sync::SyncReport;

use crate::commands::*;

type CmdResult = Result<(), Box<dyn Error>>;

/// Default config path: <config dir>/plotboard/config.json
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("plotboard")
        .join("config.json")
}

/// Data directory: --data-dir, then the config file, then <data dir>/plotboard.
fn resolve_data_dir(cli_dir: Option<PathBuf>, config: &BoardConfig) -> PathBuf {
    cli_dir
        .or_else(|| config.data_dir.clone())
        .unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("plotboard")
        })
}

fn prompt_stdin(prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}

fn confirmer(yes: bool) -> impl FnMut(&str) -> bool {
    move |prompt: &str| yes || prompt_stdin(prompt)
}

pub fn dispatch(cli: Cli) -> CmdResult {
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = load_config(&config_path);
    let data_dir = resolve_data_dir(cli.data_dir, &config);
    log::info!("Using data directory {}", data_dir.display());

    let mut session = BoardSession::open(LocalStore::new(&data_dir), &config)?;

    match cli.command {
        Commands::Show(args) => cmd_show(&session, args),
        Commands::History => cmd_history(&session),
        Commands::Timeline => cmd_timeline(&mut session),
        Commands::AddColumn(args) => {
            if !session.add_column(&args.name) {
                return Err(format!("column already exists: {}", args.name).into());
            }
            save(&mut session)
        }
        Commands::RenameColumn(args) => {
            if !session.rename_column(&args.old, &args.new) {
                return Err(format!(
                    "cannot rename {:?} to {:?}: missing column or name taken",
                    args.old, args.new
                )
                .into());
            }
            save(&mut session)
        }
        Commands::DeleteColumn(args) => {
            if !session.board().has_column(&args.name) {
                return Err(format!("column not found: {}", args.name).into());
            }
            if !session.delete_column(&args.name, &mut confirmer(args.yes)) {
                println!("Cancelled");
                return Ok(());
            }
            save(&mut session)
        }
        Commands::AddCard(args) => {
            let id = session
                .add_card(&args.column, &args.title)
                .ok_or_else(|| format!("column not found: {}", args.column))?;
            println!("{}", id);
            save(&mut session)
        }
        Commands::EditCard(args) => cmd_edit_card(&mut session, args),
        Commands::DeleteCard(args) => {
            if session.board().card(&args.column, args.index).is_none() {
                return Err(no_card(&args.column, args.index));
            }
            if !session.delete_card(&args.column, args.index, &mut confirmer(args.yes)) {
                println!("Cancelled");
                return Ok(());
            }
            save(&mut session)
        }
        Commands::MoveCard(args) => {
            if !session.move_card_within_column(&args.column, args.from, args.to) {
                return Err(format!(
                    "cannot move {} -> {} in column {:?}",
                    args.from, args.to, args.column
                )
                .into());
            }
            save(&mut session)
        }
        Commands::MoveBetween(args) => {
            if !session.move_card_between_columns(&args.from, &args.to, args.index) {
                return Err(format!(
                    "cannot move card {} from {:?} to {:?}",
                    args.index, args.from, args.to
                )
                .into());
            }
            save(&mut session)
        }
        Commands::Restore(args) => {
            if !session.restore_version(&args.version)? {
                return Err(format!("no such version: {}", args.version).into());
            }
            save(&mut session)
        }
        Commands::SyncTimeline(args) => cmd_sync_timeline(&mut session, args),
        Commands::PullTimeline => cmd_pull_timeline(&mut session),
    }
}

fn no_card(column: &str, index: usize) -> Box<dyn Error> {
    format!("no card at {} in column {:?}", index, column).into()
}

fn save(session: &mut BoardSession<LocalStore>) -> CmdResult {
    let history = session.save()?;
    log::info!("Saved board, history copy {}", history);
    Ok(())
}

fn cmd_show(session: &BoardSession<LocalStore>, args: ShowArgs) -> CmdResult {
    if args.summary {
        let summary = plotboard_core::codec::summarize(session.board());
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    if args.json {
        let tree = session.save_state().to_value()?;
        println!("{}", serde_json::to_string_pretty(&tree)?);
        return Ok(());
    }
    for column in session.board().columns() {
        println!("## {} ({})", column.name(), column.len());
        for (i, card) in column.cards().iter().enumerate() {
            let meta = card.metadata();
            let tags = if meta.tags.is_empty() {
                String::new()
            } else {
                format!(" #{}", meta.tags.join(" #"))
            };
            println!("  [{}] {}{}  ({})", i, card.title(), tags, card.id());
        }
    }
    Ok(())
}

fn cmd_history(session: &BoardSession<LocalStore>) -> CmdResult {
    for name in session.list_versions()? {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_edit_card(session: &mut BoardSession<LocalStore>, args: EditCardArgs) -> CmdResult {
    if session.board().card(&args.column, args.index).is_none() {
        return Err(no_card(&args.column, args.index));
    }
    let color = if args.clear_color {
        Some(None)
    } else {
        args.color.map(Some)
    };
    let edit = CardEdit {
        title: args.title,
        notes: args.notes,
        tags: (!args.tags.is_empty()).then_some(args.tags),
        links: (!args.links.is_empty()).then_some(args.links),
        color,
    };
    if !session.edit_card(&args.column, args.index, edit) {
        println!("Nothing to change");
        return Ok(());
    }
    save(session)
}

fn print_report(report: &SyncReport) -> CmdResult {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}

fn cmd_sync_timeline(session: &mut BoardSession<LocalStore>, args: SyncTimelineArgs) -> CmdResult {
    session.attach_persisted_timeline()?;
    let outcome = match &args.column {
        Some(column) => session.sync_column_to_timeline(column),
        None => session.sync_all_to_timeline(),
    };
    match outcome {
        SyncOutcome::Synced(report) => {
            session.save_timeline()?;
            print_report(&report)
        }
        SyncOutcome::ColumnNotFound => {
            Err(format!("column not found: {}", args.column.unwrap_or_default()).into())
        }
        SyncOutcome::TimelineNotFound => Err("timeline not available".into()),
    }
}

fn cmd_pull_timeline(session: &mut BoardSession<LocalStore>) -> CmdResult {
    session.attach_persisted_timeline()?;
    match session.sync_timeline_to_board() {
        SyncOutcome::Synced(report) => {
            if report.changed() {
                save(session)?;
            }
            print_report(&report)
        }
        _ => Err("timeline not available".into()),
    }
}

fn cmd_timeline(session: &mut BoardSession<LocalStore>) -> CmdResult {
    session.attach_persisted_timeline()?;
    let Some(timeline) = session.timeline() else {
        return Ok(());
    };
    for (i, card) in timeline.cards().iter().enumerate() {
        println!("  [{}] {}  ({})", i, card.title, card.id);
    }
    Ok(())
}
