use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "plotboard", about = "Plot board for long-form writing: columns, cards, timeline sync", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: <config dir>/plotboard/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding board and history files
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the board
    Show(ShowArgs),
    /// Add an empty column
    AddColumn(ColumnArgs),
    /// Rename a column, keeping its cards
    RenameColumn(RenameColumnArgs),
    /// Delete a column and all of its cards
    DeleteColumn(DeleteColumnArgs),
    /// Add a card to the end of a column
    AddCard(AddCardArgs),
    /// Change a card's fields
    EditCard(EditCardArgs),
    /// Delete a card
    DeleteCard(DeleteCardArgs),
    /// Reorder a card inside its column
    MoveCard(MoveCardArgs),
    /// Move a card to the end of another column
    MoveBetween(MoveBetweenArgs),
    /// List saved board versions, newest first
    History,
    /// Replace the board with a saved version
    Restore(RestoreArgs),
    /// Push board cards to the timeline
    SyncTimeline(SyncTimelineArgs),
    /// Pull timeline edits into the board
    PullTimeline,
    /// Print the timeline
    Timeline,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Titles only, as JSON
    #[arg(long)]
    pub summary: bool,
    /// Full board tree as JSON
    #[arg(long, conflicts_with = "summary")]
    pub json: bool,
}

#[derive(Args)]
pub struct ColumnArgs {
    pub name: String,
}

#[derive(Args)]
pub struct RenameColumnArgs {
    pub old: String,
    pub new: String,
}

#[derive(Args)]
pub struct DeleteColumnArgs {
    pub name: String,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct AddCardArgs {
    pub column: String,
    pub title: String,
}

#[derive(Args)]
pub struct EditCardArgs {
    pub column: String,
    /// Card position in the column (0-based)
    pub index: usize,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Replace tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Replace links (repeatable)
    #[arg(long = "link")]
    pub links: Vec<String>,
    #[arg(long)]
    pub color: Option<String>,
    /// Remove the card color
    #[arg(long, conflicts_with = "color")]
    pub clear_color: bool,
}

#[derive(Args)]
pub struct DeleteCardArgs {
    pub column: String,
    pub index: usize,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct MoveCardArgs {
    pub column: String,
    pub from: usize,
    pub to: usize,
}

#[derive(Args)]
pub struct MoveBetweenArgs {
    pub from: String,
    pub to: String,
    /// Card position in the source column
    pub index: usize,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// History file name, as printed by `history`
    pub version: String,
}

#[derive(Args)]
pub struct SyncTimelineArgs {
    /// Only push this column; nothing is removed from the timeline
    #[arg(long)]
    pub column: Option<String>,
}
