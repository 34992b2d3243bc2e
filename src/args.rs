use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(version, about = "Notes with password-locked content")]
pub struct Args {
    /// The path to the config file
    #[clap(short, long)]
    pub config_file: Option<PathBuf>,

    /// The text editor to use. The default is the system's default text editor (EDITOR
    /// environment variable), and if that doesn't work, use nano.
    #[clap(short, long)]
    pub editor: Option<String>,

    #[clap(short, long, action = ArgAction::Count, default_value_t = 1)]
    pub verbose_level: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Browse and edit notes interactively (default)
    Tui,
    /// Convert locked notes from the title+content layout to content-only encryption
    Migrate {
        /// Only migrate this user's notes; otherwise every user owning locked notes
        #[clap(long)]
        user_id: Option<u64>,
        /// Report what would change without writing anything
        #[clap(long)]
        dry_run: bool,
    },
    /// List the saved versions of a note
    History { note_id: Uuid },
}
