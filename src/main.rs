mod args;
mod cipher;
mod config;
mod editor;
mod error;
mod migration;
mod note;
mod session;
mod store;
mod tui;
mod workflow;

use crate::{
    args::{Args, Command},
    config::Config,
    error::AppError,
    migration::MigrationOutcome,
    store::NoteStore,
};
use clap::Parser;
use log::{LevelFilter, info, warn};
use uuid::Uuid;

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    let filter_level = match args.verbose_level {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    initialize_logger(filter_level);

    let config = Config::new(&args.config_file)?;
    let mut store = NoteStore::open(&config.store_path())?;
    info!("Loaded {} notes from {}", store.len(), config.store_path);

    match args.command {
        None | Some(Command::Tui) => {
            let mut app = tui::App::new(&config, store, args)?;
            app.run()
        }
        Some(Command::Migrate { user_id, dry_run }) => {
            run_migration(&mut store, user_id, dry_run)
        }
        Some(Command::History { note_id }) => print_history(&store, config.user_id, &note_id),
    }
}

fn run_migration(
    store: &mut NoteStore,
    user_id: Option<u64>,
    dry_run: bool,
) -> Result<(), AppError> {
    let users = match user_id {
        Some(id) => vec![id],
        None => store.owners_with_locked_notes(),
    };
    if users.is_empty() {
        println!("No locked notes found to migrate.");
        return Ok(());
    }
    if dry_run {
        println!("DRY RUN MODE - No changes will be made");
    }

    let mut migrated = 0;
    let mut skipped = 0;
    let mut failed = 0;
    for user in users {
        let count = store.locked_note_ids_for_user(user).len();
        if count == 0 {
            continue;
        }
        println!("\nProcessing {count} locked notes for user {user}");

        let prompt = format!("Enter encryption password for user {user}: ");
        let password = editor::prompt_password(&prompt)?;
        let report = match migration::migrate_user_notes(store, user, &password, dry_run) {
            Ok(report) => report,
            Err(e) if e.is_recoverable() => {
                warn!("Skipping user {user}: {e}");
                println!("  SKIPPED user {user}: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        for note in &report.notes {
            match &note.outcome {
                MigrationOutcome::Migrated { title } => {
                    println!("  MIGRATED: Note {} - \"{title}\"", note.note_id)
                }
                MigrationOutcome::WouldMigrate { title } => {
                    println!("  WOULD MIGRATE: Note {} - \"{title}\"", note.note_id)
                }
                MigrationOutcome::AlreadyMigrated => {
                    println!("  SKIPPED: Note {} - already in new format", note.note_id)
                }
                MigrationOutcome::Failed(reason) => {
                    println!("  FAILED: Note {} - {reason}", note.note_id)
                }
            }
        }
        migrated += report.migrated();
        skipped += report.skipped();
        failed += report.failed();
    }

    if dry_run {
        println!(
            "\nDRY RUN COMPLETE: {migrated} notes would be migrated, \
             {skipped} already migrated, {failed} failures"
        );
    } else {
        store.save()?;
        println!(
            "\nMIGRATION COMPLETE: {migrated} notes migrated, \
             {skipped} already migrated, {failed} failures"
        );
    }
    if failed > 0 {
        println!("Some notes failed to migrate. Please check passwords and try again.");
    }
    Ok(())
}

fn print_history(store: &NoteStore, user_id: u64, note_id: &Uuid) -> Result<(), AppError> {
    let versions = workflow::note_history(store, user_id, note_id)?;
    if versions.is_empty() {
        println!("No saved versions.");
        return Ok(());
    }
    for (index, version) in versions.iter().enumerate() {
        let body = if version.is_locked {
            "[locked]".to_string()
        } else {
            version.content.lines().next().unwrap_or_default().to_string()
        };
        println!(
            "{:>3}  {}  {}  {body}",
            index + 1,
            version.created_at.format("%Y-%m-%d %H:%M:%S"),
            version.display_title()
        );
    }
    Ok(())
}

fn initialize_logger(filter_level: LevelFilter) {
    env_logger::builder().filter_level(filter_level).init();
}
