use crate::args::Args;
use crate::error::AppError;
use log::debug;
use std::fs;
use std::io::{self, Write};
use std::process::Command;
use tempfile::NamedTempFile;
use zeroize::Zeroizing;

/// Opens `initial` in the user's editor and returns the edited text.
///
/// The scratch file is removed when this returns, on success or failure.
pub fn edit_text(args: &Args, initial: &str) -> Result<Zeroizing<String>, AppError> {
    let mut scratch = NamedTempFile::new()?;
    scratch.write_all(initial.as_bytes())?;
    scratch.flush()?;

    open_in_editor(args, scratch.path())?;

    let edited = Zeroizing::new(fs::read_to_string(scratch.path())?);
    // Blank out the file before it is unlinked
    fs::write(scratch.path(), b"")?;
    Ok(edited)
}

/// Opens the file in the default text editor
pub fn open_in_editor(args: &Args, path: &std::path::Path) -> Result<(), AppError> {
    let env_editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
    let editor = args.editor.as_ref().unwrap_or(&env_editor);
    debug!("Launching editor {editor}");
    Command::new(editor).arg(path).spawn()?.wait()?;
    Ok(())
}

/// Reads a line from the terminal with echo.
pub fn prompt_line(prompt: &str) -> Result<String, AppError> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Reads a password without echo.
pub fn prompt_password(prompt: &str) -> Result<Zeroizing<String>, AppError> {
    let password = rpassword::prompt_password(prompt)?;
    Ok(Zeroizing::new(password))
}
