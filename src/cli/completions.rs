//! `autobuild completions <shell>`
//!
//! The script is generated from the same clap definition the binary parses
//! with, so new flags and their environment bindings show up automatically.

use anyhow::{Context, Result};
use clap_complete::Shell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes the completion script for `shell` to `output`, or stdout
pub fn write_completions(shell: Shell, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            render(shell, BufWriter::new(file))
                .with_context(|| format!("Failed to write completions to {}", path.display()))?;
            tracing::info!(shell = %shell, file = %path.display(), "Wrote completions");
        }
        None => render(shell, io::stdout().lock()).context("Failed to write completions")?,
    }
    Ok(())
}

fn render(shell: Shell, mut out: impl Write) -> io::Result<()> {
    clap_complete::generate(shell, &mut super::build_cli(), "autobuild", &mut out);
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn rendered(shell: Shell) -> String {
        let mut buf = Vec::new();
        render(shell, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_bash_script_lists_run_flags() {
        let script = rendered(Shell::Bash);
        assert!(script.contains("autobuild"));
        assert!(script.contains("--dry-run"));
        assert!(script.contains("--ignore-failures"));
    }

    #[test]
    fn test_zsh_script_lists_subcommands() {
        let script = rendered(Shell::Zsh);
        assert!(script.contains("shell"));
        assert!(script.contains("completions"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("autobuild.fish");

        write_completions(Shell::Fish, Some(&path)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), rendered(Shell::Fish));
    }

    #[test]
    fn test_unwritable_output_is_an_error() {
        let err = write_completions(Shell::Bash, Some(Path::new("/nonexistent/dir/autobuild")))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dir/autobuild"));
    }
}
