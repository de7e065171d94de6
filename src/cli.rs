//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Download files into a media library folder.
///
/// URLs on the command line replace the configured list. URLs on the gated
/// host are fetched with a logged-in session.
#[derive(Parser, Debug)]
#[command(name = "url-importer")]
#[command(author, version, about)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub import: ImportArgs,
}

/// Options for a batch run.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ImportArgs {
    /// Destination folder (overrides the configured one)
    #[arg(short, long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Replace files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Do not notify the media library after the batch
    #[arg(long)]
    pub no_scan: bool,

    /// URLs to download (replace the configured list)
    pub urls: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the gated-site session
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Log in through the login form and save the session cookies
    Login,
    /// Delete the saved session cookies
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (secrets redacted)
    Show,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["url-importer"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.command.is_none());
        assert!(args.import.urls.is_empty());
        assert!(!args.import.overwrite);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["url-importer", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["url-importer", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_positional_urls_and_flags() {
        let args = Args::try_parse_from([
            "url-importer",
            "--dest",
            "/media/inbox",
            "--overwrite",
            "--no-scan",
            "https://a.example/1.mkv",
            "https://a.example/2.mkv",
        ])
        .unwrap();
        assert_eq!(args.import.dest, Some(PathBuf::from("/media/inbox")));
        assert!(args.import.overwrite);
        assert!(args.import.no_scan);
        assert_eq!(args.import.urls.len(), 2);
    }

    #[test]
    fn test_cli_auth_subcommands() {
        let args = Args::try_parse_from(["url-importer", "auth", "login"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Command::Auth {
                command: AuthCommand::Login
            })
        ));

        let args = Args::try_parse_from(["url-importer", "-q", "auth", "clear"]).unwrap();
        assert!(args.quiet);
        assert!(matches!(
            args.command,
            Some(Command::Auth {
                command: AuthCommand::Clear
            })
        ));
    }

    #[test]
    fn test_cli_config_show_accepts_global_config_path() {
        let args =
            Args::try_parse_from(["url-importer", "config", "show", "--config", "/tmp/c.json"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.json")));
        assert!(matches!(
            args.command,
            Some(Command::Config {
                command: ConfigCommand::Show
            })
        ));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["url-importer", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["url-importer", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
