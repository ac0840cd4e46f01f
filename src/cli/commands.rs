//! CLI command definitions using clap.
//!
//! - encode: JSON document to wire text
//! - decode: wire text to pretty JSON
//! - apply: decode a wire-format patch and apply it

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repairloop - wire codec and safe patch application for automated repair loops
#[derive(Parser, Debug)]
#[command(name = "repairloop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode a JSON document as wire text
    Encode {
        /// JSON file to read (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// Decode wire text into pretty-printed JSON
    Decode {
        /// Wire-format file to read (stdin when omitted)
        input: Option<PathBuf>,
    },

    /// Apply a wire-format patch to the file it names
    Apply {
        /// Wire-format patch file ("-" for stdin)
        patch: PathBuf,

        /// Skip the backup copy
        #[arg(long)]
        no_backup: bool,

        /// Fail instead of replacing the declared lines when the old text is not found
        #[arg(long)]
        strict: bool,

        /// Directory to resolve relative patch paths against (repeatable, searched in order)
        #[arg(short = 'b', long = "base-dir")]
        base_dirs: Vec<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["repairloop"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["repairloop", "-v", "decode"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["repairloop", "decode", "-c", "/path/to/repairloop.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/repairloop.yml")));
    }

    #[test]
    fn test_encode_stdin() {
        let cli = Cli::try_parse_from(["repairloop", "encode"]).unwrap();
        assert!(matches!(cli.command, Commands::Encode { input: None }));
    }

    #[test]
    fn test_decode_file() {
        let cli = Cli::try_parse_from(["repairloop", "decode", "context.toon"]).unwrap();
        match cli.command {
            Commands::Decode { input } => assert_eq!(input, Some(PathBuf::from("context.toon"))),
            _ => panic!("Expected decode command"),
        }
    }

    #[test]
    fn test_apply_defaults() {
        let cli = Cli::try_parse_from(["repairloop", "apply", "patch.toon"]).unwrap();
        match cli.command {
            Commands::Apply {
                patch,
                no_backup,
                strict,
                base_dirs,
            } => {
                assert_eq!(patch, PathBuf::from("patch.toon"));
                assert!(!no_backup);
                assert!(!strict);
                assert!(base_dirs.is_empty());
            }
            _ => panic!("Expected apply command"),
        }
    }

    #[test]
    fn test_apply_options() {
        let cli = Cli::try_parse_from([
            "repairloop",
            "apply",
            "patch.toon",
            "--no-backup",
            "--strict",
            "--base-dir",
            "src",
            "-b",
            "tests",
        ])
        .unwrap();
        match cli.command {
            Commands::Apply {
                no_backup,
                strict,
                base_dirs,
                ..
            } => {
                assert!(no_backup);
                assert!(strict);
                assert_eq!(base_dirs, vec![PathBuf::from("src"), PathBuf::from("tests")]);
            }
            _ => panic!("Expected apply command"),
        }
    }

    #[test]
    fn test_apply_requires_patch() {
        assert!(Cli::try_parse_from(["repairloop", "apply"]).is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
