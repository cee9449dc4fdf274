use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tsstr")]
#[command(version = "0.1.0")]
#[command(about = "Inspect and round-trip formatted strings stored as Str/AStr XML")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Config file to use instead of the default search path
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Writing system to register before decoding (repeatable)
    #[arg(long = "ws", global = true)]
    pub writing_systems: Vec<String>,

    /// Write XML on a single line
    #[arg(long, global = true)]
    pub no_indent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Decode a file and write it back out as XML
    Roundtrip { file: PathBuf },
    /// List the runs of a string and their properties
    Dump {
        file: PathBuf,
        /// Print JSON instead of one line per run
        #[arg(long)]
        json: bool,
    },
    /// Print only the plain text
    Plain { file: PathBuf },
}

impl CliCommand {
    pub fn file(&self) -> &PathBuf {
        match self {
            CliCommand::Roundtrip { file }
            | CliCommand::Dump { file, .. }
            | CliCommand::Plain { file } => file,
        }
    }
}

pub fn parse_args() -> Result<CliArgs, Box<dyn std::error::Error>> {
    Ok(CliArgs::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let args = CliArgs::parse_from(["tsstr", "roundtrip", "a.xml"]);
        assert_eq!(
            args.command,
            CliCommand::Roundtrip {
                file: PathBuf::from("a.xml")
            }
        );
        assert!(args.config.is_none());
        assert!(!args.no_indent);
        assert!(args.writing_systems.is_empty());
    }

    #[test]
    fn test_parse_dump_with_options() {
        let args = CliArgs::parse_from([
            "tsstr", "dump", "b.xml", "--json", "--ws", "en", "--ws", "fr", "--no-indent",
        ]);
        assert_eq!(args.command.file(), &PathBuf::from("b.xml"));
        assert!(matches!(args.command, CliCommand::Dump { json: true, .. }));
        assert_eq!(args.writing_systems, vec!["en", "fr"]);
        assert!(args.no_indent);
    }

    #[test]
    fn test_parse_config() {
        let args = CliArgs::parse_from(["tsstr", "--config", "/tmp/c.toml", "plain", "c.xml"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(args.command, CliCommand::Plain { .. }));
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(CliArgs::try_parse_from(["tsstr"]).is_err());
    }
}
