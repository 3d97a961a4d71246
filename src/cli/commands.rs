//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Datasource gateway CLI
#[derive(Parser, Debug)]
#[command(name = "datasource-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Gateway configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate the configuration file
    Validate,

    /// Test connectivity of a configured datasource
    Test {
        /// Datasource id
        #[arg(short, long)]
        datasource: String,
    },

    /// Fetch the structure of a configured datasource
    Structure {
        /// Datasource id
        #[arg(short, long)]
        datasource: String,

        /// Introspect even if a cached structure exists
        #[arg(long)]
        ignore_cache: bool,
    },

    /// List the mock dataset catalog
    Mocks,

    /// List configured datasources
    Datasources,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON (one document per line)
    Json,
    /// Indented JSON
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["datasource-gateway", "serve", "--config", "gw.yaml", "-p", "9000"]);
        assert_eq!(cli.config, Some(PathBuf::from("gw.yaml")));
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000) }));
    }

    #[test]
    fn test_parse_structure_flags() {
        let cli = Cli::parse_from([
            "datasource-gateway",
            "--verbose",
            "structure",
            "--datasource",
            "sheets",
            "--ignore-cache",
            "-c",
            "gw.yaml",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Structure {
                datasource,
                ignore_cache,
            } => {
                assert_eq!(datasource, "sheets");
                assert!(ignore_cache);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_datasources() {
        let cli = Cli::parse_from(["datasource-gateway", "datasources", "-c", "gw.yaml", "-f", "pretty"]);
        assert!(matches!(cli.command, Commands::Datasources));
        assert_eq!(cli.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_default_format() {
        let cli = Cli::parse_from(["datasource-gateway", "mocks"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.config.is_none());
    }
}
