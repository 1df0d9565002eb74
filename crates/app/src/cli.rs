//! Command line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Inspect and manage scoped dashboard variables.
#[derive(Debug, Parser)]
#[command(name = "varscope", version, about)]
pub struct Cli {
    /// Configuration file. Defaults to `varscope.*` in the working directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Relative time range to evaluate queries over (e.g. `6h`).
    #[arg(long, global = true)]
    pub time_range: Option<String>,

    /// Shared link whose query parameters seed the time range and the
    /// selected values.
    #[arg(long, global = true)]
    pub link: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Serialization used for command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the variables visible to a project, project definitions first.
    Explore {
        /// Project to explore. `none` shows global variables only.
        project: Option<String>,

        /// Also evaluate the options of every variable.
        #[arg(long)]
        values: bool,
    },

    /// Print one variable and a preview of its options.
    Show {
        /// Variable name.
        name: String,
        /// Owning project. Omit for a global variable.
        project: Option<String>,
    },

    /// Set the query of a variable, creating a text variable if needed.
    Set {
        /// Variable name.
        name: String,
        /// New query (the value, for text variables).
        query: String,
        /// Owning project. Omit for a global variable.
        project: Option<String>,
    },

    /// Delete a variable.
    Delete {
        /// Variable name.
        name: String,
        /// Owning project. Omit for a global variable.
        project: Option<String>,

        /// Confirm the deletion. Without it nothing is removed.
        #[arg(long)]
        yes: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "varscope",
            "explore",
            "infra",
            "--values",
            "--format",
            "yaml",
            "--time-range",
            "6h",
        ]);

        assert_eq!(cli.format, OutputFormat::Yaml);
        assert_eq!(cli.time_range.as_deref(), Some("6h"));
        match cli.command {
            Command::Explore { project, values } => {
                assert_eq!(project.as_deref(), Some("infra"));
                assert!(values);
            }
            other => panic!("Expected explore, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_requires_name() {
        assert!(Cli::try_parse_from(["varscope", "delete"]).is_err());
    }
}
