//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Planera CLI - declarative MySQL schema synchronization
#[derive(Parser, Debug)]
#[command(name = "planera")]
#[command(version)]
#[command(about = "Declarative MySQL schema synchronization and migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// MySQL connection URL
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Path to the declarative schema file
    #[arg(long, default_value = "schema.toml", global = true)]
    pub schema: PathBuf,

    /// Path of the plan artifact
    #[arg(long, default_value = "out/plan.sql", global = true)]
    pub plan_file: PathBuf,

    /// Directory holding migration scripts
    #[arg(long, default_value = "migrations", global = true)]
    pub migrations_dir: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare the declared schema to the database and write the plan
    Plan,

    /// Execute the current plan, then run pending migrations
    Apply,

    /// Manage one-off migration scripts
    Migrate(MigrateArgs),
}

/// Arguments for the `migrate` command
#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Scaffold a new migration script with this name
    #[arg(long, value_name = "NAME")]
    pub generate: Option<String>,

    /// Revert the last N applied migrations (default 1)
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "1")]
    pub revert: Option<usize>,

    /// Accept an edited script by replacing its recorded checksum
    #[arg(long, value_name = "NAME")]
    pub overwrite: Vec<String>,

    /// Replace every drifted checksum without asking
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["planera", "plan"]);
        assert_eq!(cli.schema, PathBuf::from("schema.toml"));
        assert_eq!(cli.plan_file, PathBuf::from("out/plan.sql"));
        assert_eq!(cli.migrations_dir, PathBuf::from("migrations"));
        assert!(matches!(cli.command, Command::Plan));
    }

    #[test]
    fn test_migrate_revert_defaults_to_one() {
        let cli = Cli::parse_from(["planera", "migrate", "--revert"]);
        match cli.command {
            Command::Migrate(args) => assert_eq!(args.revert, Some(1)),
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_migrate_revert_takes_count() {
        let cli = Cli::parse_from(["planera", "migrate", "--revert", "3"]);
        match cli.command {
            Command::Migrate(args) => assert_eq!(args.revert, Some(3)),
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_migrate_overwrite_repeats() {
        let cli = Cli::parse_from([
            "planera",
            "migrate",
            "--overwrite",
            "a",
            "--overwrite",
            "b",
        ]);
        match cli.command {
            Command::Migrate(args) => {
                assert_eq!(args.overwrite, vec!["a".to_string(), "b".to_string()])
            }
            _ => panic!("expected migrate"),
        }
    }
}
