//! Definición de argumentos (clap derive).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "forma")]
#[command(author, version, about = "Dynamic schema to table mapping engine", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Postgres connection URL
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Run against the in-memory backend (nothing is persisted; wins over --database-url)
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the table of a registered schema or add its missing columns
    RegisterOrSync {
        schema: String,
    },

    /// Synchronize every registered schema
    SyncAll,

    /// Create the table only if it does not exist yet
    CreateTable {
        schema: String,
    },

    /// Print the CSV header row built from the schema fields
    ExportFieldsCsv {
        schema: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a `{schema, fields}` JSON document
    ImportSchema {
        file: PathBuf,
        /// Replace the field set instead of merging by name
        #[arg(long)]
        replace: bool,
    },

    /// Export a schema as a `{schema, fields}` JSON document
    ExportSchema {
        schema: String,
    },

    /// Import records from a JSON array (or a single object)
    ImportRecords {
        schema: String,
        file: PathBuf,
    },

    /// Export the stored records as JSON
    ExportRecords {
        schema: String,
    },

    /// Register the evaluation and decision schemas and create their tables
    RegisterRecognition,

    /// Run the evaluation/decision pipeline for one submission
    Recognize {
        /// Submitted value as name=value (can be specified multiple times)
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Show the sync state of a schema's table
    Status {
        schema: String,
    },

    /// Check that an 8-bit mask covers every bit set in the target
    EvaluateMask {
        target: String,
        mask: String,
    },
}

/// Parsea `nombre=valor`; el valor puede estar vacío.
pub fn parse_field(s: &str) -> Result<(String, String), String> {
    let (name, value) = s.split_once('=')
                         .ok_or_else(|| format!("invalid field '{s}': expected name=value"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid field '{s}': empty name"));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_field_splits_on_first_equals() {
        assert_eq!(parse_field("alert=a=b").unwrap(), ("alert".into(), "a=b".into()));
        assert_eq!(parse_field("week=").unwrap(), ("week".into(), String::new()));
        assert!(parse_field("week").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn recognize_collects_repeated_fields() {
        let cli = Cli::try_parse_from(["forma", "--memory", "recognize", "--field", "alert=A1", "-f", "week=Mon"]).unwrap();
        assert!(cli.memory);
        match cli.command {
            Command::Recognize { fields } => assert_eq!(fields.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn evaluate_mask_takes_positional_target_and_mask() {
        let cli = Cli::try_parse_from(["forma", "evaluate-mask", "10000000", "11000000"]).unwrap();
        assert!(!cli.memory);
        match cli.command {
            Command::EvaluateMask { target, mask } => assert_eq!((target.as_str(), mask.as_str()), ("10000000", "11000000")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
