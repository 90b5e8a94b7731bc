//! CLI surface (spec §6): `run` starts the server, `register-db` adds a
//! database to a running configuration before `run` starts it, `query` runs
//! one literal SQL statement through the safety validator and executor
//! without going through the LLM (source: `manual` in the history log).
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dbgate", about = "Multi-database natural-language query gateway")]
pub struct Cli {
    /// Path to a configuration file (spec §6 settings table); format is
    /// inferred from its extension (`.json` for `register-db`'s output).
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server.
    Run,
    /// Register a database in the loaded configuration before starting it
    /// (a config-file convenience; the running server's admin registry is
    /// updated by restarting with the new entry present).
    RegisterDb {
        #[arg(long)]
        name: String,
        #[arg(long)]
        uri: String,
        #[arg(long, value_enum, default_value = "postgres")]
        dialect: DialectArg,
        #[arg(long, default_value_t = 1)]
        pool_min: u32,
        #[arg(long, default_value_t = 10)]
        pool_max: u32,
        #[arg(long, default_value_t = 30)]
        statement_timeout_s: u64,
        #[arg(long)]
        row_cap: Option<u32>,
    },
    /// Validate and execute one literal SQL statement against a registered
    /// database, bypassing SQL generation entirely.
    Query {
        #[arg(long)]
        db: String,
        #[arg(long)]
        sql: String,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum DialectArg {
    Postgres,
    Mysql,
}

impl From<DialectArg> for gateway_db_common::Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Postgres => gateway_db_common::Dialect::Postgres,
            DialectArg::Mysql => gateway_db_common::Dialect::Mysql,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn run_is_the_default_shape() {
        let cli = Cli::try_parse_from(["dbgate", "run"]).expect("parses");
        assert!(matches!(cli.command, Command::Run));
        assert_eq!(cli.config, None);
    }

    #[test]
    fn register_db_requires_name_and_uri() {
        let cli = Cli::try_parse_from([
            "dbgate",
            "register-db",
            "--name",
            "warehouse",
            "--uri",
            "postgres://localhost/warehouse",
            "--dialect",
            "postgres",
        ])
        .expect("parses");
        match cli.command {
            Command::RegisterDb {
                name,
                uri,
                pool_min,
                pool_max,
                ..
            } => {
                assert_eq!(name, "warehouse");
                assert_eq!(uri, "postgres://localhost/warehouse");
                assert_eq!(pool_min, 1);
                assert_eq!(pool_max, 10);
            }
            other => panic!("expected RegisterDb, got {other:?}"),
        }
    }

    #[test]
    fn register_db_without_uri_is_rejected() {
        let result = Cli::try_parse_from(["dbgate", "register-db", "--name", "warehouse"]);
        assert!(result.is_err());
    }

    #[test]
    fn query_captures_db_and_sql() {
        let cli = Cli::try_parse_from([
            "dbgate",
            "query",
            "--db",
            "warehouse",
            "--sql",
            "select 1",
        ])
        .expect("parses");
        match cli.command {
            Command::Query { db, sql } => {
                assert_eq!(db, "warehouse");
                assert_eq!(sql, "select 1");
            }
            other => panic!("expected Query, got {other:?}"),
        }
    }

    #[test]
    fn global_config_flag_applies_to_any_subcommand() {
        let cli = Cli::try_parse_from(["dbgate", "--config", "gateway.json", "run"])
            .expect("parses");
        assert_eq!(cli.config.as_deref(), Some("gateway.json"));
    }
}
