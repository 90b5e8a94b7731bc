//! Entry point for the `dbgate` binary: parses the CLI (spec §6), loads
//! settings, and dispatches to the HTTP server or a one-shot admin/query
//! command. Exit codes follow spec §6: 0 success, 1 configuration error,
//! 2 transient failure, 3 safety-refused.
#[macro_use]
extern crate slog_scope;

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use gateway_server::cli::{Cli, Command};
use gateway_server::{bootstrap::Runtime, build_app, logging, state::AppState};
use gateway_settings::{DatabaseSettings, Settings};

#[actix_web::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::with_env_and_config_file(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(1);
        }
    };

    logging::init_logging(matches!(
        settings.observability.log_format,
        gateway_settings::LogFormat::Json
    ));

    let exit = match cli.command {
        Command::Run => run_server(settings).await,
        Command::RegisterDb {
            name,
            uri,
            dialect,
            pool_min,
            pool_max,
            statement_timeout_s,
            row_cap,
        } => register_db(
            cli.config.as_deref(),
            DatabaseSettings {
                name,
                dialect: dialect.into(),
                uri,
                pool_min,
                pool_max,
                statement_timeout_s,
                row_cap,
            },
        ),
        Command::Query { db, sql } => run_one_shot_query(settings, db, sql).await,
    };

    logging::reset_logging();
    exit
}

async fn run_server(settings: Settings) -> ExitCode {
    let banner = settings.banner();
    let host = settings.host.clone();
    let port = settings.port;

    let runtime = match Runtime::build(&settings).await {
        Ok(r) => r,
        Err(e) => {
            error!("failed to initialize server"; "error" => %e);
            return ExitCode::from(1);
        }
    };
    let state = actix_web::web::Data::new(runtime.state.clone());

    info!("server starting"; "banner" => &banner);
    let server = match actix_web::HttpServer::new(move || build_app!(state.clone()))
        .bind((host.as_str(), port))
    {
        Ok(s) => s.run(),
        Err(e) => {
            error!("failed to bind listener"; "error" => %e);
            return ExitCode::from(1);
        }
    };

    let handle = server.handle();
    let shutdown_signal = tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        handle.stop(true).await;
    });

    let result = server.await;
    shutdown_signal.abort();
    runtime.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server exited with error"; "error" => %e);
            ExitCode::from(2)
        }
    }
}

/// Upserts `descriptor` into the JSON config file at `path` (default
/// `gateway.json`), so the next `run` picks it up. Separate from the HTTP
/// surface's `list_databases`/`refresh_schema`: this mutates the
/// configuration a server will load, not a running server's live registry
/// (spec §3 "created at configuration load or by an administrative
/// register operation").
fn register_db(path: Option<&str>, descriptor: DatabaseSettings) -> ExitCode {
    let path = path.unwrap_or("gateway.json");
    let mut settings = match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("configuration error: could not parse {path}: {e}");
                return ExitCode::from(1);
            }
        },
        Err(_) => Settings::default(),
    };

    settings.databases.retain(|d| d.name != descriptor.name);
    settings.databases.push(descriptor.clone());

    if let Err(e) = settings.validate() {
        eprintln!("configuration error: {e}");
        return ExitCode::from(1);
    }

    let rendered = match serde_json::to_string_pretty(&settings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("configuration error: could not render settings: {e}");
            return ExitCode::from(1);
        }
    };
    if let Err(e) = std::fs::write(path, rendered) {
        eprintln!("configuration error: could not write {path}: {e}");
        return ExitCode::from(1);
    }

    println!(
        "registered database {:?} in {path} ({} total)",
        descriptor.name,
        settings.databases.len()
    );
    ExitCode::SUCCESS
}

/// Runs one literal SQL statement through the safety validator and
/// executor, bypassing SQL generation (spec §6 `query --db --sql`).
/// Recorded in the history log with `source: manual`.
async fn run_one_shot_query(settings: Settings, db: String, sql: String) -> ExitCode {
    let runtime = match Runtime::build(&settings).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(1);
        }
    };
    let state: AppState = runtime.state.clone();

    let descriptor = match state.registry.descriptor(&db).await {
        Ok(d) => d,
        Err(e) => {
            eprintln!("unknown_db: {e}");
            runtime.shutdown().await;
            return ExitCode::from(1);
        }
    };

    let effective_row_cap = descriptor.effective_row_cap(settings.security.max_rows);
    let policy = gateway_sql_safety::SafetyPolicy::new(
        settings.security.allow_explain,
        settings.security.blocked_functions.clone(),
        settings.security.allowed_relations.clone(),
        effective_row_cap,
    );

    let exit = match gateway_sql_safety::validate(&sql, descriptor.dialect, &policy) {
        Ok(validated) => {
            let executor = gateway_executor::Executor::new(state.registry.clone());
            let deadline = Instant::now() + descriptor.statement_timeout + Duration::from_secs(5);
            match executor
                .execute(&db, &validated, deadline, descriptor.statement_timeout, effective_row_cap)
                .await
            {
                Ok(result) => {
                    println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
                    record_history(&state, &db, &sql, Some(&result), true, None).await;
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("db_error: {e}");
                    record_history(&state, &db, &sql, None, false, Some("db_error")).await;
                    ExitCode::from(2)
                }
            }
        }
        Err(e) => {
            eprintln!("unsafe_sql: {e}");
            record_history(&state, &db, &sql, None, false, Some("unsafe_sql")).await;
            ExitCode::from(3)
        }
    };

    runtime.shutdown().await;
    exit
}

async fn record_history(
    state: &AppState,
    db: &str,
    sql: &str,
    result: Option<&gateway_db_common::QueryResult>,
    success: bool,
    error_kind: Option<&str>,
) {
    let Some(history) = &state.history else {
        return;
    };
    let record = gateway_history::HistoryRecord::new(
        uuid::Uuid::new_v4().to_string(),
        db,
        sql,
        result.map(|r| r.row_count),
        result.map(|r| r.execution_ms),
        success,
        error_kind.map(str::to_owned),
        gateway_history::Source::Manual,
    );
    if let Err(e) = history.append(&record).await {
        warn!("failed to append history record"; "error" => %e);
    }
}
