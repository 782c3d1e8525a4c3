//! CLI smoke entry point.
//!
//! # Responsibility
//! - Bootstrap a store with sample data from `TODO_*` configuration.
//! - Run one boundary operation and print the JSON result.
//!
//! Usage: `todo_cli [list | get <id> | complete <id> | delete <id> | search <text...>]`

use std::process::ExitCode;
use std::sync::Arc;
use todo_core::{
    init_logging_from_config, SearchRequest, SqliteSearchIndex, TodoConfig, TodoId, TodoService,
    TodoStore,
};

fn main() -> ExitCode {
    match run(std::env::args().skip(1).collect()) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("todo_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<String, String> {
    let config = TodoConfig::from_env()
        .map_err(|err| err.to_string())?
        .with_sample_data(true);
    init_logging_from_config(&config).map_err(|err| err.to_string())?;

    let index = SqliteSearchIndex::from_config(&config).map_err(|err| err.to_string())?;
    let service = TodoService::new(Arc::new(TodoStore::bootstrap(&config, index)));
    log::info!("event=cli_run module=cli status=start args={}", args.len());

    let (command, rest) = match args.split_first() {
        Some((command, rest)) => (command.as_str(), rest),
        None => ("list", &args[..]),
    };

    let value = match command {
        "list" => serde_json::to_value(service.list()),
        "get" => serde_json::to_value(service.get(parse_id(rest)?)),
        "complete" => serde_json::to_value(service.complete(parse_id(rest)?)),
        "delete" => serde_json::to_value(service.delete(parse_id(rest)?)),
        "search" => serde_json::to_value(service.search(&SearchRequest {
            query: rest.join(" "),
        })),
        other => return Err(format!("unknown command `{other}`")),
    }
    .map_err(|err| err.to_string())?;

    serde_json::to_string_pretty(&value).map_err(|err| err.to_string())
}

fn parse_id(args: &[String]) -> Result<TodoId, String> {
    let raw = args.first().ok_or("missing todo id")?;
    raw.parse::<TodoId>()
        .map_err(|_| format!("invalid todo id `{raw}`"))
}
