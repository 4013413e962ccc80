//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_run_defaults() {
    match parse(&["bulkpost", "run", "items.jsonl"]) {
        CliCommand::Run {
            input,
            endpoint,
            concurrency,
            workers,
            chunk_size,
            max_retries,
            no_persist,
        } => {
            assert_eq!(input.to_str(), Some("items.jsonl"));
            assert!(endpoint.is_none());
            assert!(concurrency.is_none());
            assert!(workers.is_none());
            assert!(chunk_size.is_none());
            assert!(max_retries.is_none());
            assert!(!no_persist);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_overrides() {
    match parse(&[
        "bulkpost",
        "run",
        "in.jsonl",
        "--endpoint",
        "https://api.example.com/v1/data",
        "--concurrency",
        "50",
        "--workers",
        "8",
        "--chunk-size",
        "200",
        "--max-retries",
        "5",
        "--no-persist",
    ]) {
        CliCommand::Run {
            endpoint,
            concurrency,
            workers,
            chunk_size,
            max_retries,
            no_persist,
            ..
        } => {
            assert_eq!(endpoint.as_deref(), Some("https://api.example.com/v1/data"));
            assert_eq!(concurrency, Some(50));
            assert_eq!(workers, Some(8));
            assert_eq!(chunk_size, Some(200));
            assert_eq!(max_retries, Some(5));
            assert!(no_persist);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_requires_input() {
    assert!(Cli::try_parse_from(["bulkpost", "run"]).is_err());
}

#[test]
fn cli_parse_run_rejects_non_numeric_concurrency() {
    assert!(Cli::try_parse_from(["bulkpost", "run", "x", "--concurrency", "many"]).is_err());
}

#[test]
fn cli_parse_results() {
    match parse(&["bulkpost", "results"]) {
        CliCommand::Results { failed } => assert!(!failed),
        _ => panic!("expected Results"),
    }
    match parse(&["bulkpost", "results", "--failed"]) {
        CliCommand::Results { failed } => assert!(failed),
        _ => panic!("expected Results"),
    }
}

#[test]
fn cli_parse_config() {
    match parse(&["bulkpost", "config"]) {
        CliCommand::Config => {}
        _ => panic!("expected Config"),
    }
}
