use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::json;

use crate::{
    analytics::{self, Question},
    config::Config,
    db::{self, Table},
    ingest::ingest,
    models::ScoreKind,
};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Ingest {
        source: Option<PathBuf>,
        db: Option<PathBuf>,
    },
    Dump {
        table: Table,
    },
    Faq {
        question: Question,
        score: ScoreKind,
    },
}

/// Runs a subcommand when one is given; `Ok(false)` means serve HTTP instead.
pub fn maybe_run_from_cli(args: &[String], config: &Config) -> Result<bool> {
    let Some(command) = parse_command(args)? else {
        return Ok(false);
    };

    match command {
        Command::Ingest { source, db } => {
            let source = source.unwrap_or_else(|| config.source_csv.clone());
            let db_path = db.unwrap_or_else(|| config.db_path.clone());
            let report = ingest(&source, &db_path)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Dump { table } => {
            let conn = db::open_read_only(&config.db_path)?;
            let rows = db::query_rows(&conn, table.select_all_sql(), [])
                .with_context(|| format!("Failed dumping table {table:?}"))?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Faq { question, score } => {
            let conn = db::open_read_only(&config.db_path)?;
            let answer = analytics::answer(&conn, question, score)?;
            let result = json!({
                "question": question.slug(),
                "score": score.as_str(),
                "answer": answer,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(true)
}

fn parse_command(args: &[String]) -> Result<Option<Command>> {
    let Some(name) = args.get(1) else {
        return Ok(None);
    };

    let command = match name.as_str() {
        "ingest" => {
            let mut source = None;
            let mut db = None;
            let mut i = 2usize;
            while i < args.len() {
                let key = args[i].as_str();
                match (key, args.get(i + 1)) {
                    ("--source", Some(v)) => source = Some(PathBuf::from(v)),
                    ("--db", Some(v)) => db = Some(PathBuf::from(v)),
                    _ => bail!("Unknown or incomplete argument near `{}`", key),
                }
                i += 2;
            }
            Command::Ingest { source, db }
        }
        "dump" => {
            let raw = args.get(2).context("dump needs a table name")?;
            let table = Table::parse(raw).with_context(|| format!("Unknown table `{raw}`"))?;
            if args.len() > 3 {
                bail!("Unexpected argument `{}`", args[3]);
            }
            Command::Dump { table }
        }
        "faq" => {
            let raw = args.get(2).context("faq needs a question name")?;
            let question =
                Question::parse(raw).with_context(|| format!("Unknown question `{raw}`"))?;
            let mut score = ScoreKind::default();
            let mut i = 3usize;
            while i < args.len() {
                let key = args[i].as_str();
                match (key, args.get(i + 1)) {
                    ("--score", Some(v)) => {
                        score = ScoreKind::parse(v)
                            .with_context(|| format!("Unknown score `{v}`; use meta or user"))?;
                    }
                    _ => bail!("Unknown or incomplete argument near `{}`", key),
                }
                i += 2;
            }
            Command::Faq { question, score }
        }
        other => bail!("Unknown subcommand `{other}`; expected ingest, dump or faq"),
    };
    Ok(Some(command))
}
