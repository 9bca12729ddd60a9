// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use chip_ledger::{
    LedgerError, Session, SessionCode, SessionStore, TransactionKind, TransactionRequest, server,
};
use clap::{Parser, Subcommand};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Chip Ledger - Track chips and IOUs for a home game
///
/// Serves the game API, or replays a CSV transaction log offline.
#[derive(Parser, Debug)]
#[command(name = "chip-ledger")]
#[command(about = "Tracks chip balances and IOU settlements for home games", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "CHIP_LEDGER_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to bind (host:port)
        #[arg(long, env = "CHIP_LEDGER_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
    },
    /// Replay a CSV transaction log and print its summary as JSON
    ///
    /// Expected format: type,from,to,amount,paymentType
    Summarize {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.log_json);

    let result = match args.command {
        Command::Serve { bind } => run_server(bind).await,
        Command::Summarize { input } => summarize(&input),
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_server(bind: SocketAddr) -> Result<(), CliError> {
    let listener = TcpListener::bind(bind).await?;
    server::serve(listener, Arc::new(SessionStore::new())).await?;
    Ok(())
}

fn summarize(input: &Path) -> Result<(), CliError> {
    let file = File::open(input).map_err(|e| {
        io::Error::new(e.kind(), format!("cannot open '{}': {e}", input.display()))
    })?;
    let session = replay(BufReader::new(file))?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &session.summary())?;
    writeln!(stdout)?;
    Ok(())
}

/// Raw CSV record matching the input format.
///
/// Fields: `type, from, to, amount, paymentType`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    amount: Option<i64>,
    #[serde(default, rename = "paymentType")]
    payment_type: Option<String>,
}

impl From<CsvRecord> for TransactionRequest {
    fn from(record: CsvRecord) -> Self {
        TransactionRequest {
            kind: record.kind,
            from: record.from,
            to: record.to,
            amount: record.amount,
            payment_type: record.payment_type,
        }
    }
}

/// Rebuilds a session from a CSV transaction log.
///
/// Each row goes through the same validation as a live request; rejected
/// and malformed rows are skipped with a warning. Every player named by an
/// accepted row is seated in order of first appearance.
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the header is unreadable.
fn replay<R: Read>(reader: R) -> Result<Session, csv::Error> {
    let mut session = Session::new(SessionCode::new("REPLAY"));

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (row, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row, error = %e, "skipping malformed row");
                continue;
            }
        };

        let tx = match session.record(&record.into()) {
            Ok(tx) => tx.clone(),
            Err(e) => {
                warn!(row, error = %e, "skipping rejected row");
                continue;
            }
        };

        let from = (tx.kind == TransactionKind::Transfer).then_some(tx.from.as_str());
        for name in from.into_iter().chain([tx.to.as_str()]) {
            if session.players().iter().any(|p| p.name == name) {
                continue;
            }
            if let Err(LedgerError::DuplicatePlayer(name)) = session.add_player(Some(name)) {
                debug!(row, %name, "name differs from a seated player only by case");
            }
        }
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn replays_buys_and_transfers() {
        let csv = "type,from,to,amount,paymentType\n\
                   buy,,Bob,100,cash\n\
                   transfer,Bob,Alice,30,iou\n";

        let session = replay(Cursor::new(csv)).unwrap();
        let summary = session.summary();

        assert_eq!(summary.balance("Bob").unwrap().current_chips, 70);
        assert_eq!(summary.balance("Alice").unwrap().current_chips, 30);
        assert_eq!(summary.bank().chips_issued, 100);
        assert_eq!(summary.settlements().len(), 1);
    }

    #[test]
    fn seats_players_in_order_of_appearance() {
        let csv = "type,from,to,amount,paymentType\n\
                   buy,,Carol,10,cash\n\
                   transfer,Alice,Bob,5,cash\n";

        let session = replay(Cursor::new(csv)).unwrap();
        let names: Vec<&str> = session.players().iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["Carol", "Alice", "Bob"]);
    }

    #[test]
    fn handles_whitespace_and_short_rows() {
        let csv = "type,from,to,amount,paymentType\n buy , , Alice , 40 \n";

        let session = replay(Cursor::new(csv)).unwrap();
        let summary = session.summary();

        assert_eq!(summary.balance("Alice").unwrap().chips_purchased, 40);
        assert_eq!(summary.bank().cash_received, 40);
    }

    #[test]
    fn skips_rejected_and_malformed_rows() {
        let csv = "type,from,to,amount,paymentType\n\
                   buy,,Alice,50,cash\n\
                   transfer,,Alice,10,iou\n\
                   transfer,Alice,Bob,10,card\n\
                   refund,Alice,Bob,10,cash\n\
                   buy,,Bob,lots,cash\n\
                   buy,,Bob,20,iou\n";

        let session = replay(Cursor::new(csv)).unwrap();

        assert_eq!(session.transactions().len(), 2);
        assert_eq!(session.summary().bank().iou_amount, 20);
    }

    #[test]
    fn case_variants_are_not_seated_twice() {
        let csv = "type,from,to,amount,paymentType\n\
                   buy,,Alice,50,cash\n\
                   buy,,alice,5,cash\n";

        let session = replay(Cursor::new(csv)).unwrap();

        assert_eq!(session.players().len(), 1);
        assert_eq!(session.summary().balance("Alice").unwrap().chips_purchased, 50);
        assert_eq!(session.summary().bank().chips_issued, 55);
    }
}
