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

//! Session store.
//!
//! The [`SessionStore`] maps session codes to live sessions for the lifetime
//! of the process. It is an explicit object: build one at startup and hand
//! it to whatever serves requests.
//!
//! # Thread Safety
//!
//! Sessions live in a [`DashMap`], each behind its own [`Mutex`]. Requests
//! for different sessions proceed in parallel; requests for the same
//! session are serialized, which keeps the log append-only and its ids
//! sequential.

use crate::base::SessionCode;
use crate::error::LedgerError;
use crate::ledger::Summary;
use crate::request::{NewPlayer, TransactionRequest};
use crate::session::{Player, Session};
use crate::transaction::Transaction;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

/// Source of candidate session codes.
///
/// Candidates may collide; the store retries until it finds a free one.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> SessionCode;
}

/// Six random characters from `[0-9A-Z]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
    fn generate(&self) -> SessionCode {
        const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        let mut rng = rand::thread_rng();
        let code: String = (0..SessionCode::LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        SessionCode::new(code)
    }
}

/// Outcome of [`SessionStore::create_session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub game_code: SessionCode,
    pub players: Vec<Player>,
}

/// Process-lifetime registry of game sessions.
pub struct SessionStore {
    sessions: DashMap<SessionCode, Mutex<Session>>,
    codes: Box<dyn CodeGenerator>,
}

impl SessionStore {
    /// Creates an empty store issuing [`RandomCodes`].
    pub fn new() -> Self {
        Self::with_code_generator(RandomCodes)
    }

    pub fn with_code_generator(codes: impl CodeGenerator + 'static) -> Self {
        Self {
            sessions: DashMap::new(),
            codes: Box::new(codes),
        }
    }

    /// Opens a new session under a fresh code.
    ///
    /// # Errors
    ///
    /// See [`Session::open`]. Nothing is stored when creation fails.
    pub fn create_session(&self, entries: &[NewPlayer]) -> Result<SessionCreated, LedgerError> {
        loop {
            let code = self.codes.generate();

            // Entry API holds the shard lock, so check-and-insert is atomic.
            match self.sessions.entry(code.clone()) {
                Entry::Occupied(_) => {
                    debug!(code = %code, "session code collision, retrying");
                }
                Entry::Vacant(entry) => {
                    let session = Session::open(code.clone(), entries)?;
                    let players = session.players().to_vec();
                    info!(
                        code = %code,
                        players = players.len(),
                        opening_transactions = session.transactions().len(),
                        "session created"
                    );
                    entry.insert(Mutex::new(session));
                    return Ok(SessionCreated {
                        game_code: code,
                        players,
                    });
                }
            }
        }
    }

    /// Seats a player in an existing session.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SessionNotFound`] - unknown code.
    /// - See [`Session::add_player`].
    pub fn add_player(&self, code: &SessionCode, name: Option<&str>) -> Result<Player, LedgerError> {
        let player = self.with_session(code, |session| session.add_player(name))?;
        info!(code = %code, player = %player.id, name = %player.name, "player added");
        Ok(player)
    }

    /// Appends one transaction to a session's log and returns it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::SessionNotFound`] - unknown code.
    /// - See [`Session::record`].
    pub fn record_transaction(
        &self,
        code: &SessionCode,
        request: &TransactionRequest,
    ) -> Result<Transaction, LedgerError> {
        let tx = self.with_session(code, |session| session.record(request).cloned())?;
        info!(
            code = %code,
            tx = %tx.id,
            kind = %tx.kind,
            amount = tx.amount,
            "transaction recorded"
        );
        Ok(tx)
    }

    /// Computes the current summary of a session.
    pub fn summary(&self, code: &SessionCode) -> Result<Summary, LedgerError> {
        self.with_session(code, |session| Ok(session.summary()))
    }

    /// Snapshot of a session's roster.
    pub fn players(&self, code: &SessionCode) -> Result<Vec<Player>, LedgerError> {
        self.with_session(code, |session| Ok(session.players().to_vec()))
    }

    /// Snapshot of a session's transaction log, oldest first.
    pub fn transactions(&self, code: &SessionCode) -> Result<Vec<Transaction>, LedgerError> {
        self.with_session(code, |session| Ok(session.transactions().to_vec()))
    }

    pub fn contains(&self, code: &SessionCode) -> bool {
        self.sessions.contains_key(code)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn with_session<T>(
        &self,
        code: &SessionCode,
        f: impl FnOnce(&mut Session) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let entry = self
            .sessions
            .get(code)
            .ok_or_else(|| LedgerError::SessionNotFound(code.clone()))?;
        let mut session = entry.lock();
        f(&mut session)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
