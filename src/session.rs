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

//! Game session state.
//!
//! A [`Session`] owns one table's roster and its append-only transaction
//! log. Ids are handed out from per-session counters that only ever grow.
//! All mutation goes through [`Session::add_player`] and [`Session::record`],
//! which validate first and then append exactly one entry, so a rejected
//! request leaves the session untouched.

use crate::base::{PlayerId, SessionCode, TransactionId};
use crate::error::LedgerError;
use crate::ledger::{self, Summary};
use crate::request::{ExtraChips, NewPlayer, TransactionRequest};
use crate::transaction::{BANK, PaymentType, Transaction, TransactionKind};
use serde::{Deserialize, Serialize};

/// A seated player. Never renamed or removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    code: SessionCode,
    players: Vec<Player>,
    transactions: Vec<Transaction>,
    next_player_id: u32,
    next_transaction_id: u32,
}

/// Trimmed, non-empty text or `None`.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Positive chip count within [`Transaction::MAX_AMOUNT`].
fn chip_amount(raw: i64) -> Result<u64, LedgerError> {
    u64::try_from(raw)
        .ok()
        .filter(|amount| *amount <= Transaction::MAX_AMOUNT)
        .ok_or(LedgerError::InvalidAmount)
}

impl Session {
    /// Creates an empty session.
    pub fn new(code: SessionCode) -> Self {
        Self {
            code,
            players: Vec::new(),
            transactions: Vec::new(),
            next_player_id: 1,
            next_transaction_id: 1,
        }
    }

    /// Creates a session from the new-game player list.
    ///
    /// Entries without a name are skipped. Each named entry with a positive
    /// [`ExtraChips`] amount produces one opening transaction, after all
    /// players are seated.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EmptyRoster`] - `entries` is empty.
    /// - [`LedgerError::DuplicatePlayer`] - two entries share a name.
    /// - [`LedgerError::InvalidAmount`] - an extra exceeds [`Transaction::MAX_AMOUNT`].
    pub fn open(code: SessionCode, entries: &[NewPlayer]) -> Result<Self, LedgerError> {
        if entries.is_empty() {
            return Err(LedgerError::EmptyRoster);
        }

        let mut session = Self::new(code);
        for name in entries.iter().filter_map(|e| present(e.name.as_deref())) {
            session.seat(name)?;
        }

        for entry in entries {
            let (Some(name), Some(extra)) = (present(entry.name.as_deref()), &entry.extra) else {
                continue;
            };
            session.record_extra(name, extra)?;
        }

        Ok(session)
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Recomputes the ledger summary from the full log.
    pub fn summary(&self) -> Summary {
        ledger::summarize(&self.players, &self.transactions)
    }

    /// Seats a new player.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::MissingPlayerName`] - name is absent or blank.
    /// - [`LedgerError::DuplicatePlayer`] - name already seated (case-insensitive).
    pub fn add_player(&mut self, name: Option<&str>) -> Result<Player, LedgerError> {
        let name = present(name).ok_or(LedgerError::MissingPlayerName)?;
        self.seat(name)
    }

    /// Validates a request and appends it to the log.
    ///
    /// Buys are lenient: `from` is always replaced by the bank and an absent
    /// or unknown payment type becomes cash. Transfers are strict and need
    /// both `from` and a `cash`/`iou` payment type.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::MissingField`] - `type`, `to` or `amount` absent (zero counts as absent).
    /// - [`LedgerError::InvalidAmount`] - negative or above [`Transaction::MAX_AMOUNT`].
    /// - [`LedgerError::InvalidTransactionType`] - type is neither `buy` nor `transfer`.
    /// - [`LedgerError::MissingSource`] - transfer without `from`.
    /// - [`LedgerError::InvalidPaymentType`] - transfer without a valid payment type.
    pub fn record(&mut self, request: &TransactionRequest) -> Result<&Transaction, LedgerError> {
        present(request.kind.as_deref()).ok_or(LedgerError::MissingField("type"))?;
        let to = present(request.to.as_deref()).ok_or(LedgerError::MissingField("to"))?;
        let amount = match request.amount {
            None | Some(0) => return Err(LedgerError::MissingField("amount")),
            Some(amount) => chip_amount(amount)?,
        };

        // Type names are matched untrimmed: " buy " is not a type.
        let kind = request.kind.as_deref().unwrap_or_default();

        let kind = TransactionKind::parse(kind)
            .ok_or_else(|| LedgerError::InvalidTransactionType(kind.to_string()))?;

        let (from, payment_type) = match kind {
            TransactionKind::Buy => (BANK, PaymentType::or_cash(request.payment_type.as_deref())),
            TransactionKind::Transfer => {
                let from = present(request.from.as_deref()).ok_or(LedgerError::MissingSource)?;
                let payment_type = PaymentType::parse(request.payment_type.as_deref())
                    .ok_or(LedgerError::InvalidPaymentType)?;
                (from, payment_type)
            }
        };

        let id = self.next_transaction_id();
        let tx = match kind {
            TransactionKind::Buy => Transaction::buy(id, to, amount, payment_type),
            TransactionKind::Transfer => Transaction::transfer(id, from, to, amount, payment_type),
        };
        Ok(self.append(tx))
    }

    fn seat(&mut self, name: &str) -> Result<Player, LedgerError> {
        let taken = self
            .players
            .iter()
            .any(|p| p.name.to_lowercase() == name.to_lowercase());
        if taken {
            return Err(LedgerError::DuplicatePlayer(name.to_string()));
        }

        let player = Player::new(PlayerId(self.next_player_id), name);
        self.next_player_id += 1;
        self.players.push(player.clone());
        Ok(player)
    }

    /// Non-positive amounts are skipped and the payment type falls back to
    /// cash for both buys and transfers; only an oversized amount fails.
    fn record_extra(&mut self, name: &str, extra: &ExtraChips) -> Result<(), LedgerError> {
        let amount = match extra.amount {
            Some(amount) if amount > 0 => chip_amount(amount)?,
            _ => return Ok(()),
        };
        let payment_type = PaymentType::or_cash(extra.payment_type.as_deref());

        let id = self.next_transaction_id();
        let tx = match present(extra.from.as_deref()) {
            Some(source) if !source.eq_ignore_ascii_case(BANK) => {
                Transaction::transfer(id, source, name, amount, payment_type)
            }
            _ => Transaction::buy(id, name, amount, payment_type),
        };
        self.append(tx);
        Ok(())
    }

    fn next_transaction_id(&mut self) -> TransactionId {
        let id = TransactionId(self.next_transaction_id);
        self.next_transaction_id += 1;
        id
    }

    fn append(&mut self, tx: Transaction) -> &Transaction {
        self.transactions.push(tx);
        &self.transactions[self.transactions.len() - 1]
    }
}
