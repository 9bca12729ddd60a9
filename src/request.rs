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

//! Inbound payloads, as callers send them.
//!
//! Every field is optional so that decoding never decides validity; the
//! session operations apply the validation rules and report
//! [`LedgerError`](crate::LedgerError)s.

use serde::{Deserialize, Serialize};

/// Player entry for session creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlayer {
    pub name: Option<String>,
    /// Chips the player starts with.
    pub extra: Option<ExtraChips>,
}

impl NewPlayer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: ExtraChips) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// Starting chips for a new player, bought from the bank or handed over by
/// another player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraChips {
    pub amount: Option<i64>,
    /// Blank or `bank` (any case) means a buy.
    pub from: Option<String>,
    pub payment_type: Option<String>,
}

impl ExtraChips {
    pub fn new(amount: i64) -> Self {
        Self {
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn from(mut self, source: impl Into<String>) -> Self {
        self.from = Some(source.into());
        self
    }

    pub fn paid_with(mut self, payment_type: impl Into<String>) -> Self {
        self.payment_type = Some(payment_type.into());
        self
    }
}

/// Request to append one transaction to a session's log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Option<i64>,
    pub payment_type: Option<String>,
}

impl TransactionRequest {
    pub fn buy(to: impl Into<String>, amount: i64) -> Self {
        Self {
            kind: Some("buy".to_string()),
            to: Some(to.into()),
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn transfer(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: i64,
        payment_type: impl Into<String>,
    ) -> Self {
        Self {
            kind: Some("transfer".to_string()),
            from: Some(from.into()),
            to: Some(to.into()),
            amount: Some(amount),
            payment_type: Some(payment_type.into()),
        }
    }

    pub fn paid_with(mut self, payment_type: impl Into<String>) -> Self {
        self.payment_type = Some(payment_type.into());
        self
    }
}
