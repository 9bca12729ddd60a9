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

//! Transaction records.
//!
//! The transaction log is append-only: a [`Transaction`] is never edited or
//! removed once recorded, and every summary is derived from the log alone.
//!
//! - [`Buy`](TransactionKind::Buy): the bank issues chips to a player.
//! - [`Transfer`](TransactionKind::Transfer): chips move between two players.

use crate::base::TransactionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source recorded for every buy.
pub const BANK: &str = "bank";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Transfer,
}

impl TransactionKind {
    /// Parses the wire name. Matching is exact: `"Buy"` is not a kind.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "buy" => Some(Self::Buy),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Transfer => f.write_str("transfer"),
        }
    }
}

/// How the chips of a transaction were paid for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Cash,
    /// Recorded as a debt instead of settled in cash.
    Iou,
}

impl PaymentType {
    /// Strict parse used for transfers: anything but `cash`/`iou` is `None`.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "cash" => Some(Self::Cash),
            "iou" => Some(Self::Iou),
            _ => None,
        }
    }

    /// Lenient parse used for buys: absent or unknown values become cash.
    pub fn or_cash(raw: Option<&str>) -> Self {
        Self::parse(raw).unwrap_or(Self::Cash)
    }
}

/// One immutable entry of a session's transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Player name, or [`BANK`] for buys.
    pub from: String,
    pub to: String,
    /// Chip count, always positive.
    pub amount: u64,
    pub payment_type: PaymentType,
}

impl Transaction {
    /// Largest chip count a single transaction may carry. Keeps every
    /// per-session total and balance within range.
    pub const MAX_AMOUNT: u64 = u32::MAX as u64;

    pub fn buy(
        id: TransactionId,
        to: impl Into<String>,
        amount: u64,
        payment_type: PaymentType,
    ) -> Self {
        Self {
            id,
            kind: TransactionKind::Buy,
            from: BANK.to_string(),
            to: to.into(),
            amount,
            payment_type,
        }
    }

    pub fn transfer(
        id: TransactionId,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: u64,
        payment_type: PaymentType,
    ) -> Self {
        Self {
            id,
            kind: TransactionKind::Transfer,
            from: from.into(),
            to: to.into(),
            amount,
            payment_type,
        }
    }

    /// Only IOU transfers accrue debt between players.
    pub fn is_iou_transfer(&self) -> bool {
        self.kind == TransactionKind::Transfer && self.payment_type == PaymentType::Iou
    }
}
