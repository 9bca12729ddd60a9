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

//! Ledger engine.
//!
//! [`summarize`] derives everything a table needs to know from a session's
//! roster and transaction log: chip balances per player, what the bank has
//! issued, and who owes whom.
//!
//! The computation is a pure function of its inputs and is rerun in full on
//! every request; nothing is cached between calls.
//!
//! # Settlement
//!
//! Only IOU transfers create debt. For every ordered pair of distinct
//! players `(A, B)` the engine compares what A handed B on credit against
//! what B handed A, and emits `A -> B` for the positive difference. Each
//! unordered pair therefore yields at most one settlement. There is no
//! debt-minimization across more than two players.
//!
//! # Example
//!
//! ```
//! use chip_ledger::{Player, PlayerId, PaymentType, Transaction, TransactionId, ledger};
//!
//! let players = vec![
//!     Player::new(PlayerId(1), "Alice"),
//!     Player::new(PlayerId(2), "Bob"),
//! ];
//! let log = vec![
//!     Transaction::buy(TransactionId(1), "Bob", 100, PaymentType::Cash),
//!     Transaction::transfer(TransactionId(2), "Bob", "Alice", 30, PaymentType::Iou),
//! ];
//!
//! let summary = ledger::summarize(&players, &log);
//! assert_eq!(summary.balance("Bob").unwrap().current_chips, 70);
//! assert_eq!(summary.bank().chips_issued, 100);
//! assert_eq!(summary.settlements()[0].amount, 30);
//! ```

use crate::session::Player;
use crate::transaction::{PaymentType, Transaction, TransactionKind};
use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};
use std::collections::HashMap;

/// Chip flow for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBalance {
    pub chips_purchased: u64,
    pub chips_received: u64,
    pub chips_given: u64,
    /// `purchased + received - given`; negative when a player handed over
    /// more chips than they held.
    pub current_chips: i64,
}

/// Aggregate of all buys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSummary {
    pub chips_issued: u64,
    pub cash_received: u64,
    pub iou_amount: u64,
}

/// Net debt: `from` owes `to` the given number of chips.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Settlement {
    pub from: String,
    pub to: String,
    pub amount: u64,
}

/// Result of [`summarize`].
///
/// Balances keep roster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    balances: Vec<(String, PlayerBalance)>,
    bank: BankSummary,
    settlements: Vec<Settlement>,
}

impl Summary {
    pub fn balance(&self, name: &str) -> Option<&PlayerBalance> {
        self.balances
            .iter()
            .find(|(player, _)| player == name)
            .map(|(_, balance)| balance)
    }

    pub fn balances(&self) -> impl Iterator<Item = (&str, &PlayerBalance)> {
        self.balances
            .iter()
            .map(|(name, balance)| (name.as_str(), balance))
    }

    pub fn bank(&self) -> &BankSummary {
        &self.bank
    }

    pub fn settlements(&self) -> &[Settlement] {
        &self.settlements
    }
}

/// Serializes balances as a JSON object keyed by player name.
struct BalanceMap<'a>(&'a [(String, PlayerBalance)]);

impl Serialize for BalanceMap<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, balance) in self.0 {
            map.serialize_entry(name, balance)?;
        }
        map.end()
    }
}

impl Serialize for Summary {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Summary", 3)?;
        state.serialize_field("summary", &BalanceMap(&self.balances))?;
        state.serialize_field("settlements", &self.settlements)?;
        state.serialize_field("bankSummary", &self.bank)?;
        state.end()
    }
}

/// Computes balances, bank totals and pairwise settlements.
///
/// Every roster player gets an entry, even without transactions. Names in
/// the log that match no player still count toward the bank totals but are
/// otherwise ignored.
pub fn summarize(players: &[Player], transactions: &[Transaction]) -> Summary {
    let index: HashMap<&str, usize> = players
        .iter()
        .enumerate()
        .map(|(i, player)| (player.name.as_str(), i))
        .collect();
    let seat = |name: &str| index.get(name).copied();

    let mut balances = vec![PlayerBalance::default(); players.len()];
    let mut bank = BankSummary::default();
    // (debtor, creditor) -> chips handed over on credit
    let mut ious: HashMap<(usize, usize), u64> = HashMap::new();

    for tx in transactions {
        match tx.kind {
            TransactionKind::Buy => {
                if let Some(to) = seat(&tx.to) {
                    balances[to].chips_purchased += tx.amount;
                }
                bank.chips_issued += tx.amount;
                match tx.payment_type {
                    PaymentType::Cash => bank.cash_received += tx.amount,
                    PaymentType::Iou => bank.iou_amount += tx.amount,
                }
            }
            TransactionKind::Transfer => {
                let from = seat(&tx.from);
                let to = seat(&tx.to);
                if let Some(from) = from {
                    balances[from].chips_given += tx.amount;
                }
                if let Some(to) = to {
                    balances[to].chips_received += tx.amount;
                }
                if let (Some(from), Some(to), PaymentType::Iou) = (from, to, tx.payment_type) {
                    *ious.entry((from, to)).or_default() += tx.amount;
                }
            }
        }
    }

    for balance in &mut balances {
        let held = i128::from(balance.chips_purchased) + i128::from(balance.chips_received)
            - i128::from(balance.chips_given);
        balance.current_chips = held.clamp(i64::MIN.into(), i64::MAX.into()) as i64;
    }

    let owed = |a: usize, b: usize| ious.get(&(a, b)).copied().unwrap_or(0);
    let mut settlements = Vec::new();
    for a in 0..players.len() {
        for b in 0..players.len() {
            if a == b {
                continue;
            }
            let (a_to_b, b_to_a) = (owed(a, b), owed(b, a));
            if a_to_b > b_to_a {
                settlements.push(Settlement {
                    from: players[a].name.clone(),
                    to: players[b].name.clone(),
                    amount: a_to_b - b_to_a,
                });
            }
        }
    }

    Summary {
        balances: players
            .iter()
            .map(|player| player.name.clone())
            .zip(balances)
            .collect(),
        bank,
        settlements,
    }
}
