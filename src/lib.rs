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

//! # Chip Ledger
//!
//! This library tracks chip ownership and debts for informal multi-player
//! chip games: players buy chips from the bank, hand chips to each other for
//! cash or on credit, and the ledger works out who holds what and who owes
//! whom.
//!
//! ## Core Components
//!
//! - [`SessionStore`]: Registry of live game sessions keyed by short code
//! - [`Session`]: One table's roster and append-only transaction log
//! - [`ledger::summarize`]: Balances, bank totals and pairwise settlements
//! - [`LedgerError`]: Validation and not-found failures
//! - [`server`]: HTTP/JSON API over a store
//!
//! ## Example
//!
//! ```
//! use chip_ledger::{ExtraChips, NewPlayer, SessionStore, TransactionRequest};
//!
//! let store = SessionStore::new();
//!
//! // Open a game where Bob starts with 100 chips bought for cash
//! let created = store
//!     .create_session(&[
//!         NewPlayer::named("Alice"),
//!         NewPlayer::named("Bob").with_extra(ExtraChips::new(100).paid_with("cash")),
//!     ])
//!     .unwrap();
//!
//! // Bob hands Alice 30 chips on credit
//! store
//!     .record_transaction(
//!         &created.game_code,
//!         &TransactionRequest::transfer("Bob", "Alice", 30, "iou"),
//!     )
//!     .unwrap();
//!
//! let summary = store.summary(&created.game_code).unwrap();
//! assert_eq!(summary.balance("Alice").unwrap().current_chips, 30);
//! assert_eq!(summary.balance("Bob").unwrap().current_chips, 70);
//! assert_eq!(summary.settlements()[0].from, "Bob");
//! ```
//!
//! ## Thread Safety
//!
//! The store handles concurrent access to sessions, allowing requests for
//! different games to run in parallel while requests for one game are
//! applied one at a time.

mod base;
pub mod error;
pub mod ledger;
pub mod request;
pub mod server;
mod session;
pub mod store;
mod transaction;

pub use base::{PlayerId, SessionCode, TransactionId};
pub use error::{ErrorKind, LedgerError};
pub use ledger::{BankSummary, PlayerBalance, Settlement, Summary};
pub use request::{ExtraChips, NewPlayer, TransactionRequest};
pub use session::{Player, Session};
pub use store::{CodeGenerator, RandomCodes, SessionCreated, SessionStore};
pub use transaction::{BANK, PaymentType, Transaction, TransactionKind};
