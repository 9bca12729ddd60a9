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

//! Error types for session and ledger operations.

use crate::base::SessionCode;
use thiserror::Error;

/// The two failure classes callers distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or semantically invalid request.
    Validation,
    /// Unknown session code.
    NotFound,
}

/// Session and ledger errors.
///
/// Every variant is reported synchronously; a failed operation never leaves
/// a partial effect in the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No live session carries this code
    #[error("invalid game code: {0}")]
    SessionNotFound(SessionCode),

    /// Session creation needs at least one player entry
    #[error("a non-empty players list is required")]
    EmptyRoster,

    /// Player name is missing or blank
    #[error("player name is required")]
    MissingPlayerName,

    /// A player with this name (case-insensitive) is already seated
    #[error("player already exists: {0}")]
    DuplicatePlayer(String),

    /// A required transaction field is absent
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Amount is negative
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Transaction type is neither `buy` nor `transfer`
    #[error("invalid transaction type: {0:?}")]
    InvalidTransactionType(String),

    /// Transfers need a source player
    #[error("transfer transactions require \"from\"")]
    MissingSource,

    /// Transfers need an explicit `cash` or `iou` payment type
    #[error("paymentType must be either \"cash\" or \"iou\"")]
    InvalidPaymentType,

    /// Request body could not be decoded
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SessionNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            LedgerError::SessionNotFound(SessionCode::new("abc123")).to_string(),
            "invalid game code: ABC123"
        );
        assert_eq!(
            LedgerError::EmptyRoster.to_string(),
            "a non-empty players list is required"
        );
        assert_eq!(LedgerError::MissingPlayerName.to_string(), "player name is required");
        assert_eq!(
            LedgerError::DuplicatePlayer("Bob".into()).to_string(),
            "player already exists: Bob"
        );
        assert_eq!(
            LedgerError::MissingField("to").to_string(),
            "missing required field: to"
        );
        assert_eq!(
            LedgerError::InvalidAmount.to_string(),
            "invalid amount (must be positive)"
        );
        assert_eq!(
            LedgerError::InvalidTransactionType("refund".into()).to_string(),
            "invalid transaction type: \"refund\""
        );
        assert_eq!(
            LedgerError::MissingSource.to_string(),
            "transfer transactions require \"from\""
        );
        assert_eq!(
            LedgerError::InvalidPaymentType.to_string(),
            "paymentType must be either \"cash\" or \"iou\""
        );
    }

    #[test]
    fn only_unknown_session_is_not_found() {
        assert_eq!(
            LedgerError::SessionNotFound(SessionCode::new("X")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(LedgerError::EmptyRoster.kind(), ErrorKind::Validation);
        assert_eq!(LedgerError::InvalidPaymentType.kind(), ErrorKind::Validation);
        assert_eq!(
            LedgerError::MalformedRequest("eof".into()).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = LedgerError::DuplicatePlayer("Alice".into());
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
