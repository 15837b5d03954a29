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

//! Payment settlement.
//!
//! A payment is evaluated once against its invoice:
//!
//! ```text
//!  Pending ──┬── invoice already paid ──► Failed(AlreadyPaid)
//!            ├── amount < final amount ──► Failed(InsufficientAmount)
//!            ├── unknown method ─────────► Failed(InvalidMethod)
//!            └── otherwise ──────────────► Completed  (invoice → Paid)
//! ```
//!
//! A failed payment is a normal outcome, not an error. The invoice stays
//! pending and the caller may submit a new payment.

use crate::ReservationError;
use crate::base::{InvoiceId, PaymentId};
use crate::pricing::Invoice;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    CreditCard,
    Cash,
    MobileWallet,
}

impl PaymentMethod {
    /// Parses a method label, ignoring case, spaces, hyphens and underscores.
    ///
    /// ```
    /// use reservation_ledger_rs::PaymentMethod;
    ///
    /// assert_eq!(PaymentMethod::parse("Credit Card"), Some(PaymentMethod::CreditCard));
    /// assert_eq!(PaymentMethod::parse("mobile_wallet"), Some(PaymentMethod::MobileWallet));
    /// assert_eq!(PaymentMethod::parse("Cheque"), None);
    /// ```
    pub fn parse(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "creditcard" => Some(Self::CreditCard),
            "cash" => Some(Self::Cash),
            "mobilewallet" => Some(Self::MobileWallet),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreditCard => "CreditCard",
            Self::Cash => "Cash",
            Self::MobileWallet => "MobileWallet",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentFailure {
    InsufficientAmount,
    InvalidMethod,
    AlreadyPaid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed(PaymentFailure),
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Completed => f.write_str("Completed"),
            Self::Failed(PaymentFailure::InsufficientAmount) => {
                f.write_str("Failed - Insufficient Amount")
            }
            Self::Failed(PaymentFailure::InvalidMethod) => {
                f.write_str("Failed - Invalid Payment Method")
            }
            Self::Failed(PaymentFailure::AlreadyPaid) => f.write_str("Failed - Already Paid"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    id: PaymentId,
    invoice_id: InvoiceId,
    amount: Decimal,
    /// The label as tendered; see [`Payment::method`] for the parsed form.
    method_label: String,
    timestamp: DateTime<Utc>,
    status: PaymentStatus,
}

impl Payment {
    /// A pending payment.
    ///
    /// # Errors
    ///
    /// [`ReservationError::InvalidAmount`] if `amount` is negative.
    pub fn new(
        invoice_id: InvoiceId,
        amount: Decimal,
        method: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ReservationError> {
        if amount < Decimal::ZERO {
            return Err(ReservationError::InvalidAmount(amount));
        }
        Ok(Self {
            id: PaymentId::new(),
            invoice_id,
            amount,
            method_label: method.into(),
            timestamp,
            status: PaymentStatus::Pending,
        })
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn invoice_id(&self) -> InvoiceId {
        self.invoice_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// `None` when the tendered label is not a supported method.
    pub fn method(&self) -> Option<PaymentMethod> {
        PaymentMethod::parse(&self.method_label)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Evaluates a pending payment against `invoice` and returns the outcome.
    ///
    /// Only a `Completed` outcome touches the invoice. A payment that has
    /// already been evaluated returns its recorded status unchanged.
    pub fn process(&mut self, invoice: &mut Invoice) -> PaymentStatus {
        if self.status != PaymentStatus::Pending {
            return self.status;
        }
        debug_assert_eq!(invoice.id(), self.invoice_id);

        self.status = if invoice.is_paid() {
            PaymentStatus::Failed(PaymentFailure::AlreadyPaid)
        } else if self.amount < invoice.final_amount() {
            PaymentStatus::Failed(PaymentFailure::InsufficientAmount)
        } else if self.method().is_none() {
            PaymentStatus::Failed(PaymentFailure::InvalidMethod)
        } else {
            invoice.mark_paid();
            PaymentStatus::Completed
        };
        self.status
    }

    /// Human-readable receipt. Pure formatting; the same payment always
    /// renders the same text.
    pub fn receipt(&self, footer: Option<&str>) -> String {
        let method = self
            .method()
            .map(|method| method.to_string())
            .unwrap_or_else(|| self.method_label.clone());

        let mut receipt = format!(
            "RECEIPT\n\
             --------\n\
             Payment ID: {}\n\
             Invoice: {}\n\
             Date: {}\n\
             Amount: {:.2}\n\
             Method: {method}\n\
             Status: {}\n\
             --------",
            self.id,
            self.invoice_id,
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.amount,
            self.status,
        );
        if let Some(footer) = footer {
            receipt.push('\n');
            receipt.push_str(footer);
        }
        receipt
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Payment: {} | Invoice: {} | Amount: {:.2} | Method: {} | Status: {}",
            self.id, self.invoice_id, self.amount, self.method_label, self.status
        )
    }
}
