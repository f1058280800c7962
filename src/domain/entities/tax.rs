//! # Tax Compliance Gate
//!
//! Assessed liabilities by head, payments, and the clearance certificate.
//!
//! The estate is tax-cleared when payments cover the assessment and a
//! clearance certificate is on file.

use crate::domain::entities::asset::require_text;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Currency, Money, Timestamp, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tax assessment. At least one head is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAssessment {
    /// Assessment reference from the revenue authority.
    pub reference: String,
    /// Assessment date.
    pub assessed_on: NaiveDate,
    /// Income tax.
    pub income_tax: Option<Money>,
    /// Capital gains tax.
    pub capital_gains_tax: Option<Money>,
    /// Stamp duty.
    pub stamp_duty: Option<Money>,
    /// Other levies.
    pub other_levies: Option<Money>,
    /// Who recorded it.
    pub assessed_by: UserId,
}

impl TaxAssessment {
    fn heads(&self) -> impl Iterator<Item = Money> {
        [
            self.income_tax,
            self.capital_gains_tax,
            self.stamp_duty,
            self.other_levies,
        ]
        .into_iter()
        .flatten()
    }

    /// Validates the assessment against the estate currency.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no head is present or the
    /// reference is blank; amount errors for negative or foreign heads.
    pub fn validate(&self, currency: Currency) -> DomainResult<()> {
        require_text("assessment reference", self.reference.as_str())?;
        if self.heads().next().is_none() {
            return Err(DomainError::validation(
                "assessment requires at least one tax head",
            ));
        }
        for head in self.heads() {
            head.ensure_currency(currency)?;
            head.ensure_non_negative("tax head")?;
        }
        Ok(())
    }

    /// Sums all assessed heads.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn total(&self, currency: Currency) -> DomainResult<Money> {
        Money::sum(currency, self.heads())
    }
}

/// A recorded tax payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPayment {
    /// Amount paid.
    pub amount: Money,
    /// Payment date.
    pub paid_on: NaiveDate,
    /// Payment reference.
    pub reference: String,
    /// Who recorded it.
    pub paid_by: UserId,
}

/// The estate's tax position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRecord {
    assessment: Option<TaxAssessment>,
    payments: Vec<TaxPayment>,
    clearance_certificate: Option<String>,
    updated_at: Option<Timestamp>,
}

impl TaxRecord {
    /// Returns the current assessment.
    #[inline]
    #[must_use]
    pub fn assessment(&self) -> Option<&TaxAssessment> {
        self.assessment.as_ref()
    }

    /// Returns recorded payments.
    #[inline]
    #[must_use]
    pub fn payments(&self) -> &[TaxPayment] {
        &self.payments
    }

    /// Returns the clearance certificate reference.
    #[inline]
    #[must_use]
    pub fn clearance_certificate(&self) -> Option<&str> {
        self.clearance_certificate.as_deref()
    }

    /// Sets or replaces the assessment. Payments and certificate are kept.
    ///
    /// # Errors
    ///
    /// See [`TaxAssessment::validate`].
    pub fn record_assessment(&mut self, assessment: TaxAssessment, currency: Currency) -> DomainResult<()> {
        assessment.validate(currency)?;
        self.assessment = Some(assessment);
        self.updated_at = Some(Timestamp::now());
        Ok(())
    }

    /// Appends a payment.
    ///
    /// Payments may precede the assessment.
    ///
    /// # Errors
    ///
    /// Returns amount errors for a non-positive or foreign amount,
    /// `DomainError::Validation` for a blank reference.
    pub fn record_payment(&mut self, payment: TaxPayment, currency: Currency) -> DomainResult<()> {
        payment.amount.ensure_currency(currency)?;
        payment.amount.ensure_positive("tax payment")?;
        require_text("payment reference", payment.reference.as_str())?;
        self.payments.push(payment);
        self.updated_at = Some(Timestamp::now());
        Ok(())
    }

    /// Sets the clearance certificate reference.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank reference.
    pub fn upload_clearance_certificate(&mut self, reference: impl Into<String>) -> DomainResult<()> {
        self.clearance_certificate = Some(require_text("certificate reference", reference)?);
        self.updated_at = Some(Timestamp::now());
        Ok(())
    }

    /// Sums the assessed heads; zero without an assessment.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn total_assessed(&self, currency: Currency) -> DomainResult<Money> {
        match &self.assessment {
            Some(assessment) => assessment.total(currency),
            None => Ok(Money::zero(currency)),
        }
    }

    /// Sums recorded payments.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn total_paid(&self, currency: Currency) -> DomainResult<Money> {
        Money::sum(currency, self.payments.iter().map(|p| p.amount))
    }

    /// Returns `max(0, assessed − paid)`.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn outstanding(&self, currency: Currency) -> DomainResult<Money> {
        self.total_assessed(currency)?
            .sub_floor_zero(self.total_paid(currency)?)
    }

    /// Returns true when payments cover the assessment and a certificate is on file.
    ///
    /// # Errors
    ///
    /// Returns a currency or arithmetic error.
    pub fn is_cleared(&self, currency: Currency) -> DomainResult<bool> {
        Ok(self.clearance_certificate.is_some()
            && self
                .total_paid(currency)?
                .covers(&self.total_assessed(currency)?)?)
    }
}
