use crate::error::LoanError;
use log::{debug, trace};
use std::{fmt, iter::FusedIterator};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const PMTS_PER_YEAR: u32 = 12;
pub const MAX_TERM_YEARS: u32 = 100;

/// Principal, nominal annual rate (as a percentage, i.e. 5.0 for 5%) and term in whole years.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RawLoanTerms")
)]
pub struct LoanTerms {
    principal: f64,
    annual_rate: f64,
    term_years: u32,
}

impl LoanTerms {
    pub fn new(principal: f64, annual_rate: f64, term_years: u32) -> Result<Self, LoanError> {
        if !principal.is_finite() {
            return Err(LoanError::invalid_input("principal", "must be a finite number"));
        }
        if principal < 0. {
            return Err(LoanError::invalid_input("principal", "must be zero or greater"));
        }
        if !annual_rate.is_finite() {
            return Err(LoanError::invalid_input("annual_rate", "must be a finite number"));
        }
        if annual_rate < 0. {
            return Err(LoanError::invalid_input("annual_rate", "must be zero or greater"));
        }
        if term_years < 1 {
            return Err(LoanError::invalid_input("term_years", "must be at least 1 year"));
        }
        if term_years > MAX_TERM_YEARS {
            return Err(LoanError::invalid_input(
                "term_years",
                format!("must be at most {} years", MAX_TERM_YEARS),
            ));
        }
        Ok(Self {
            principal,
            annual_rate,
            term_years,
        })
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn annual_rate(&self) -> f64 {
        self.annual_rate
    }

    pub fn term_years(&self) -> u32 {
        self.term_years
    }

    /// Number of scheduled monthly payments over the full term.
    pub fn pmt_count(&self) -> u32 {
        pmt_count(self.term_years)
    }

    pub fn monthly_payment(&self) -> f64 {
        calculate_monthly_payment(self.principal, self.annual_rate, self.term_years)
    }

    pub fn schedule(&self) -> AmortizationSchedule {
        generate_amortization_schedule(self.principal, self.annual_rate, self.term_years)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawLoanTerms {
    principal: f64,
    annual_rate: f64,
    term_years: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawLoanTerms> for LoanTerms {
    type Error = LoanError;

    fn try_from(raw: RawLoanTerms) -> Result<Self, Self::Error> {
        LoanTerms::new(raw.principal, raw.annual_rate, raw.term_years)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AmortizationRow {
    #[cfg_attr(feature = "serde", serde(rename = "Payment Number"))]
    pub pmt_number: u32,
    #[cfg_attr(feature = "serde", serde(rename = "Principal Payment"))]
    pub pmt_principal: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Interest Payment"))]
    pub pmt_interest: f64,
    #[cfg_attr(feature = "serde", serde(rename = "Remaining Balance"))]
    pub remaining_balance: f64,
}

impl AmortizationRow {
    /// Display names of the row fields, in column order.
    pub const COLUMNS: [&'static str; 4] = [
        "Payment Number",
        "Principal Payment",
        "Interest Payment",
        "Remaining Balance",
    ];

    pub fn new(
        pmt_number: u32,
        pmt_principal: f64,
        pmt_interest: f64,
        remaining_balance: f64,
    ) -> Self {
        Self {
            pmt_number,
            pmt_principal,
            pmt_interest,
            remaining_balance,
        }
    }

    /// Total amount applied in this period.
    pub fn pmt_amount(&self) -> f64 {
        self.pmt_principal + self.pmt_interest
    }
}

impl fmt::Display for AmortizationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pmt number {}, principal paid ${:.4}, interest paid ${:.4}, remaining balance ${:.4}",
            self.pmt_number, self.pmt_principal, self.pmt_interest, self.remaining_balance
        )
    }
}

/// Rows of an amortization schedule in payment-number order.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct AmortizationSchedule {
    rows: Vec<AmortizationRow>,
}

impl AmortizationSchedule {
    pub fn rows(&self) -> &[AmortizationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&AmortizationRow> {
        self.rows.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AmortizationRow> {
        self.rows.iter()
    }

    pub fn total_principal(&self) -> f64 {
        self.rows.iter().map(|r| r.pmt_principal).sum()
    }

    pub fn total_interest(&self) -> f64 {
        self.rows.iter().map(|r| r.pmt_interest).sum()
    }

    pub fn total_paid(&self) -> f64 {
        self.total_principal() + self.total_interest()
    }
}

impl FromIterator<AmortizationRow> for AmortizationSchedule {
    fn from_iter<I: IntoIterator<Item = AmortizationRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for AmortizationSchedule {
    type Item = AmortizationRow;
    type IntoIter = std::vec::IntoIter<AmortizationRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a AmortizationSchedule {
    type Item = &'a AmortizationRow;
    type IntoIter = std::slice::Iter<'a, AmortizationRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Produces schedule rows one period at a time. Stops after the full term, or
/// right after the first row whose balance drops to zero or below.
#[derive(Debug)]
pub struct ScheduleIter {
    pmt_amount: f64,
    monthly_rate: f64,
    balance: f64,
    pmt_number: u32,
    pmt_count: u32,
    paid_off: bool,
}

impl ScheduleIter {
    pub fn new(principal: f64, annual_rate: f64, term_years: u32) -> Self {
        Self {
            pmt_amount: calculate_monthly_payment(principal, annual_rate, term_years),
            monthly_rate: monthly_rate(annual_rate),
            balance: principal,
            pmt_number: 0,
            pmt_count: pmt_count(term_years),
            paid_off: false,
        }
    }

    pub fn pmt_amount(&self) -> f64 {
        self.pmt_amount
    }
}

impl Iterator for ScheduleIter {
    type Item = AmortizationRow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.paid_off || self.pmt_number >= self.pmt_count {
            return None;
        }

        self.pmt_number += 1;
        let interest = self.balance * self.monthly_rate;
        let principal = self.pmt_amount - interest;
        self.balance -= principal;

        // the final row keeps its raw portions; only the displayed balance is clamped
        if self.balance <= 0. {
            self.paid_off = true;
        }
        trace!(
            "Pmt # {}, principal {}, interest {}, end bal {}",
            self.pmt_number,
            principal,
            interest,
            self.balance
        );

        Some(AmortizationRow::new(
            self.pmt_number,
            principal,
            interest,
            self.balance.max(0.),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.paid_off {
            (0, Some(0))
        } else {
            let remaining = (self.pmt_count - self.pmt_number) as usize;
            (remaining.min(1), Some(remaining))
        }
    }
}

impl FusedIterator for ScheduleIter {}

fn pmt_count(term_years: u32) -> u32 {
    term_years.saturating_mul(PMTS_PER_YEAR)
}

fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 100. / PMTS_PER_YEAR as f64
}

/// Fixed monthly payment that retires `principal` over `term_years`.
///
/// `annual_rate` is a percentage (5.0 means 5%). A zero rate falls back to straight-line
/// division of the principal. `term_years` must be at least 1.
///
/// The compounding growth `(1 + rate)^n - 1` is taken as `exp_m1(n * ln_1p(rate))` so that
/// rates too small to register in `1 + rate` still give a finite payment that retires the loan.
pub fn calculate_monthly_payment(principal: f64, annual_rate: f64, term_years: u32) -> f64 {
    let rate = monthly_rate(annual_rate);
    let total_pmts = pmt_count(term_years) as f64;
    let growth = (total_pmts * rate.ln_1p()).exp_m1();

    let pmt_amount = if !(rate > 0. && growth > 0.) {
        principal / total_pmts
    } else if growth.is_finite() {
        principal * (rate / growth) * (1. + growth)
    } else {
        // compounding overflows f64; the annuity converges to interest only
        principal * rate
    };
    debug!(
        "principal {}, annual rate {}%, {} payments -> payment {}",
        principal, annual_rate, total_pmts, pmt_amount
    );
    pmt_amount
}

pub fn generate_amortization_schedule(
    principal: f64,
    annual_rate: f64,
    term_years: u32,
) -> AmortizationSchedule {
    ScheduleIter::new(principal, annual_rate, term_years).collect()
}
