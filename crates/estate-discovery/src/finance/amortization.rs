use serde::{Deserialize, Serialize};

const MONTHS_PER_YEAR: u32 = 12;
/// Longest accepted loan term.
pub const MAX_TERM_YEARS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum AmortizationError {
    #[error("principal must be positive (got {0})")]
    NonPositivePrincipal(f64),
    #[error("term must be at least one year")]
    NonPositiveTerm,
    #[error("term must not exceed {MAX_TERM_YEARS} years (got {0})")]
    TermTooLong(u32),
    #[error("annual rate must be zero or positive (got {0})")]
    NegativeRate(f64),
    #[error("down payment percent must be within [0, 100) (got {0})")]
    InvalidDownPayment(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
}

impl AmortizationInput {
    /// Financed amount after a down payment expressed as a percent of price.
    pub fn from_price(
        price: f64,
        down_payment_percent: f64,
        annual_rate_percent: f64,
        term_years: u32,
    ) -> Result<Self, AmortizationError> {
        if !down_payment_percent.is_finite() || !(0.0..100.0).contains(&down_payment_percent) {
            return Err(AmortizationError::InvalidDownPayment(down_payment_percent));
        }

        Ok(Self {
            principal: price * (1.0 - down_payment_percent / 100.0),
            annual_rate_percent,
            term_years,
        })
    }

    fn validate(&self) -> Result<(), AmortizationError> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(AmortizationError::NonPositivePrincipal(self.principal));
        }
        if self.term_years == 0 {
            return Err(AmortizationError::NonPositiveTerm);
        }
        if self.term_years > MAX_TERM_YEARS {
            return Err(AmortizationError::TermTooLong(self.term_years));
        }
        if !self.annual_rate_percent.is_finite() || self.annual_rate_percent < 0.0 {
            return Err(AmortizationError::NegativeRate(self.annual_rate_percent));
        }
        Ok(())
    }

    fn monthly_rate(&self) -> f64 {
        self.annual_rate_percent / 100.0 / f64::from(MONTHS_PER_YEAR)
    }

    /// Only meaningful after `validate`, which bounds the term.
    fn payment_count(&self) -> u32 {
        self.term_years.saturating_mul(MONTHS_PER_YEAR)
    }

    pub fn amortize(&self) -> Result<AmortizationResult, AmortizationError> {
        self.validate()?;

        let rate = self.monthly_rate();
        let payments = f64::from(self.payment_count());

        // (1 + r)^n - 1 without the cancellation that turns tiny rates into 0.
        let accrued = (payments * rate.ln_1p()).exp_m1();
        let monthly_payment = if accrued == 0.0 {
            self.principal / payments
        } else {
            self.principal * rate * (accrued + 1.0) / accrued
        };

        let total_payment = monthly_payment * payments;
        Ok(AmortizationResult {
            monthly_payment,
            total_payment,
            total_interest: total_payment - self.principal,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmortizationResult {
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

/// One month of the repayment plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub month: u32,
    pub payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub remaining_balance: f64,
}

pub fn amortize(
    principal: f64,
    annual_rate_percent: f64,
    term_years: u32,
) -> Result<AmortizationResult, AmortizationError> {
    AmortizationInput {
        principal,
        annual_rate_percent,
        term_years,
    }
    .amortize()
}

/// Month-by-month split of each payment into interest and principal.
pub fn amortization_schedule(
    input: &AmortizationInput,
) -> Result<Vec<ScheduleEntry>, AmortizationError> {
    let result = input.amortize()?;
    let rate = input.monthly_rate();
    let months = input.payment_count();

    let mut balance = input.principal;
    let mut entries = Vec::with_capacity(months as usize);

    for month in 1..=months {
        let interest = balance * rate;
        let principal = if month == months {
            balance
        } else {
            result.monthly_payment - interest
        };
        balance = (balance - principal).max(0.0);

        entries.push(ScheduleEntry {
            month,
            payment: principal + interest,
            principal,
            interest,
            remaining_balance: balance,
        });
    }

    Ok(entries)
}
