//! Mortgage amortization.

mod amortization;

pub use amortization::{
    amortization_schedule, amortize, AmortizationError, AmortizationInput, AmortizationResult,
    ScheduleEntry, MAX_TERM_YEARS,
};
