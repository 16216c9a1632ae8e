pub mod error;
pub mod loan;
pub mod report;

pub use error::LoanError;
pub use loan::{
    calculate_monthly_payment, generate_amortization_schedule, AmortizationRow,
    AmortizationSchedule, LoanTerms,
};
