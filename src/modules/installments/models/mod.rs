pub mod installment;

pub use installment::{EmiInstallment, InstallmentStatus};
