pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{EmiInstallment, InstallmentStatus};
pub use repositories::{InstallmentRepository, SqlInstallmentRepository};
pub use services::{EmiService, ScheduleGenerator};
