pub mod emi_service;
pub mod schedule_generator;

pub use emi_service::{
    EmiPlanSummary, EmiProgress, EmiService, InstallmentVerification, PendingInstallmentCharge,
};
pub use schedule_generator::ScheduleGenerator;
