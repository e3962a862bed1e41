pub mod email_service;

pub use email_service::{
    log_email_failure, InstallmentMail, Notifier, PurchaseMail, SmtpNotifier,
};
