pub mod services;

pub use services::{Notifier, SmtpNotifier};
