pub mod courses;
pub mod gateways;
pub mod installments;
pub mod notifications;
pub mod payments;
pub mod purchases;
