use std::sync::Arc;

use crate::modules::courses::repositories::CourseRepository;
use crate::modules::gateways::services::CheckoutGateway;
use crate::modules::installments::repositories::InstallmentRepository;
use crate::modules::notifications::services::Notifier;
use crate::modules::payments::repositories::PaymentRepository;
use crate::modules::purchases::repositories::PurchaseRepository;

/// Shared application state injected into handlers.
///
/// Repositories and the gateway client are held behind trait objects so
/// contract tests can swap in in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    pub courses: Arc<dyn CourseRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub installments: Arc<dyn InstallmentRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub gateway: Arc<dyn CheckoutGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub jwt_secret: String,
}
