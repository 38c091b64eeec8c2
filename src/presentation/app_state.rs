// Application state for HTTP handlers
use crate::application::account_service::AccountService;
use crate::application::overview_service::OverviewService;
use crate::application::provider_registry::ProviderRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub account_service: AccountService,
    pub overview_service: OverviewService,
}
