use rolegate_application::AccessRequestOrchestrator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: AccessRequestOrchestrator,
}
