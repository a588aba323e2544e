use orchestrator::HomeContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) home: HomeContext,
}
