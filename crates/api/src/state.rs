use auth::SessionManager;

/// Application state shared across all handlers
pub struct AppState {
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}
