use lc_cost::{MachineProfile, RateBook};

/// Shared, read-only application state. Unlike a session-oriented server,
/// a costing request carries its own nesting result and job overrides in
/// the request body; only the rate book and machine profile are configured
/// once at startup and shared across requests.
pub struct AppState {
    pub rate_book: RateBook,
    pub machine_profile: MachineProfile,
}

impl AppState {
    pub fn new(rate_book: RateBook, machine_profile: MachineProfile) -> Self {
        Self {
            rate_book,
            machine_profile,
        }
    }
}
