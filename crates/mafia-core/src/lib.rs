#![deny(warnings)]
pub mod belief;
pub mod game;
pub mod model;

pub use game::config::EngineConfig;
pub use game::report::SessionReport;
pub use game::session::Session;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "mafia-deduction"
    }

    pub const fn codename() -> &'static str {
        "Night Ledger"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "mafia-deduction");
        assert_eq!(AppInfo::codename(), "Night Ledger");
        assert!(!AppInfo::version().is_empty());
    }
}
