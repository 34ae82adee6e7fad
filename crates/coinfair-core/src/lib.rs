#![deny(warnings)]
pub mod grid;
pub mod posterior;
pub mod present;
pub mod prior;
pub mod sink;
pub mod sweep;
pub mod toss;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "coinfair"
    }

    pub const fn tagline() -> &'static str {
        "Bayesian coin fairness"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
