pub mod dashboard;

pub use dashboard::DashboardSession;
