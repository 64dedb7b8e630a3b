//! Business logic behind the admin routes.

pub mod analytics;
pub mod dashboard;
pub mod products;

pub use analytics::{AnalyticsReader, DateRange, SummaryReport};
pub use dashboard::{Dashboard, DashboardStats};
pub use products::{ProductForm, ProductManager};
