pub mod controller;
pub mod iteration;

pub use controller::{error_policy_data_source, reconcile_data_source};
pub use iteration::DataSourceIteration;
