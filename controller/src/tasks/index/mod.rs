pub mod controller;
pub mod iteration;

pub use controller::{error_policy_index, reconcile_index};
pub use iteration::IndexIteration;
