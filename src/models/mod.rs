pub mod check;
pub mod query;
pub mod workload;

pub use check::*;
pub use query::*;
pub use workload::*;
