//! Configuration sources, in precedence order.

pub mod environment;
pub mod global_file;
pub mod project_file;
