#![forbid(unsafe_code)]

mod reporting;

pub use reporting::{init_tracing, print_result};
