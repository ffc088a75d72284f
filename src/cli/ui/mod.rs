pub mod output;

pub use output::{Output, percent, print_json};
