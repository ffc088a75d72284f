pub mod catalog;
pub mod config;
pub mod detect;
pub mod generate;
pub mod suggest;
pub mod validate;
