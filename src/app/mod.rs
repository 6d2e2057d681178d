pub mod bootstrap;
pub mod commands;

pub use bootstrap::run;
