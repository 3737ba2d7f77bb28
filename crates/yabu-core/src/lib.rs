pub mod control;
pub mod error;
pub mod hooks;
pub mod lineage;
pub mod run;
pub mod schedule;
pub mod shell;
pub mod store;

#[cfg(test)]
mod testutil;
