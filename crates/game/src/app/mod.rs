mod bootstrap;
mod config;
mod island;
mod loop_runner;
mod title;

pub(crate) use bootstrap::build_app;
pub(crate) use loop_runner::run;
