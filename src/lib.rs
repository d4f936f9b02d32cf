pub mod cli;
pub mod dns;
pub mod flow;
pub mod flow_log;
pub mod report;
pub mod settings;
pub mod state_layout;
pub mod ticket;
