pub mod audit;
pub mod auth;
pub mod bank_options;
pub mod banks;
pub mod corrective_actions;
pub mod incidents;
pub mod postmortems;
pub mod reports;
