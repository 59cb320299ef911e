pub mod advice;
pub mod audit;
pub mod bank;
pub mod bank_option;
pub mod corrective_action;
pub mod incident;
pub mod postmortem;
pub mod timeline;
pub mod user;
