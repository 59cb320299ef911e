pub mod advice_repo;
pub mod audit_repo;
pub mod bank_option_repo;
pub mod bank_repo;
pub mod corrective_action_repo;
pub mod incident_repo;
pub mod postmortem_repo;
pub mod timeline_repo;
pub mod user_repo;

pub use advice_repo::AdviceRepo;
pub use audit_repo::AuditLogRepo;
pub use bank_option_repo::BankOptionRepo;
pub use bank_repo::BankRepo;
pub use corrective_action_repo::CorrectiveActionRepo;
pub use incident_repo::IncidentRepo;
pub use postmortem_repo::PostmortemRepo;
pub use timeline_repo::TimelineRepo;
pub use user_repo::UserRepo;

/// Postgres transaction alias used by the `*_in_tx` repository helpers.
pub type PgTx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;
