pub mod leave_repo;
pub mod schedule_repo;
