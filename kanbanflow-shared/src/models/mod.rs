/// Database models
///
/// - `user`: accounts that own projects and create or receive tasks
/// - `project`: task containers with an owner and members
/// - `task`: units of work with status and priority
///
/// Every read returns related users as display names, joined in the same
/// query.

pub mod project;
pub mod task;
pub mod user;
