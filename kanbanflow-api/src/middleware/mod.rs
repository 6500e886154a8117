/// Middleware for the API server
///
/// - `identity`: bearer authentication layers and write-caller resolution

pub mod identity;
