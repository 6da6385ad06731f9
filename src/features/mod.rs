pub mod access;
pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod engagement;
pub mod evidence;
pub mod reports;
pub mod users;
