pub mod auth;
pub mod route;
pub mod spot;
