pub mod business;
pub mod identity;
pub mod signup;
pub mod user;
