pub mod admin;
pub mod resource;
