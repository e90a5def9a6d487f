pub mod manage;
pub mod redirect;
