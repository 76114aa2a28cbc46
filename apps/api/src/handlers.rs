pub mod access_requests;
pub mod health;
