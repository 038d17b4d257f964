pub mod handlers;
pub mod personality;
