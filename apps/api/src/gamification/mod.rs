pub mod handlers;
pub mod xp;
