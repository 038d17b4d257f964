pub mod gamification;
pub mod performance;
pub mod photo;
pub mod tutor;
pub mod user;
pub mod video;
