pub mod evidence;
pub mod meeting;
pub mod review;
pub mod ttfu;
pub mod user;
