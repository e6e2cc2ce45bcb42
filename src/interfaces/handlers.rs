pub mod home;
pub mod images;
pub mod json_error;
