pub mod event;
pub mod notification;
pub mod retry;
pub mod status;
