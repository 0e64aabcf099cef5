pub mod identity;
pub mod persist;
pub mod source;
pub mod toast;
