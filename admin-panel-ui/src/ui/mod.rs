pub mod dialog;
pub mod login;
pub mod tables;
pub mod toasts;
