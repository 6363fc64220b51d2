pub mod assignment;
pub mod errors;
pub mod event;
pub mod ids;
pub mod notification;
pub mod rights;
pub mod slot;
pub mod source;
pub mod template;
pub mod time;
pub mod training;
pub mod training_type;
pub mod user;
pub mod week;
