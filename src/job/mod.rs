pub mod command;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod destination;
pub mod key_import;
pub mod redacted;
pub mod resolve;
pub mod result_error;
pub mod script;
pub mod setting;
pub mod validate;
