pub(crate) mod account;
pub(crate) mod catalog;
pub(crate) mod progress;
