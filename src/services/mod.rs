pub mod command;
pub mod dispatcher;
pub mod messaging;
pub mod metadata;
pub mod resolver;
pub mod session;
pub mod storage;
