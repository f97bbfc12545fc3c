// Driver library: the event loop, the login session, and the messages the
// UI exchanges with them.

pub mod app;
pub mod protocol;
pub mod session;
