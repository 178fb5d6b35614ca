// Library root: the leaderboard front end, exposed for the binary and the
// integration tests.

pub mod app;
pub mod render;
pub mod session;
pub mod source;
pub mod view;
