//! Transactional publish/consume integration tests.


mod consume;
mod dispatch;
mod publish;
