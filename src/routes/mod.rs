pub mod periods;
pub mod statistics;
pub mod users;
