pub mod events;
pub mod funds;
pub mod init;
pub mod query;
pub mod reserve;
pub mod verify;
