pub mod init_db;
pub mod user;
