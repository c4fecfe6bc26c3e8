pub mod init;
pub mod pages;
pub mod serve;
