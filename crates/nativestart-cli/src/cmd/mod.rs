//! Subcommand implementations

pub mod descriptor;
pub mod executable;
pub mod hash;
pub mod init;
pub mod keygen;
pub mod verify;
