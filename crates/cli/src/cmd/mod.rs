mod install;

pub use install::{InstallArgs, cmd_install};
