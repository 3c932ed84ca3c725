pub mod archive;
pub mod audio;
pub mod downloader;
pub mod layout;
pub mod process;
pub mod separator;
pub mod template;
pub mod toolchain;
