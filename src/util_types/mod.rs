pub mod key_path;
