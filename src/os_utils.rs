//! Utilities pertaining to filesystem and other os-level settings
//!

use camino::Utf8Path;

/// Create a novel directory path if it does not exist already
///
/// If the directory already exists no operations are performed
///
/// * `label` - used to describe the error directory in an error message
///
pub fn create_dir_all(dir: &Utf8Path, label: &str) {
    if !dir.is_dir() {
        match std::fs::create_dir_all(dir) {
            Ok(_) => {}
            Err(e) => {
                panic!("Can't create new {label} directory at '{dir}': {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dir_all() {
        let tmp_dir = camino::Utf8PathBuf::from_path_buf(std::env::temp_dir()).unwrap();
        let dir = tmp_dir.join(format!("os_utils_test_{}/nested", std::process::id()));
        create_dir_all(&dir, "test");
        assert!(dir.is_dir());

        // Repeating on an existing directory is a no-op
        create_dir_all(&dir, "test");
        assert!(dir.is_dir());
    }
}
