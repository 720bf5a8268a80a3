use camino::{Utf8Path, Utf8PathBuf};
use simple_error::{SimpleResult, bail};

/// Check a required input filename
///
/// Assumes no logger has been configured yet
///
pub fn check_required_filename(filename: &str, label: &str) -> SimpleResult<()> {
    if filename.is_empty() {
        bail!("Must specify {} file", label);
    }
    let path = std::path::Path::new(&filename);
    if !path.exists() {
        bail!("Can't find specified {} file: '{}'", label, filename);
    }
    if !path.is_file() {
        bail!(
            "Specified {} file path does not appear to be a file: '{}'",
            label,
            filename
        );
    }
    Ok(())
}

/// Check that a setting is not zero
///
pub fn check_nonzero_setting(value: usize, arg_name: &str) -> SimpleResult<()> {
    if value == 0 {
        bail!("--{} argument must be greater than 0", arg_name);
    }
    Ok(())
}

pub fn canonicalize_path(path: &Utf8Path) -> SimpleResult<Utf8PathBuf> {
    match path.canonicalize_utf8() {
        Ok(x) => Ok(x),
        Err(e) => bail!("Unable to canonicalize path '{}': {}", path, e),
    }
}
