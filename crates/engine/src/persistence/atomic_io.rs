use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes through `<name>.tmp` and renames over `path`; readers see either the
/// old document or the new one.
pub(crate) fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;
    swap_into_place(&tmp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })
}

pub(crate) fn append_line(path: &Path, line: &str) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Rename does not replace an existing file on every platform.
fn swap_into_place(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    if let Err(error) = fs::remove_file(final_path) {
        if error.kind() != io::ErrorKind::NotFound {
            return Err(error);
        }
    }
    fs::rename(tmp_path, final_path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "save".into());
    tmp_name.push(".tmp");
    path.with_file_name(tmp_name)
}
