//! Input filtering and output path derivation.
//!
//! The converter turns `model.mesh.xml` into `model.mesh`. When an output
//! directory is configured both tools write to `<dir>/model.mesh`, otherwise
//! the mesh lands beside its source.

use crate::config::{MESH_XML_SUFFIX, XML_SEGMENT};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Remove a trailing `.xml` segment (ASCII case-insensitive) from a file name.
///
/// Only the end of the name is touched: `my.xml.model.mesh.xml` becomes
/// `my.xml.model.mesh`.
pub fn strip_xml_segment(name: &str) -> &str {
    let cut = name.len().saturating_sub(XML_SEGMENT.len());
    match name.get(cut..) {
        Some(tail) if cut > 0 && tail.eq_ignore_ascii_case(XML_SEGMENT) => &name[..cut],
        _ => name,
    }
}

/// File name of the binary mesh produced from `source`.
pub fn mesh_name(source: &Path) -> OsString {
    match source.file_name() {
        Some(name) => match name.to_str() {
            Some(s) => OsString::from(strip_xml_segment(s)),
            None => name.to_os_string(),
        },
        None => OsString::new(),
    }
}

/// Destination argument for a tool when an output directory is configured.
pub fn destination_path(output_dir: &Path, source: &Path) -> PathBuf {
    output_dir.join(mesh_name(source))
}

/// Where the convert step leaves its binary mesh.
pub fn converted_path(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => destination_path(dir, source),
        None => source.with_file_name(mesh_name(source)),
    }
}

/// Whether a file name passes the `*.mesh.xml` display filter.
pub fn matches_filter(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| {
            let n = n.to_ascii_lowercase();
            n.len() > MESH_XML_SUFFIX.len() && n.ends_with(MESH_XML_SUFFIX)
        })
        .unwrap_or(false)
}
