//! File system utility helpers (BOM-aware readers, path normalization)
use encoding_rs::Encoding;
use std::fs;
use std::io;
use std::path::{Component, Path};

/// Read a project file as text.
///
/// UTF-8 and UTF-16 byte order marks select the decoder and are stripped.
/// Without a BOM the content must be valid UTF-8, otherwise an
/// `InvalidData` error is returned.
pub fn read_project_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    decode_text(&bytes).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "unreadable encoding (expected UTF-8 or a BOM-marked UTF-16)",
        )
    })
}

/// Decode raw bytes, honouring a leading BOM
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            return None;
        }
        return Some(text.into_owned());
    }

    std::str::from_utf8(bytes).ok().map(str::to_string)
}

/// Normalized identity key of `path` relative to `root`: `/` separators,
/// no `.` components.
pub fn normalize_relative(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    normalize_path_str(relative)
}

/// Join the normal components of a path with `/`
pub fn normalize_path_str(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().replace('\\', "/")),
            Component::ParentDir => {
                parts.pop();
            }
            _ => {}
        }
    }
    parts.join("/")
}

/// Relative path without its extension (`Test Cases/Login.tc` -> `Test Cases/Login`)
pub fn strip_extension(relative: &str) -> &str {
    match relative.rfind('.') {
        Some(dot) if !relative[dot..].contains('/') => &relative[..dot],
        _ => relative,
    }
}

/// File stem of a normalized relative path
pub fn file_stem(relative: &str) -> &str {
    let name = relative.rsplit('/').next().unwrap_or(relative);
    strip_extension(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_decode_utf16_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<name>x</name>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text(&bytes).as_deref(), Some("<name>x</name>"));
    }

    #[test]
    fn test_decode_rejects_latin1() {
        assert!(decode_text(&[0x61, 0xE9, 0x62]).is_none());
    }

    #[test]
    fn test_normalize_relative() {
        let root = PathBuf::from("/work/project");
        let file = root.join("Test Cases").join("Login").join("Valid.tc");
        assert_eq!(normalize_relative(&file, &root), "Test Cases/Login/Valid.tc");
        assert_eq!(normalize_path_str(Path::new("./a/../b/c.rs")), "b/c.rs");
    }

    #[test]
    fn test_strip_extension_and_stem() {
        assert_eq!(strip_extension("Test Cases/Login.tc"), "Test Cases/Login");
        assert_eq!(strip_extension("Keywords/v1.2/Helper"), "Keywords/v1.2/Helper");
        assert_eq!(file_stem("Keywords/com/acme/Helper.groovy"), "Helper");
    }
}
