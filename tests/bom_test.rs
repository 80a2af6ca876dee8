/*!
Test for BOM handling in project files
*/

use katalon_analyzer::core::read_project_file;
use katalon_analyzer::{AnalyzerConfig, ArtifactKind, ProjectAnalyzer};
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

#[test]
fn test_utf8_bom_bytes() -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    let mut content = vec![0xEF, 0xBB, 0xBF];
    content.extend_from_slice("<TestCase><name>Вход</name></TestCase>".as_bytes());
    temp_file.write_all(&content)?;

    let content = read_project_file(temp_file.path())?;
    assert!(!content.starts_with('\u{FEFF}'));
    assert!(content.starts_with("<TestCase>"));

    Ok(())
}

#[test]
fn test_invalid_bytes_are_rejected() -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    temp_file.write_all(&[b'<', 0xC3, 0x28, b'>'])?;

    let err = read_project_file(temp_file.path()).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);

    Ok(())
}

#[test]
fn test_utf16_project_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("Test Cases")).unwrap();
    fs::write(
        root.join("Test Cases/Login.tc"),
        utf16le_with_bom("<?xml version=\"1.0\" encoding=\"UTF-16\"?>\n<TestCase><name>Login</name></TestCase>"),
    )
    .unwrap();
    fs::write(root.join("Test Cases/Latin1.tc"), b"<TestCase><name>Caf\xE9</name></TestCase>").unwrap();

    let config = AnalyzerConfig {
        threads: 1,
        ..AnalyzerConfig::default()
    };
    let analysis = ProjectAnalyzer::new(config).unwrap().analyze(root).unwrap();

    assert_eq!(analysis.model().test_cases()["Test Cases/Login.tc"].name, "Login");

    let errors = analysis.parse_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "Test Cases/Latin1.tc");
    assert_eq!(errors[0].kind, ArtifactKind::TestCase);
}
