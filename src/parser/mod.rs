/*!
# Format Parsers

One parser per artifact format. Every parser is a pure function from file
content to a typed record or a [`ParseError`]; none of them touches the
file system or shares state, so the walker can run them on any thread.

| Parser                   | Input                        | Output                |
|--------------------------|------------------------------|-----------------------|
| [`TestCaseParser`]       | `.tc` markup                 | [`TestCase`]          |
| [`TestSuiteParser`]      | `.ts` markup                 | [`TestSuite`]         |
| [`SuiteScriptParser`]    | suite `.groovy`              | [`SuiteScript`]       |
| [`KeywordFileParser`]    | keyword `.groovy`            | [`KeywordFile`]       |
| [`ObjectRepositoryParser`] | `.rs` markup               | [`RepositoryObject`]  |
| [`ProfileParser`]        | `.glbl` markup               | [`Profile`]           |
| [`ScriptParser`]         | any other `.groovy`          | [`Script`]            |

[`TestCase`]: crate::model::TestCase
[`TestSuite`]: crate::model::TestSuite
[`SuiteScript`]: crate::model::SuiteScript
[`KeywordFile`]: crate::model::KeywordFile
[`RepositoryObject`]: crate::model::RepositoryObject
[`Profile`]: crate::model::Profile
[`Script`]: crate::model::Script
*/

pub mod groovy;
pub mod object_repository;
pub mod profile;
pub mod test_case;
pub mod test_suite;
pub mod xml;

pub use groovy::{KeywordFileParser, ScriptParser, SuiteScriptParser};
pub use object_repository::ObjectRepositoryParser;
pub use profile::ProfileParser;
pub use test_case::TestCaseParser;
pub use test_suite::TestSuiteParser;

use crate::core::ParseError;
use crate::model::ArtifactKind;
use xml::XmlElement;

/// Uniform contract of all format parsers
pub trait ArtifactParser {
    type Output;

    /// Kind reported in errors
    fn kind(&self) -> ArtifactKind;

    /// Parses `content` of the file at normalized relative `path`
    fn parse(&self, path: &str, content: &str) -> Result<Self::Output, ParseError>;
}

/// Parses markup and checks the root element name
pub(crate) fn parse_markup(
    path: &str,
    kind: ArtifactKind,
    content: &str,
    accepted_roots: &[&str],
) -> Result<XmlElement, ParseError> {
    let root = xml::parse_document(content).map_err(|msg| ParseError::new(path, kind, msg))?;

    if !accepted_roots.is_empty() && !accepted_roots.contains(&root.name.as_str()) {
        return Err(ParseError::new(
            path,
            kind,
            format!(
                "unexpected root element <{}>, expected <{}>",
                root.name,
                accepted_roots.join("> or <")
            ),
        ));
    }

    Ok(root)
}

/// Text of a mandatory field
pub(crate) fn required_text(
    element: &XmlElement,
    field: &str,
    path: &str,
    kind: ArtifactKind,
) -> Result<String, ParseError> {
    element
        .optional_text(field)
        .ok_or_else(|| ParseError::new(path, kind, format!("missing required field <{}>", field)))
}

/// Strips `dir/` from the front of a relative path when present
pub(crate) fn strip_dir<'a>(path: &'a str, dir: &str) -> &'a str {
    path.strip_prefix(dir)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
}
