/*!
# Groovy Script Scanner

Pattern-based extraction over keyword files, suite scripts and free
scripts. This is not a Groovy parser: it only recognizes

- the `package` declaration,
- line-level `import` declarations,
- `@Keyword` method definitions with their parameter lists,
- call sites: `CustomKeywords.'pkg.Class.method'(...)`,
  `findTestObject('...')`, `findTestCase('...')` and plain
  `name(...)` / `Receiver.name(...)` calls.

Anything else is skipped. Names inside comments and string literals are
picked up like real code.
*/

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::{strip_dir, ArtifactParser};
use crate::core::fs_utils::file_stem;
use crate::core::ParseError;
use crate::model::{
    ArtifactKind, CallKind, CallSite, ImportDecl, Keyword, KeywordFile, Script, SuiteScript,
};

/// Words that look like calls but are statements
static CONTROL_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "if", "for", "while", "switch", "catch", "synchronized", "return", "throw", "assert",
        "super", "this", "def", "else", "try", "finally", "in", "instanceof", "as",
    ]
    .into_iter()
    .collect()
});

/// Calls captured by their own patterns
static DEDICATED_CALLS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["findTestObject", "findTestCase"].into_iter().collect());

/// Tokens before a name that can not be a return type
static NON_TYPE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["return", "new", "else", "throw", "assert", "in", "case", "and", "or", "not"]
        .into_iter()
        .collect()
});

/// Result of scanning one script body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptScan {
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub calls: Vec<CallSite>,
}

/// Compiled patterns of the script dialect
#[derive(Debug, Clone)]
pub struct GroovyScanner {
    package_pattern: Regex,
    import_pattern: Regex,
    keyword_annotation: Regex,
    custom_keyword_call: Regex,
    test_object_call: Regex,
    test_case_call: Regex,
    method_call: Regex,
}

impl GroovyScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            package_pattern: Regex::new(r"(?m)^[ \t]*package[ \t]+([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)")
                .context("Failed to compile package regex")?,
            import_pattern: Regex::new(
                r"(?m)^[ \t]*import[ \t]+(static[ \t]+)?([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*(?:\.\*)?)(?:[ \t]+as[ \t]+([A-Za-z_$][\w$]*))?[ \t]*;?[ \t]*\r?$",
            )
            .context("Failed to compile import regex")?,
            keyword_annotation: Regex::new(r"@Keyword\b").context("Failed to compile keyword annotation regex")?,
            custom_keyword_call: Regex::new(r#"CustomKeywords\s*\.\s*['"]([^'"\r\n]+)['"]"#)
                .context("Failed to compile custom keyword regex")?,
            test_object_call: Regex::new(r#"findTestObject\s*\(\s*['"]([^'"\r\n]+)['"]"#)
                .context("Failed to compile test object regex")?,
            test_case_call: Regex::new(r#"findTestCase\s*\(\s*['"]([^'"\r\n]+)['"]"#)
                .context("Failed to compile test case regex")?,
            method_call: Regex::new(r"([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s*\(")
                .context("Failed to compile method call regex")?,
        })
    }

    /// Explicit `package` declaration, if any
    pub fn package(&self, content: &str) -> Option<String> {
        self.package_pattern
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Import declarations in source order
    pub fn imports(&self, content: &str) -> Vec<ImportDecl> {
        let lines = LineIndex::new(content);
        self.import_pattern
            .captures_iter(content)
            .filter_map(|caps| {
                let path = caps.get(2)?;
                Some(ImportDecl {
                    path: path.as_str().to_string(),
                    alias: caps.get(3).map(|m| m.as_str().to_string()),
                    is_static: caps.get(1).is_some(),
                    line: lines.line_of(path.start()),
                })
            })
            .collect()
    }

    /// `@Keyword` methods. `qualifier` is the `package.Class` prefix of
    /// the qualified names, `file` the owning file path.
    pub fn keywords(&self, content: &str, qualifier: &str, file: &str) -> Vec<Keyword> {
        let lines = LineIndex::new(content);
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();

        for annotation in self.keyword_annotation.find_iter(content) {
            let Some(definition) = parse_definition_after(content, annotation.end()) else {
                tracing::debug!("{}: @Keyword at byte {} is not followed by a method", file, annotation.start());
                continue;
            };

            if !seen.insert(definition.name.clone()) {
                // Перегрузки: учитываем только первое определение
                continue;
            }

            let qualified_name = if qualifier.is_empty() {
                definition.name.clone()
            } else {
                format!("{}.{}", qualifier, definition.name)
            };

            keywords.push(Keyword {
                qualified_name,
                file: file.to_string(),
                param_count: definition.parameters.len(),
                parameters: definition.parameters,
                line: lines.line_of(definition.name_offset),
                name: definition.name,
            });
        }

        keywords
    }

    /// Call sites in source order
    pub fn call_sites(&self, content: &str) -> Vec<CallSite> {
        let lines = LineIndex::new(content);
        let mut found: Vec<(usize, CallSite)> = Vec::new();

        let dedicated = [
            (&self.custom_keyword_call, CallKind::CustomKeyword),
            (&self.test_object_call, CallKind::TestObject),
            (&self.test_case_call, CallKind::TestCase),
        ];
        for (pattern, kind) in dedicated {
            for caps in pattern.captures_iter(content) {
                if let Some(target) = caps.get(1) {
                    let call = CallSite::new(kind, target.as_str().trim(), lines.line_of(target.start()));
                    found.push((target.start(), call));
                }
            }
        }

        for caps in self.method_call.captures_iter(content) {
            let Some(name) = caps.get(1) else { continue };
            let target = name.as_str();
            let bare = target.rsplit('.').next().unwrap_or(target);

            if CONTROL_WORDS.contains(bare) || DEDICATED_CALLS.contains(bare) {
                continue;
            }
            if let Some(prev) = content[..name.start()].chars().next_back() {
                // аннотации с аргументами и хвосты идентификаторов
                if prev == '@' || prev.is_alphanumeric() || prev == '_' || prev == '$' {
                    continue;
                }
            }
            if is_constructor_or_definition(content, name.start(), name.end()) {
                continue;
            }

            found.push((
                name.start(),
                CallSite::new(CallKind::MethodCall, target, lines.line_of(name.start())),
            ));
        }

        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, call)| call).collect()
    }

    /// Package, imports and call sites of one body
    pub fn scan(&self, content: &str) -> ScriptScan {
        ScriptScan {
            package: self.package(content),
            imports: self.imports(content),
            calls: self.call_sites(content),
        }
    }
}

/// Parser for files under the keywords directory
#[derive(Debug, Clone)]
pub struct KeywordFileParser {
    keywords_dir: String,
    scanner: GroovyScanner,
}

impl KeywordFileParser {
    pub fn new(keywords_dir: impl Into<String>, scanner: GroovyScanner) -> Self {
        Self {
            keywords_dir: keywords_dir.into(),
            scanner,
        }
    }

    /// Package from the directory below the keywords dir (`a/b/C.groovy` -> `a.b`)
    pub fn package_from_path(&self, path: &str) -> String {
        let inner = strip_dir(path, &self.keywords_dir);
        match inner.rfind('/') {
            Some(slash) => inner[..slash].replace('/', "."),
            None => String::new(),
        }
    }
}

impl ArtifactParser for KeywordFileParser {
    type Output = KeywordFile;

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::KeywordFile
    }

    fn parse(&self, path: &str, content: &str) -> Result<KeywordFile, ParseError> {
        let scan = self.scanner.scan(content);
        let package = scan
            .package
            .unwrap_or_else(|| self.package_from_path(path));
        let class_name = file_stem(path).to_string();

        let qualifier = if package.is_empty() {
            class_name.clone()
        } else {
            format!("{}.{}", package, class_name)
        };
        let keywords = self.scanner.keywords(content, &qualifier, path);

        Ok(KeywordFile {
            path: path.to_string(),
            package,
            class_name,
            keywords,
            imports: scan.imports,
            calls: scan.calls,
        })
    }
}

/// Parser for Groovy companions of test suites
#[derive(Debug, Clone)]
pub struct SuiteScriptParser {
    scanner: GroovyScanner,
}

impl SuiteScriptParser {
    pub fn new(scanner: GroovyScanner) -> Self {
        Self { scanner }
    }
}

impl ArtifactParser for SuiteScriptParser {
    type Output = SuiteScript;

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::TestSuite
    }

    fn parse(&self, path: &str, content: &str) -> Result<SuiteScript, ParseError> {
        let scan = self.scanner.scan(content);
        Ok(SuiteScript {
            path: path.to_string(),
            imports: scan.imports,
            calls: scan.calls,
            has_setup: has_annotation(content, "SetUp"),
            has_teardown: has_annotation(content, "TearDown"),
            has_setup_test_case: has_annotation(content, "SetupTestCase"),
            has_teardown_test_case: has_annotation(content, "TearDownTestCase"),
        })
    }
}

/// Parser for free scripts
#[derive(Debug, Clone)]
pub struct ScriptParser {
    scanner: GroovyScanner,
}

impl ScriptParser {
    pub fn new(scanner: GroovyScanner) -> Self {
        Self { scanner }
    }
}

impl ArtifactParser for ScriptParser {
    type Output = Script;

    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Script
    }

    fn parse(&self, path: &str, content: &str) -> Result<Script, ParseError> {
        let scan = self.scanner.scan(content);
        Ok(Script {
            path: path.to_string(),
            name: file_stem(path).to_string(),
            content: content.to_string(),
            line_count: content.lines().count(),
            imports: scan.imports,
            calls: scan.calls,
            bound_test_case: None,
        })
    }
}

/// Byte offset -> 1-based line number
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(content.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }
}

struct Definition {
    name: String,
    name_offset: usize,
    parameters: Vec<String>,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn skip_whitespace(content: &str, pos: usize) -> usize {
    let rest = &content[pos..];
    pos + (rest.len() - rest.trim_start().len())
}

/// Index of the `)` closing the `(` at `open`; string literals are skipped
fn find_matching_paren(content: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in content[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Method header following an annotation ending at `pos`
fn parse_definition_after(content: &str, mut pos: usize) -> Option<Definition> {
    pos = skip_whitespace(content, pos);
    if content[pos..].starts_with('(') {
        pos = find_matching_paren(content, pos)? + 1;
    }

    // further annotations between @Keyword and the method
    loop {
        pos = skip_whitespace(content, pos);
        if !content[pos..].starts_with('@') {
            break;
        }
        pos += 1;
        pos += content[pos..]
            .find(|c: char| !(is_ident_char(c) || c == '.'))
            .unwrap_or(content.len() - pos);
        let after = skip_whitespace(content, pos);
        if content[after..].starts_with('(') {
            pos = find_matching_paren(content, after)? + 1;
        }
    }

    let rest = &content[pos..];
    let open = rest.find('(')?;
    let header = rest[..open].trim_end();
    if header.contains(|c| matches!(c, '{' | '}' | ';' | '='))
        || header.split_whitespace().any(|word| word == "class")
    {
        return None;
    }

    let name = header.rsplit(|c: char| !is_ident_char(c)).next()?;
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let open_abs = pos + open;
    let close = find_matching_paren(content, open_abs)?;

    Some(Definition {
        name: name.to_string(),
        name_offset: pos + header.len() - name.len(),
        parameters: split_parameters(&content[open_abs + 1..close]),
    })
}

/// Parameter names of a parameter list (`String a, int b = 2` -> `[a, b]`)
fn split_parameters(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut current = String::new();

    for c in list.chars() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            current.push(c);
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '<' | '[' | '{' => depth += 1,
            ')' | '>' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);

    parts
        .iter()
        .map(|part| part.split('=').next().unwrap_or(part).trim())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.rsplit(|c: char| !is_ident_char(c))
                .find(|token| !token.is_empty())
                .unwrap_or(part)
                .to_string()
        })
        .collect()
}

/// `true` when the name at `start..end` is a definition site or a
/// constructor call rather than a call
fn is_constructor_or_definition(content: &str, start: usize, end: usize) -> bool {
    let before = &content[..start];
    let trimmed = before.trim_end_matches([' ', '\t']);
    let prev_word: String = trimmed
        .chars()
        .rev()
        .take_while(|&c| is_ident_char(c) || c == '>' || c == ']' || c == '<' || c == '[')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    if prev_word == "new" || prev_word == "def" {
        return true;
    }
    if prev_word.is_empty() || NON_TYPE_WORDS.contains(prev_word.as_str()) {
        return false;
    }
    // Тип возвращаемого значения должен стоять в той же строке
    if trimmed.len() == before.len() {
        return false;
    }
    let type_start = trimmed.len() - prev_word.len();
    if trimmed[..type_start].ends_with('.') {
        return false;
    }

    let Some(open) = content[end..].find('(').map(|i| end + i) else {
        return false;
    };
    let Some(close) = find_matching_paren(content, open) else {
        return false;
    };
    let after = content[close + 1..].trim_start();
    after.starts_with('{') || after.starts_with("throws")
}

/// `@Name` not followed by further identifier characters
fn has_annotation(content: &str, name: &str) -> bool {
    let needle = format!("@{}", name);
    content.match_indices(&needle).any(|(i, _)| {
        content[i + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident_char(c))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HELPER_GROOVY: &str = r#"package com.acme.auth

import com.kms.katalon.core.annotation.Keyword
import com.kms.katalon.core.testobject.TestObject
import static com.kms.katalon.core.testobject.ObjectRepository.findTestObject
import com.acme.util.Strings as S
import com.kms.katalon.core.webui.keyword.WebUiBuiltInKeywords as WebUI

public class LoginHelper {

    @Keyword
    def login(String user, String password) {
        WebUI.setText(findTestObject('Page_Login/txt_User'), user)
        WebUI.setEncryptedText(findTestObject("Page_Login/txt_Password"), password)
        submit()
    }

    @Keyword(keywordObject = "Browser")
    static boolean isLoggedIn() {
        return WebUI.verifyElementPresent(findTestObject('Page_Home/lbl_Welcome'), 5)
    }

    @Keyword
    @CompileStatic
    List<String> collect(Map<String, Object> options, int limit = 10, String sep = ',') throws IOException {
        return []
    }

    private void submit() {
        WebUI.click(findTestObject('Page_Login/btn_Login'))
    }
}
"#;

    fn scanner() -> GroovyScanner {
        GroovyScanner::new().unwrap()
    }

    #[test]
    fn test_package_and_imports() {
        let scanner = scanner();
        assert_eq!(scanner.package(HELPER_GROOVY).as_deref(), Some("com.acme.auth"));

        let imports = scanner.imports(HELPER_GROOVY);
        assert_eq!(imports.len(), 5);
        assert_eq!(imports[0].path, "com.kms.katalon.core.annotation.Keyword");
        assert_eq!(imports[0].line, 3);
        assert!(imports[2].is_static);
        assert_eq!(imports[3].alias.as_deref(), Some("S"));
        assert_eq!(imports[3].path, "com.acme.util.Strings");
    }

    #[test]
    fn test_keyword_definitions() {
        let keywords = scanner().keywords(HELPER_GROOVY, "com.acme.auth.LoginHelper", "Keywords/com/acme/auth/LoginHelper.groovy");
        let names: Vec<_> = keywords.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["login", "isLoggedIn", "collect"]);

        assert_eq!(keywords[0].qualified_name, "com.acme.auth.LoginHelper.login");
        assert_eq!(keywords[0].parameters, vec!["user", "password"]);
        assert_eq!(keywords[0].line, 12);
        assert_eq!(keywords[1].param_count, 0);
        assert_eq!(keywords[2].parameters, vec!["options", "limit", "sep"]);
        assert_eq!(keywords[2].file, "Keywords/com/acme/auth/LoginHelper.groovy");
    }

    #[test]
    fn test_call_sites_in_order() {
        let calls = scanner().call_sites(HELPER_GROOVY);
        let listed: Vec<_> = calls
            .iter()
            .map(|c| (c.kind, c.target.as_str()))
            .collect();

        assert_eq!(
            listed,
            vec![
                (CallKind::MethodCall, "WebUI.setText"),
                (CallKind::TestObject, "Page_Login/txt_User"),
                (CallKind::MethodCall, "WebUI.setEncryptedText"),
                (CallKind::TestObject, "Page_Login/txt_Password"),
                (CallKind::MethodCall, "submit"),
                (CallKind::MethodCall, "WebUI.verifyElementPresent"),
                (CallKind::TestObject, "Page_Home/lbl_Welcome"),
                (CallKind::MethodCall, "WebUI.click"),
                (CallKind::TestObject, "Page_Login/btn_Login"),
            ]
        );
        assert_eq!(calls[0].line, 13);
    }

    #[test]
    fn test_test_case_script_calls() {
        let script = r#"
WebUI.callTestCase(findTestCase('Test Cases/Common/Open Browser'), [:])
CustomKeywords.'com.acme.auth.LoginHelper.login'(GlobalVariable.user, GlobalVariable.password)
if (CustomKeywords."com.acme.auth.LoginHelper.isLoggedIn"()) {
    WebUI.closeBrowser()
}
"#;
        let calls = scanner().call_sites(script);
        let listed: Vec<_> = calls.iter().map(|c| (c.kind, c.target.as_str(), c.line)).collect();
        assert_eq!(
            listed,
            vec![
                (CallKind::MethodCall, "WebUI.callTestCase", 2),
                (CallKind::TestCase, "Test Cases/Common/Open Browser", 2),
                (CallKind::CustomKeyword, "com.acme.auth.LoginHelper.login", 3),
                (CallKind::CustomKeyword, "com.acme.auth.LoginHelper.isLoggedIn", 4),
                (CallKind::MethodCall, "WebUI.closeBrowser", 5),
            ]
        );
    }

    #[test]
    fn test_unknown_syntax_is_skipped() {
        let garbage = "@Keyword\n}}} def ((( broken\n@Keyword class X {\nfoo(";
        let scanner = scanner();
        assert!(scanner.keywords(garbage, "X", "Keywords/X.groovy").is_empty());
        let _ = scanner.call_sites(garbage);
    }

    #[test]
    fn test_keyword_file_parser_derives_package() {
        let parser = KeywordFileParser::new("Keywords", scanner());
        let file = parser
            .parse(
                "Keywords/com/acme/Nav.groovy",
                "class Nav {\n  @Keyword\n  def open(String url) { WebUI.navigateToUrl(url) }\n}\n",
            )
            .unwrap();

        assert_eq!(file.package, "com.acme");
        assert_eq!(file.class_name, "Nav");
        assert_eq!(file.qualified_class(), "com.acme.Nav");
        assert_eq!(file.keywords[0].qualified_name, "com.acme.Nav.open");
        assert_eq!(parser.package_from_path("Keywords/Top.groovy"), "");
    }

    #[test]
    fn test_suite_script_hooks() {
        let content = "@SetUp(skipped = false)\ndef setUp() {}\n@TearDownTestCase\ndef tdtc() {}\n";
        let script = SuiteScriptParser::new(scanner())
            .parse("Test Suites/Smoke.groovy", content)
            .unwrap();

        assert!(script.has_setup);
        assert!(!script.has_teardown, "@TearDownTestCase is not @TearDown");
        assert!(script.has_teardown_test_case);
        assert!(script.calls.is_empty(), "definitions and annotations are not calls");
    }

    #[test]
    fn test_script_parser() {
        let script = ScriptParser::new(scanner())
            .parse("Scripts/Login/Script1.groovy", "WebUI.openBrowser('')\nWebUI.closeBrowser()\n")
            .unwrap();
        assert_eq!(script.name, "Script1");
        assert_eq!(script.line_count, 2);
        assert_eq!(script.calls.len(), 2);
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("a\nb\nc");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(4), 3);
    }
}
