/*!
# Search

Case-insensitive substring search over the parsed mappings. Nothing is
cached between calls; results keep mapping order (path order, keywords in
declaration order within their file).

| Kind              | Fields                                 |
|-------------------|----------------------------------------|
| test case / suite | name, description                      |
| object / profile  | name, description                      |
| keyword           | name, owning file path, package        |
| keyword file      | class name, path, package              |
| script            | name, path                             |
*/

use serde::Serialize;

use crate::core::{KatalonError, KatalonResult};
use crate::model::ArtifactKind;
use crate::project::ProjectModel;

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub kind: ArtifactKind,
    /// Path of the entity (qualified name for keywords)
    pub key: String,
    pub name: String,
    /// Fields that contained the query
    pub matched_fields: Vec<&'static str>,
}

pub struct SearchIndex<'a> {
    model: &'a ProjectModel,
}

impl<'a> SearchIndex<'a> {
    pub fn new(model: &'a ProjectModel) -> Self {
        Self { model }
    }

    pub fn search(&self, kind: ArtifactKind, query: &str) -> KatalonResult<Vec<SearchMatch>> {
        if query.trim().is_empty() {
            return Err(KatalonError::EmptyQuery {
                query: query.to_string(),
            });
        }
        // surrounding spaces are part of the query
        let needle = query.to_lowercase();

        let model = self.model;
        let mut matches = Vec::new();
        let mut consider = |key: &str, name: &str, fields: &[(&'static str, &str)]| {
            let matched_fields: Vec<&'static str> = fields
                .iter()
                .filter(|(_, value)| value.to_lowercase().contains(&needle))
                .map(|(field, _)| *field)
                .collect();
            if !matched_fields.is_empty() {
                matches.push(SearchMatch {
                    kind,
                    key: key.to_string(),
                    name: name.to_string(),
                    matched_fields,
                });
            }
        };

        match kind {
            ArtifactKind::TestCase => {
                for tc in model.test_cases().values() {
                    consider(
                        tc.path.as_str(),
                        tc.name.as_str(),
                        &[("name", tc.name.as_str()), ("description", tc.description.as_str())],
                    );
                }
            }
            ArtifactKind::TestSuite => {
                for suite in model.test_suites().values() {
                    consider(
                        suite.path.as_str(),
                        suite.name.as_str(),
                        &[("name", suite.name.as_str()), ("description", suite.description.as_str())],
                    );
                }
            }
            ArtifactKind::KeywordFile => {
                for file in model.keyword_files().values() {
                    consider(
                        file.path.as_str(),
                        file.class_name.as_str(),
                        &[
                            ("name", file.class_name.as_str()),
                            ("path", file.path.as_str()),
                            ("package", file.package.as_str()),
                        ],
                    );
                }
            }
            ArtifactKind::Keyword => {
                for file in model.keyword_files().values() {
                    for keyword in &file.keywords {
                        consider(
                            keyword.qualified_name.as_str(),
                            keyword.name.as_str(),
                            &[
                                ("name", keyword.name.as_str()),
                                ("path", file.path.as_str()),
                                ("package", file.package.as_str()),
                            ],
                        );
                    }
                }
            }
            ArtifactKind::RepositoryObject => {
                for object in model.objects().values() {
                    consider(
                        object.path.as_str(),
                        object.name.as_str(),
                        &[("name", object.name.as_str()), ("description", object.description.as_str())],
                    );
                }
            }
            ArtifactKind::Profile => {
                for profile in model.profiles().values() {
                    consider(
                        profile.path.as_str(),
                        profile.name.as_str(),
                        &[("name", profile.name.as_str()), ("description", profile.description.as_str())],
                    );
                }
            }
            ArtifactKind::Script => {
                for script in model.scripts().values() {
                    consider(
                        script.path.as_str(),
                        script.name.as_str(),
                        &[("name", script.name.as_str()), ("path", script.path.as_str())],
                    );
                }
            }
        }

        tracing::debug!("search {} {:?}: {} matches", kind, query, matches.len());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Keyword, KeywordFile, TestCase};

    fn test_case(path: &str, name: &str, description: &str) -> TestCase {
        TestCase {
            path: path.to_string(),
            id: path.trim_end_matches(".tc").to_string(),
            name: name.to_string(),
            description: description.to_string(),
            tag: None,
            comment: None,
            record_option: None,
            guid: None,
            script_path: None,
            steps: Vec::new(),
        }
    }

    fn model() -> ProjectModel {
        let mut model = ProjectModel::new("/p");
        for tc in [
            test_case("Test Cases/B.tc", "Checkout", "pays with LOGIN token"),
            test_case("Test Cases/A.tc", "Valid Login", ""),
            test_case("Test Cases/C.tc", "Search", "finds items"),
        ] {
            model.test_cases.insert(tc.path.clone(), tc);
        }
        model.keyword_files.insert(
            "Keywords/com/acme/Auth.groovy".to_string(),
            KeywordFile {
                path: "Keywords/com/acme/Auth.groovy".to_string(),
                package: "com.acme".to_string(),
                class_name: "Auth".to_string(),
                keywords: vec![Keyword {
                    name: "signIn".to_string(),
                    qualified_name: "com.acme.Auth.signIn".to_string(),
                    file: "Keywords/com/acme/Auth.groovy".to_string(),
                    parameters: Vec::new(),
                    param_count: 0,
                    line: 3,
                }],
                imports: Vec::new(),
                calls: Vec::new(),
            },
        );
        model
    }

    #[test]
    fn test_search_test_cases_in_mapping_order() {
        let model = model();
        let matches = SearchIndex::new(&model).search(ArtifactKind::TestCase, "login").unwrap();
        let keys: Vec<_> = matches.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["Test Cases/A.tc", "Test Cases/B.tc"]);
        assert_eq!(matches[1].matched_fields, vec!["description"]);
    }

    #[test]
    fn test_keyword_search_covers_path_and_package() {
        let model = model();
        let index = SearchIndex::new(&model);
        assert_eq!(index.search(ArtifactKind::Keyword, "ACME").unwrap().len(), 1);
        assert_eq!(index.search(ArtifactKind::Keyword, "auth.groovy").unwrap()[0].key, "com.acme.Auth.signIn");
        assert!(index.search(ArtifactKind::Keyword, "logout").unwrap().is_empty());
    }

    #[test]
    fn test_query_is_not_trimmed() {
        let model = model();
        let index = SearchIndex::new(&model);
        assert!(index.search(ArtifactKind::TestCase, "valid ").unwrap().is_empty());

        let keys: Vec<String> = index
            .search(ArtifactKind::TestCase, "valid login")
            .unwrap()
            .into_iter()
            .map(|m| m.key)
            .collect();
        assert_eq!(keys, vec!["Test Cases/A.tc"]);
        assert_eq!(index.search(ArtifactKind::TestCase, " login").unwrap().len(), 2);
    }

    #[test]
    fn test_blank_query_is_rejected() {
        let model = model();
        let index = SearchIndex::new(&model);
        for query in ["", "   ", "\t\n"] {
            assert!(matches!(
                index.search(ArtifactKind::TestCase, query),
                Err(KatalonError::EmptyQuery { .. })
            ));
        }
    }
}
