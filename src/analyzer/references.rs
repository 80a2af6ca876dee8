/*!
# Reference Resolver

Turns the call sites and suite entries of every referrer body into the
[`UsageIndex`]: keyword / object / test case -> set of referrers.

Referrers are test cases (steps of the bound script), test suites (their
`testCaseLink` entries only), suite scripts, keyword files and unbound
scripts. Only test-suite referrers count towards coverage. Each body is scanned
independently on the rayon pool; partial indexes are merged by set union,
so the result does not depend on scan order.

Matching is textual. Names inside comments and string literals count as
references.
*/

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::config::ProjectLayout;
use crate::core::UnresolvedReference;
use crate::model::{ArtifactKind, CallKind, CallSite, SuiteEntry};
use crate::project::ProjectModel;

/// Entity whose body refers to other artifacts
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Referrer {
    pub kind: ArtifactKind,
    pub path: String,
}

impl Referrer {
    pub fn new(kind: ArtifactKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

pub type ReferrerSet = BTreeSet<Referrer>;

/// Reverse usage index of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageIndex {
    /// Qualified keyword name -> referrers
    keywords: BTreeMap<String, ReferrerSet>,
    /// Object id -> referrers
    objects: BTreeMap<String, ReferrerSet>,
    /// Test case id -> referrers
    test_cases: BTreeMap<String, ReferrerSet>,
    unresolved: BTreeSet<UnresolvedReference>,
}

impl UsageIndex {
    pub fn keywords(&self) -> &BTreeMap<String, ReferrerSet> {
        &self.keywords
    }

    pub fn objects(&self) -> &BTreeMap<String, ReferrerSet> {
        &self.objects
    }

    pub fn test_cases(&self) -> &BTreeMap<String, ReferrerSet> {
        &self.test_cases
    }

    pub fn unresolved(&self) -> &BTreeSet<UnresolvedReference> {
        &self.unresolved
    }

    pub fn keyword_referrers(&self, qualified_name: &str) -> usize {
        self.keywords.get(qualified_name).map_or(0, BTreeSet::len)
    }

    pub fn object_referrers(&self, id: &str) -> usize {
        self.objects.get(id).map_or(0, BTreeSet::len)
    }

    /// Referrers of a test case that are test suites
    pub fn suite_referrers(&self, test_case_id: &str) -> usize {
        self.test_cases.get(test_case_id).map_or(0, |referrers| {
            referrers
                .iter()
                .filter(|r| r.kind == ArtifactKind::TestSuite)
                .count()
        })
    }

    /// Set union of two indexes
    pub fn merge(mut self, other: UsageIndex) -> UsageIndex {
        for (target, referrers) in other.keywords {
            self.keywords.entry(target).or_default().extend(referrers);
        }
        for (target, referrers) in other.objects {
            self.objects.entry(target).or_default().extend(referrers);
        }
        for (target, referrers) in other.test_cases {
            self.test_cases.entry(target).or_default().extend(referrers);
        }
        self.unresolved.extend(other.unresolved);
        self
    }

    fn credit(map: &mut BTreeMap<String, ReferrerSet>, target: &str, referrer: &Referrer) {
        map.entry(target.to_string())
            .or_default()
            .insert(referrer.clone());
    }
}

/// `Test Cases/X`, `X`, `X.tc` -> `Test Cases/X`
pub fn normalize_test_case_ref(raw: &str, test_cases_dir: &str) -> String {
    let dir = test_cases_dir.trim_matches('/');
    let trimmed = raw.trim().trim_start_matches('/');
    let id = trimmed.strip_suffix(".tc").unwrap_or(trimmed);

    let has_prefix = id
        .strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'));
    if has_prefix {
        id.to_string()
    } else {
        format!("{}/{}", dir, id)
    }
}

/// `Object Repository/Page/btn.rs`, `Page/btn` -> `Page/btn`
pub fn normalize_object_ref<'a>(raw: &'a str, repository_dir: &str) -> &'a str {
    let dir = repository_dir.trim_matches('/');
    let trimmed = raw.trim().trim_start_matches('/');
    let below = trimmed
        .strip_prefix(dir)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(trimmed);
    below.strip_suffix(".rs").unwrap_or(below)
}

/// One scannable body
struct Body<'m> {
    referrer: Referrer,
    calls: &'m [CallSite],
    entries: &'m [SuiteEntry],
}

/// Lookup tables over the parsed model
pub struct ReferenceResolver<'m> {
    model: &'m ProjectModel,
    test_cases_dir: String,
    repository_dir: String,
    /// qualified name -> itself (for exact lookups)
    qualified: HashSet<&'m str>,
    /// `Class.method` -> qualified names
    by_class_method: HashMap<String, BTreeSet<&'m str>>,
    /// bare name -> qualified names
    by_name: HashMap<&'m str, BTreeSet<&'m str>>,
    object_ids: HashSet<&'m str>,
    objects_by_name: HashMap<&'m str, BTreeSet<&'m str>>,
    test_case_ids: HashSet<&'m str>,
}

impl<'m> ReferenceResolver<'m> {
    pub fn new(model: &'m ProjectModel, layout: &ProjectLayout) -> Self {
        let mut qualified = HashSet::new();
        let mut by_class_method: HashMap<String, BTreeSet<&str>> = HashMap::new();
        let mut by_name: HashMap<&str, BTreeSet<&str>> = HashMap::new();

        for file in model.keyword_files().values() {
            for keyword in &file.keywords {
                let name = keyword.qualified_name.as_str();
                qualified.insert(name);
                by_class_method
                    .entry(format!("{}.{}", file.class_name, keyword.name))
                    .or_default()
                    .insert(name);
                by_name.entry(keyword.name.as_str()).or_default().insert(name);
            }
        }

        let mut object_ids = HashSet::new();
        let mut objects_by_name: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for object in model.objects().values() {
            object_ids.insert(object.id.as_str());
            objects_by_name
                .entry(object.name.as_str())
                .or_default()
                .insert(object.id.as_str());
        }

        Self {
            model,
            test_cases_dir: layout.test_cases_dir.clone(),
            repository_dir: layout.object_repository_dir.clone(),
            qualified,
            by_class_method,
            by_name,
            object_ids,
            objects_by_name,
            test_case_ids: model.test_cases().values().map(|tc| tc.id.as_str()).collect(),
        }
    }

    /// Builds the usage index; scans run on the current rayon pool
    pub fn resolve(&self) -> UsageIndex {
        let bodies = self.bodies();
        tracing::debug!("Scanning {} referrer bodies", bodies.len());

        let mut index = bodies
            .par_iter()
            .map(|body| self.scan(body))
            .reduce(UsageIndex::default, UsageIndex::merge);

        // every known target is listed, used or not
        for keyword in self.model.keywords() {
            index.keywords.entry(keyword.qualified_name.clone()).or_default();
        }
        for object in self.model.objects().values() {
            index.objects.entry(object.id.clone()).or_default();
        }
        for tc in self.model.test_cases().values() {
            index.test_cases.entry(tc.id.clone()).or_default();
        }

        tracing::info!(
            "Resolved references: {} keywords, {} objects, {} test cases, {} unresolved",
            index.keywords.values().filter(|r| !r.is_empty()).count(),
            index.objects.values().filter(|r| !r.is_empty()).count(),
            index.test_cases.values().filter(|r| !r.is_empty()).count(),
            index.unresolved.len()
        );
        index
    }

    fn bodies(&self) -> Vec<Body<'m>> {
        let model = self.model;
        let mut bodies = Vec::new();

        for tc in model.test_cases().values() {
            bodies.push(Body {
                referrer: Referrer::new(ArtifactKind::TestCase, tc.path.as_str()),
                calls: &tc.steps,
                entries: &[],
            });
        }
        for suite in model.test_suites().values() {
            bodies.push(Body {
                referrer: Referrer::new(ArtifactKind::TestSuite, suite.path.as_str()),
                calls: &[],
                entries: &suite.test_cases,
            });
            // hooks are code, not suite membership
            if let Some(script) = &suite.script {
                bodies.push(Body {
                    referrer: Referrer::new(ArtifactKind::Script, script.path.as_str()),
                    calls: &script.calls,
                    entries: &[],
                });
            }
        }
        for file in model.keyword_files().values() {
            bodies.push(Body {
                referrer: Referrer::new(ArtifactKind::KeywordFile, file.path.as_str()),
                calls: &file.calls,
                entries: &[],
            });
        }
        // bound scripts are credited to their test case
        for script in model.scripts().values().filter(|s| s.bound_test_case.is_none()) {
            bodies.push(Body {
                referrer: Referrer::new(ArtifactKind::Script, script.path.as_str()),
                calls: &script.calls,
                entries: &[],
            });
        }

        bodies
    }

    fn scan(&self, body: &Body<'_>) -> UsageIndex {
        let mut index = UsageIndex::default();
        let referrer = &body.referrer;

        for call in body.calls {
            match call.kind {
                CallKind::CustomKeyword => {
                    let targets = self.keyword_targets(call, false);
                    if targets.is_empty() {
                        index.unresolved.insert(self.unresolved(referrer, ArtifactKind::Keyword, &call.target));
                    }
                    for target in targets {
                        UsageIndex::credit(&mut index.keywords, target, referrer);
                    }
                }
                CallKind::MethodCall => {
                    for target in self.keyword_targets(call, true) {
                        UsageIndex::credit(&mut index.keywords, target, referrer);
                    }
                }
                CallKind::TestObject => {
                    let targets = self.object_targets(&call.target);
                    if targets.is_empty() {
                        index.unresolved.insert(self.unresolved(
                            referrer,
                            ArtifactKind::RepositoryObject,
                            &call.target,
                        ));
                    }
                    for target in targets {
                        UsageIndex::credit(&mut index.objects, target, referrer);
                    }
                }
                CallKind::TestCase => self.credit_test_case(&mut index, referrer, &call.target),
            }
        }

        for entry in body.entries {
            self.credit_test_case(&mut index, referrer, &entry.test_case_id);
        }

        index
    }

    /// Qualified names a keyword call resolves to
    fn keyword_targets(&self, call: &CallSite, allow_suffix: bool) -> Vec<&'m str> {
        if let Some(exact) = self.qualified.get(call.target.as_str()) {
            return vec![*exact];
        }

        if allow_suffix {
            let mut segments = call.target.rsplit('.');
            if let (Some(method), Some(class)) = (segments.next(), segments.next()) {
                if let Some(found) = self.by_class_method.get(&format!("{}.{}", class, method)) {
                    return found.iter().copied().collect();
                }
            }
        }

        self.by_name
            .get(call.bare_name())
            .map(|found| found.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Object ids a `findTestObject` argument resolves to
    fn object_targets(&self, raw: &str) -> Vec<&'m str> {
        let id = normalize_object_ref(raw, &self.repository_dir);
        if let Some(exact) = self.object_ids.get(id) {
            return vec![*exact];
        }
        if !id.contains('/') {
            if let Some(found) = self.objects_by_name.get(id) {
                return found.iter().copied().collect();
            }
        }
        Vec::new()
    }

    fn credit_test_case(&self, index: &mut UsageIndex, referrer: &Referrer, raw: &str) {
        let id = normalize_test_case_ref(raw, &self.test_cases_dir);
        if self.test_case_ids.contains(id.as_str()) {
            UsageIndex::credit(&mut index.test_cases, &id, referrer);
        } else {
            index.unresolved.insert(self.unresolved(referrer, ArtifactKind::TestCase, raw));
        }
    }

    fn unresolved(&self, referrer: &Referrer, target_kind: ArtifactKind, target: &str) -> UnresolvedReference {
        UnresolvedReference {
            referrer: referrer.path.clone(),
            target_kind,
            target: target.to_string(),
        }
    }
}
