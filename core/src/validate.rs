//! Argument validation and defaulting against an operation's schema.
//!
//! # Design
//! `validate` is a pure function of the descriptor and the caller's
//! `Arguments`. Rules run in a fixed precedence so the reported error is
//! deterministic: minimum length, unknown names, types, mutual exclusion,
//! required, conditional requirement, vocabulary, date format, numeric range.
//! Defaults are applied last and never replace a supplied value.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::catalog::{DefaultValue, OperationDescriptor, ParamKind, ParamSpec};
use crate::error::ValidationError;

/// A single argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<String>),
}

impl ArgValue {
    /// Empty text and empty lists do not count as populated.
    pub fn is_populated(&self) -> bool {
        match self {
            ArgValue::Text(s) => !s.is_empty(),
            ArgValue::List(items) => items.iter().any(|s| !s.is_empty()),
            ArgValue::Integer(_) | ArgValue::Boolean(_) => true,
        }
    }

    /// Wire form: lists are comma-joined.
    pub fn render(&self) -> String {
        match self {
            ArgValue::Text(s) => s.clone(),
            ArgValue::Integer(n) => n.to_string(),
            ArgValue::Boolean(b) => b.to_string(),
            ArgValue::List(items) => items.join(","),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Integer(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Integer(value.into())
    }
}

impl From<u32> for ArgValue {
    fn from(value: u32) -> Self {
        ArgValue::Integer(value.into())
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Boolean(value)
    }
}

impl From<Vec<String>> for ArgValue {
    fn from(value: Vec<String>) -> Self {
        ArgValue::List(value)
    }
}

impl From<&[&str]> for ArgValue {
    fn from(value: &[&str]) -> Self {
        ArgValue::List(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ArgValue {
    fn from(value: [&str; N]) -> Self {
        ArgValue::List(value.iter().map(|s| s.to_string()).collect())
    }
}

impl From<DefaultValue> for ArgValue {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::Text(s) => ArgValue::Text(s.to_string()),
            DefaultValue::Integer(n) => ArgValue::Integer(n),
            DefaultValue::Boolean(b) => ArgValue::Boolean(b),
        }
    }
}

/// Caller-supplied arguments for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    values: BTreeMap<String, ArgValue>,
    api_version: Option<String>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ArgValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Override the operation's declared API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Arguments that passed every rule, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedArguments {
    pub values: BTreeMap<&'static str, ArgValue>,
    pub api_version: String,
}

impl ValidatedArguments {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }
}

pub fn validate(
    desc: &OperationDescriptor,
    args: &Arguments,
) -> Result<ValidatedArguments, ValidationError> {
    check_min_lengths(desc, args)?;
    let values = check_names_and_types(desc, args)?;
    let populated = populated_groups(desc, &values);
    check_exclusive_groups(desc, &populated)?;

    for spec in desc.params.iter().filter(|p| p.required) {
        if !values.get(spec.name).is_some_and(ArgValue::is_populated) {
            return Err(ValidationError::MissingParameter { param: spec.name });
        }
    }

    check_conditions(desc, &values, &populated)?;

    for (name, value) in &values {
        let Some(spec) = desc.param(name) else { continue };
        check_vocabulary(spec, value)?;
        check_date(spec, value)?;
        check_range(spec, value)?;
    }

    let mut values = values;
    for spec in desc.params {
        if values.contains_key(spec.name) {
            continue;
        }
        if let Some(default) = effective_default(spec, &populated) {
            values.insert(spec.name, default.into());
        }
    }

    Ok(ValidatedArguments {
        values,
        api_version: args
            .api_version
            .clone()
            .unwrap_or_else(|| desc.api_version.to_string()),
    })
}

fn check_min_lengths(desc: &OperationDescriptor, args: &Arguments) -> Result<(), ValidationError> {
    for (name, value) in &args.values {
        let Some(spec) = desc.param(name) else { continue };
        if let (Some(min), ArgValue::Text(text)) = (spec.min_len, value) {
            let actual = text.chars().count();
            if actual < min {
                return Err(ValidationError::KeywordTooShort {
                    param: spec.name,
                    min,
                    actual,
                });
            }
        }
    }
    Ok(())
}

fn check_names_and_types(
    desc: &OperationDescriptor,
    args: &Arguments,
) -> Result<BTreeMap<&'static str, ArgValue>, ValidationError> {
    let mut values = BTreeMap::new();
    for (name, value) in &args.values {
        let spec = desc
            .param(name)
            .ok_or_else(|| ValidationError::UnknownParameter { param: name.clone() })?;
        let value = match (spec.kind, value) {
            (ParamKind::Text, ArgValue::Text(_))
            | (ParamKind::Integer, ArgValue::Integer(_))
            | (ParamKind::Boolean, ArgValue::Boolean(_))
            | (ParamKind::List, ArgValue::List(_)) => value.clone(),
            // "1,2" is accepted for a multi-valued filter.
            (ParamKind::List, ArgValue::Text(text)) => ArgValue::List(
                text.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            (kind, _) => {
                return Err(ValidationError::InvalidParameterType {
                    param: spec.name,
                    expected: kind.describe(),
                })
            }
        };
        values.insert(spec.name, value);
    }
    Ok(values)
}

fn populated_groups(
    desc: &OperationDescriptor,
    values: &BTreeMap<&'static str, ArgValue>,
) -> BTreeSet<&'static str> {
    desc.params
        .iter()
        .filter(|spec| values.get(spec.name).is_some_and(ArgValue::is_populated))
        .filter_map(|spec| spec.group)
        .collect()
}

fn check_exclusive_groups(
    desc: &OperationDescriptor,
    populated: &BTreeSet<&'static str>,
) -> Result<(), ValidationError> {
    let mut hits = desc
        .exclusive_groups
        .iter()
        .copied()
        .filter(|g| populated.contains(g));
    if let (Some(first), Some(second)) = (hits.next(), hits.next()) {
        return Err(ValidationError::ConflictingParameters { first, second });
    }
    Ok(())
}

fn check_conditions(
    desc: &OperationDescriptor,
    values: &BTreeMap<&'static str, ArgValue>,
    populated: &BTreeSet<&'static str>,
) -> Result<(), ValidationError> {
    for spec in desc.params {
        let Some(cond) = spec.required_when else { continue };
        if values.get(spec.name).is_some_and(ArgValue::is_populated) {
            continue;
        }
        let trigger_value = match values.get(cond.trigger) {
            Some(value) => Some(value.render()),
            None => desc
                .param(cond.trigger)
                .and_then(|t| effective_default(t, populated))
                .map(|d| ArgValue::from(d).render()),
        };
        if trigger_value.as_deref() == Some(cond.equals) {
            return Err(ValidationError::MissingConditionalParameter {
                param: spec.name,
                trigger: cond.trigger,
                trigger_value: cond.equals,
            });
        }
    }
    Ok(())
}

fn check_vocabulary(spec: &ParamSpec, value: &ArgValue) -> Result<(), ValidationError> {
    let Some(vocabulary) = spec.allowed else { return Ok(()) };
    let candidates: Vec<&str> = match value {
        ArgValue::Text(s) => vec![s.as_str()],
        ArgValue::List(items) => items.iter().map(String::as_str).collect(),
        _ => Vec::new(),
    };
    match candidates.into_iter().find(|c| !vocabulary.contains(c)) {
        Some(bad) => Err(ValidationError::InvalidEnumValue {
            param: spec.name,
            value: bad.to_string(),
            allowed: vocabulary.describe(),
        }),
        None => Ok(()),
    }
}

fn check_date(spec: &ParamSpec, value: &ArgValue) -> Result<(), ValidationError> {
    if !spec.date {
        return Ok(());
    }
    if let ArgValue::Text(text) = value {
        if !is_compact_date(text) {
            return Err(ValidationError::InvalidDateFormat {
                param: spec.name,
                value: text.clone(),
            });
        }
    }
    Ok(())
}

/// Eight ASCII digits forming a real calendar date.
pub fn is_compact_date(text: &str) -> bool {
    text.len() == 8
        && text.bytes().all(|b| b.is_ascii_digit())
        && NaiveDate::parse_from_str(text, "%Y%m%d").is_ok()
}

fn check_range(spec: &ParamSpec, value: &ArgValue) -> Result<(), ValidationError> {
    if let (Some((min, max)), ArgValue::Integer(n)) = (spec.range, value) {
        if !(min..=max).contains(n) {
            return Err(ValidationError::OutOfRange {
                param: spec.name,
                value: *n,
                min,
                max,
            });
        }
    }
    Ok(())
}

fn effective_default(spec: &ParamSpec, populated: &BTreeSet<&'static str>) -> Option<DefaultValue> {
    match spec.group {
        Some(group) if !populated.contains(group) => None,
        _ => spec.default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Operation;

    fn check(op: Operation, args: &Arguments) -> Result<ValidatedArguments, ValidationError> {
        validate(op.descriptor(), args)
    }

    #[test]
    fn short_keyword_is_rejected_everywhere_it_is_declared() {
        for op in Operation::ALL {
            let desc = op.descriptor();
            let Some(spec) = desc.param("keyword") else { continue };
            assert_eq!(spec.min_len, Some(3), "{op}");
            let err = validate(desc, &Arguments::new().with("keyword", "py")).unwrap_err();
            assert_eq!(
                err,
                ValidationError::KeywordTooShort {
                    param: "keyword",
                    min: 3,
                    actual: 2
                },
                "{op}"
            );
        }
    }

    #[test]
    fn short_keyword_wins_over_conflicts() {
        let args = Arguments::new()
            .with("keyword", "ab")
            .with("taggingCodes", ["1"])
            .with("bogus", 1);
        let err = check(Operation::SearchCoursesByTagging, &args).unwrap_err();
        assert!(matches!(err, ValidationError::KeywordTooShort { .. }));
    }

    #[test]
    fn keyword_length_counts_characters_not_bytes() {
        let args = Arguments::new().with("keyword", "日本語");
        assert!(check(Operation::CourseCategories, &args).is_ok());
    }

    #[test]
    fn keyword_and_tagging_conflict() {
        let args = Arguments::new().with("keyword", "python").with("taggingCodes", ["1"]);
        for op in [Operation::SearchCoursesByKeyword, Operation::SearchCoursesByTagging] {
            let err = check(op, &args).unwrap_err();
            assert_eq!(
                err,
                ValidationError::ConflictingParameters {
                    first: "keyword",
                    second: "tagging"
                }
            );
        }
    }

    #[test]
    fn either_group_alone_is_accepted() {
        let keyword = Arguments::new().with("keyword", "python");
        assert!(check(Operation::SearchCoursesByKeyword, &keyword).is_ok());

        let tagging = Arguments::new()
            .with("taggingCodes", ["1", "2"])
            .with("courseSupportEndDate", "20250101");
        assert!(check(Operation::SearchCoursesByTagging, &tagging).is_ok());
    }

    #[test]
    fn empty_filter_does_not_count_as_populated() {
        let args = Arguments::new()
            .with("keyword", "python")
            .with("taggingCodes", Vec::<String>::new());
        assert!(check(Operation::SearchCoursesByKeyword, &args).is_ok());
    }

    #[test]
    fn job_role_keyword_conflicts_with_filters() {
        let args = Arguments::new().with("keyword", "engineer").with("qualification", "Degree");
        let err = check(Operation::JobRoles, &args).unwrap_err();
        assert_eq!(
            err,
            ValidationError::ConflictingParameters {
                first: "keyword",
                second: "filters"
            }
        );
        assert!(check(Operation::JobRoles, &Arguments::new().with("sector", "S1,S2")).is_ok());
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = check(Operation::CourseTags, &Arguments::new().with("order", "asc")).unwrap_err();
        assert_eq!(err, ValidationError::UnknownParameter { param: "order".into() });
    }

    #[test]
    fn wrong_type_is_rejected() {
        let args = Arguments::new().with("keyword", "python").with("pageSize", "5");
        let err = check(Operation::SearchCoursesByKeyword, &args).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidParameterType {
                param: "pageSize",
                expected: "an integer"
            }
        );
    }

    #[test]
    fn missing_required_parameter() {
        let args = Arguments::new().with("taggingCodes", ["1"]);
        let err = check(Operation::SearchCoursesByTagging, &args).unwrap_err();
        assert_eq!(err, ValidationError::MissingParameter { param: "courseSupportEndDate" });
    }

    #[test]
    fn delta_retrieval_requires_last_update_date() {
        let base = Arguments::new()
            .with("taggingCodes", ["FULL"])
            .with("courseSupportEndDate", "20250101")
            .with("retrieveType", "DELTA");
        let err = check(Operation::SearchCoursesByTagging, &base).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingConditionalParameter {
                param: "lastUpdateDate",
                trigger: "retrieveType",
                trigger_value: "DELTA"
            }
        );

        let ok = base.with("lastUpdateDate", "20240601");
        assert!(check(Operation::SearchCoursesByTagging, &ok).is_ok());
    }

    #[test]
    fn full_retrieval_does_not_need_last_update_date() {
        let args = Arguments::new()
            .with("taggingCodes", ["1"])
            .with("courseSupportEndDate", "20250101");
        let validated = check(Operation::SearchCoursesByTagging, &args).unwrap();
        assert_eq!(validated.get("retrieveType"), Some(&ArgValue::Text("FULL".into())));
        assert!(validated.get("lastUpdateDate").is_none());
    }

    #[test]
    fn enum_membership_is_case_sensitive() {
        let args = Arguments::new().with("taggingCode", "wsq");
        let err = check(Operation::PopularCourses, &args).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidEnumValue {
                param: "taggingCode",
                value: "wsq".into(),
                allowed: "WSQ, CET, PET, SFC, PA".into()
            }
        );
    }

    #[test]
    fn every_list_element_is_checked() {
        let args = Arguments::new()
            .with("taggingCodes", ["1", "30050", "77"])
            .with("courseSupportEndDate", "20250101");
        let err = check(Operation::SearchCoursesByTagging, &args).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidEnumValue { ref value, .. } if value == "77"));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for bad in ["2025-01-01", "2025011", "20251301", "20250230", "2025O101"] {
            let args = Arguments::new()
                .with("taggingCodes", ["1"])
                .with("courseSupportEndDate", bad);
            let err = check(Operation::SearchCoursesByTagging, &args).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidDateFormat { .. }), "{bad}");
        }
    }

    #[test]
    fn page_size_range_is_enforced_for_job_roles() {
        let err = check(Operation::JobRoles, &Arguments::new().with("pageSize", 101)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { max: 100, .. }));
    }

    #[test]
    fn sector_listing_defaults_and_explicit_page() {
        let defaulted = check(Operation::Sectors, &Arguments::new()).unwrap();
        assert_eq!(defaulted.integer("page"), Some(0));
        assert_eq!(defaulted.integer("pageSize"), Some(20));

        let paged = check(Operation::Sectors, &Arguments::new().with("page", 1)).unwrap();
        assert_eq!(paged.integer("page"), Some(1));
        assert_eq!(paged.integer("pageSize"), Some(20));
    }

    #[test]
    fn negative_page_and_zero_page_size_are_rejected() {
        let err = check(
            Operation::SearchCoursesByKeyword,
            &Arguments::new().with("keyword", "python").with("page", -1),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { param: "page", value: -1, min: 0, .. }));

        let err = check(
            Operation::PopularCourses,
            &Arguments::new().with("pageSize", 0),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { param: "pageSize", value: 0, min: 1, .. }));
    }

    #[test]
    fn defaults_fill_unset_values_only() {
        let args = Arguments::new().with("keyword", "python").with("page", 0).with("pageSize", 5);
        let validated = check(Operation::SearchCoursesByKeyword, &args).unwrap();
        assert_eq!(validated.integer("pageSize"), Some(5));
        assert_eq!(validated.integer("page"), Some(0));
        assert_eq!(validated.api_version, "v2.1");

        let defaulted =
            check(Operation::SearchCoursesByKeyword, &Arguments::new().with("keyword", "python")).unwrap();
        assert_eq!(defaulted.integer("pageSize"), Some(10));
        assert_eq!(defaulted.integer("page"), Some(0));
    }

    #[test]
    fn grouped_defaults_stay_out_of_unpopulated_groups() {
        let validated =
            check(Operation::SearchCoursesByKeyword, &Arguments::new().with("keyword", "python")).unwrap();
        assert!(validated.get("retrieveType").is_none());
        assert_eq!(validated.values.len(), 3);
    }

    #[test]
    fn explicit_empty_value_is_kept() {
        let args = Arguments::new().with("keyword", "python").with("taggingCodes", Vec::<String>::new());
        let validated = check(Operation::SearchCoursesByKeyword, &args).unwrap();
        assert_eq!(validated.get("taggingCodes"), Some(&ArgValue::List(Vec::new())));
    }

    #[test]
    fn explicit_version_overrides_default() {
        let args = Arguments::new().with("keyword", "python").api_version("v2.0");
        let validated = check(Operation::SearchCoursesByKeyword, &args).unwrap();
        assert_eq!(validated.api_version, "v2.0");
    }

    #[test]
    fn validation_is_idempotent() {
        let args = Arguments::new()
            .with("taggingCodes", "1, 2")
            .with("courseSupportEndDate", "20250101");
        let first = check(Operation::SearchCoursesByTagging, &args).unwrap();
        let second = check(Operation::SearchCoursesByTagging, &args).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.get("taggingCodes"),
            Some(&ArgValue::List(vec!["1".into(), "2".into()]))
        );
    }
}
