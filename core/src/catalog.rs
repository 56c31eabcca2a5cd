//! Static table of every operation the client knows how to call.
//!
//! # Design
//! Each `OperationDescriptor` is plain `'static` data: path template, version,
//! required channel, parameter schema, envelope shape, and pagination path.
//! The validator, builder, and normalizer interpret these tables uniformly, so
//! adding an endpoint means adding a row here rather than a new function.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Secure channel an operation must be called over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthChannel {
    Anonymous,
    /// Mutual TLS with a client certificate.
    Certificate,
    /// Subscription-approved OAuth access; certificate callers get 403.
    OAuth,
}

impl AuthChannel {
    /// Whether a transport providing `self` can carry an operation requiring `required`.
    pub fn satisfies(self, required: AuthChannel) -> bool {
        required == AuthChannel::Anonymous || self == required
    }
}

impl fmt::Display for AuthChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthChannel::Anonymous => "anonymous",
            AuthChannel::Certificate => "certificate",
            AuthChannel::OAuth => "OAuth",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Integer,
    Boolean,
    /// Multi-valued text, serialized comma-joined.
    List,
}

impl ParamKind {
    pub fn describe(self) -> &'static str {
        match self {
            ParamKind::Text => "text",
            ParamKind::Integer => "an integer",
            ParamKind::Boolean => "a boolean",
            ParamKind::List => "a list of values",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Text(&'static str),
    Integer(i64),
    Boolean(bool),
}

/// Closed set of accepted values, optionally extended with numeric ranges.
#[derive(Debug, PartialEq, Eq)]
pub struct Vocabulary {
    pub values: &'static [&'static str],
    pub ranges: &'static [(u32, u32)],
}

impl Vocabulary {
    /// Case-sensitive membership.
    pub fn contains(&self, value: &str) -> bool {
        if self.values.contains(&value) {
            return true;
        }
        if value.starts_with('0') {
            return false;
        }
        match value.parse::<u32>() {
            Ok(n) => self.ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&n)),
            Err(_) => false,
        }
    }

    pub fn describe(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_string())
            .chain(self.ranges.iter().map(|(lo, hi)| format!("{lo}-{hi}")))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `param` must be present whenever `trigger` holds `equals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub trigger: &'static str,
    pub equals: &'static str,
}

/// One entry of an operation's parameter schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub location: ParamLocation,
    pub kind: ParamKind,
    pub required: bool,
    pub min_len: Option<usize>,
    pub allowed: Option<&'static Vocabulary>,
    pub date: bool,
    pub range: Option<(i64, i64)>,
    /// Mutual-exclusion group. A grouped default only applies once the group is populated.
    pub group: Option<&'static str>,
    pub required_when: Option<Condition>,
    pub default: Option<DefaultValue>,
}

impl ParamSpec {
    const fn new(name: &'static str, location: ParamLocation, kind: ParamKind) -> Self {
        Self {
            name,
            location,
            kind,
            required: false,
            min_len: None,
            allowed: None,
            date: false,
            range: None,
            group: None,
            required_when: None,
            default: None,
        }
    }

    pub const fn query(name: &'static str, kind: ParamKind) -> Self {
        Self::new(name, ParamLocation::Query, kind)
    }

    /// Path parameters are always required.
    pub const fn path(name: &'static str, kind: ParamKind) -> Self {
        Self::new(name, ParamLocation::Path, kind).required()
    }

    pub const fn header(name: &'static str, header: &'static str, kind: ParamKind) -> Self {
        Self::new(name, ParamLocation::Header(header), kind)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn min_len(mut self, min: usize) -> Self {
        self.min_len = Some(min);
        self
    }

    pub const fn one_of(mut self, vocabulary: &'static Vocabulary) -> Self {
        self.allowed = Some(vocabulary);
        self
    }

    pub const fn date(mut self) -> Self {
        self.date = true;
        self
    }

    pub const fn range(mut self, min: i64, max: i64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub const fn in_group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    pub const fn required_when(mut self, trigger: &'static str, equals: &'static str) -> Self {
        self.required_when = Some(Condition { trigger, equals });
        self
    }

    pub const fn default_value(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// Where the records live inside `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// `data.<field>`.
    Keyed(&'static str),
    /// `data` itself is the record sequence.
    Sequence,
}

#[derive(Debug)]
pub struct OperationDescriptor {
    pub operation: Operation,
    pub name: &'static str,
    pub path: &'static str,
    pub method: HttpMethod,
    pub api_version: &'static str,
    pub channel: AuthChannel,
    pub params: &'static [ParamSpec],
    /// Groups of which at most one may be populated per call.
    pub exclusive_groups: &'static [&'static str],
    pub envelope: Envelope,
    /// JSON path to the total record count, when the operation paginates.
    pub total_path: Option<&'static [&'static str]>,
    /// Record field renames (`from`, `to`) for upstream naming quirks.
    pub renames: &'static [(&'static str, &'static str)],
}

impl OperationDescriptor {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Placeholder names in the path template, in order of appearance.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let path: &'static str = self.path;
        path.split('/')
            .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
            .collect()
    }
}

macro_rules! operations {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Every logical operation in the catalog.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $($variant),+
        }

        impl Operation {
            pub const ALL: &'static [Operation] = &[$(Operation::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Operation::$variant => $name),+
                }
            }
        }
    };
}

operations! {
    CourseCategories => "course_categories",
    CourseTags => "course_tags",
    SearchCoursesByKeyword => "search_courses_by_keyword",
    SearchCoursesByTagging => "search_courses_by_tagging",
    CourseAutocomplete => "course_autocomplete",
    CourseSubcategories => "course_subcategories",
    CourseDetails => "course_details",
    RelatedCourses => "related_courses",
    PopularCourses => "popular_courses",
    FeaturedCourses => "featured_courses",
    JobRoles => "job_roles",
    JobRoleTitles => "job_role_titles",
    GenericSkillsAutocomplete => "generic_skills_autocomplete",
    TechnicalSkillsAutocomplete => "technical_skills_autocomplete",
    GenericSkillsAutocompleteDetails => "generic_skills_autocomplete_details",
    TechnicalSkillsAutocompleteDetails => "technical_skills_autocomplete_details",
    Sectors => "sectors",
}

impl Operation {
    pub fn descriptor(self) -> &'static OperationDescriptor {
        &CATALOG[self as usize]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| ApiError::UnknownOperation(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Vocabularies
// ---------------------------------------------------------------------------

pub const TAGGING_CODES: &Vocabulary = &Vocabulary {
    values: &["1", "2", "40", "9001", "9002", "FULL"],
    ranges: &[(30011, 30083)],
};

pub const FEATURE_TAGS: &Vocabulary = &Vocabulary {
    values: &["WSQ", "CET", "PET", "SFC", "PA"],
    ranges: &[],
};

pub const RETRIEVE_TYPES: &Vocabulary = &Vocabulary {
    values: &["FULL", "DELTA"],
    ranges: &[],
};

/// `0` sorts by text, `1` by count.
pub const TAG_SORT_ORDERS: &Vocabulary = &Vocabulary {
    values: &["0", "1"],
    ranges: &[],
};

// ---------------------------------------------------------------------------
// Shared parameter specs
// ---------------------------------------------------------------------------

pub const KEYWORD_MIN_LEN: usize = 3;

const KEYWORD: ParamSpec = ParamSpec::query("keyword", ParamKind::Text).min_len(KEYWORD_MIN_LEN);
const PAGE: ParamSpec = ParamSpec::query("page", ParamKind::Integer)
    .range(0, i64::MAX)
    .default_value(DefaultValue::Integer(0));
const PAGE_SIZE: ParamSpec = ParamSpec::query("pageSize", ParamKind::Integer)
    .range(1, i64::MAX)
    .default_value(DefaultValue::Integer(10));
/// Skills-framework listings page in twenties, at most a hundred per page.
const FRAMEWORK_PAGE_SIZE: ParamSpec = ParamSpec::query("pageSize", ParamKind::Integer)
    .range(1, 100)
    .default_value(DefaultValue::Integer(20));
const COURSE_REFERENCE: ParamSpec = ParamSpec::path("courseReferenceNumber", ParamKind::Text);

const TAGGING_CODES_PARAM: ParamSpec = ParamSpec::query("taggingCodes", ParamKind::List)
    .one_of(TAGGING_CODES)
    .in_group("tagging");
const SUPPORT_END_DATE: ParamSpec = ParamSpec::query("courseSupportEndDate", ParamKind::Text)
    .date()
    .in_group("tagging");
const RETRIEVE_TYPE: ParamSpec = ParamSpec::query("retrieveType", ParamKind::Text)
    .one_of(RETRIEVE_TYPES)
    .in_group("tagging")
    .default_value(DefaultValue::Text("FULL"));
const LAST_UPDATE_DATE: ParamSpec = ParamSpec::query("lastUpdateDate", ParamKind::Text)
    .date()
    .in_group("tagging")
    .required_when("retrieveType", "DELTA");

const KEYWORD_ONLY: &[ParamSpec] = &[KEYWORD.required()];

const DIRECTORY_GROUPS: &[&str] = &["keyword", "tagging"];

const DIRECTORY_BY_KEYWORD: &[ParamSpec] = &[
    KEYWORD.required().in_group("keyword"),
    TAGGING_CODES_PARAM,
    SUPPORT_END_DATE,
    RETRIEVE_TYPE,
    LAST_UPDATE_DATE,
    PAGE_SIZE,
    PAGE,
];

const DIRECTORY_BY_TAGGING: &[ParamSpec] = &[
    KEYWORD.in_group("keyword"),
    TAGGING_CODES_PARAM.required(),
    SUPPORT_END_DATE.required(),
    RETRIEVE_TYPE,
    LAST_UPDATE_DATE,
    PAGE_SIZE,
    PAGE,
];

const FEATURED_LISTING: &[ParamSpec] = &[
    ParamSpec::query("taggingCode", ParamKind::Text).one_of(FEATURE_TAGS),
    PAGE_SIZE,
    PAGE,
];

const JOB_ROLE_SEARCH: &[ParamSpec] = &[
    KEYWORD.in_group("keyword"),
    ParamSpec::query("sector", ParamKind::List).in_group("filters"),
    ParamSpec::query("qualification", ParamKind::List).in_group("filters"),
    ParamSpec::query("fieldOfStudy", ParamKind::List).in_group("filters"),
    PAGE,
    FRAMEWORK_PAGE_SIZE,
];

const SECTOR_LISTING: &[ParamSpec] = &[PAGE, FRAMEWORK_PAGE_SIZE];

const TOP_TOTAL: Option<&[&str]> = Some(&["meta", "total"]);
const DATA_TOTAL: Option<&[&str]> = Some(&["data", "meta", "total"]);

macro_rules! skills_codes {
    ($suffix:literal) => {
        concat!("/skillsFramework/codes/skillsAndCompetencies", $suffix)
    };
}

/// Indexed by `Operation as usize`; order must match the `operations!` list.
static CATALOG: [OperationDescriptor; 17] = [
    OperationDescriptor {
        operation: Operation::CourseCategories,
        name: "course_categories",
        path: "/courses/categories",
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: KEYWORD_ONLY,
        exclusive_groups: &[],
        envelope: Envelope::Keyed("categories"),
        total_path: TOP_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::CourseTags,
        name: "course_tags",
        path: "/courses/tags",
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: &[ParamSpec::query("sortBy", ParamKind::Text)
            .one_of(TAG_SORT_ORDERS)
            .default_value(DefaultValue::Text("0"))],
        exclusive_groups: &[],
        envelope: Envelope::Keyed("tags"),
        total_path: TOP_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::SearchCoursesByKeyword,
        name: "search_courses_by_keyword",
        path: "/courses/directory",
        method: HttpMethod::Get,
        api_version: "v2.1",
        channel: AuthChannel::Certificate,
        params: DIRECTORY_BY_KEYWORD,
        exclusive_groups: DIRECTORY_GROUPS,
        envelope: Envelope::Keyed("courses"),
        total_path: DATA_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::SearchCoursesByTagging,
        name: "search_courses_by_tagging",
        path: "/courses/directory",
        method: HttpMethod::Get,
        api_version: "v2.1",
        channel: AuthChannel::Certificate,
        params: DIRECTORY_BY_TAGGING,
        exclusive_groups: DIRECTORY_GROUPS,
        envelope: Envelope::Keyed("courses"),
        total_path: DATA_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::CourseAutocomplete,
        name: "course_autocomplete",
        path: "/courses/directory/autocomplete",
        method: HttpMethod::Get,
        api_version: "v1.2",
        channel: AuthChannel::Certificate,
        params: KEYWORD_ONLY,
        exclusive_groups: &[],
        envelope: Envelope::Keyed("courses"),
        total_path: None,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::CourseSubcategories,
        name: "course_subcategories",
        path: "/courses/categories/{browseCategoryId}/subCategories",
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: &[ParamSpec::path("browseCategoryId", ParamKind::Integer)],
        exclusive_groups: &[],
        envelope: Envelope::Keyed("subCategories"),
        total_path: TOP_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::CourseDetails,
        name: "course_details",
        path: "/courses/directory/{courseReferenceNumber}",
        method: HttpMethod::Get,
        api_version: "v1.2",
        channel: AuthChannel::Certificate,
        params: &[
            COURSE_REFERENCE,
            ParamSpec::query("includeExpiredCourses", ParamKind::Boolean)
                .default_value(DefaultValue::Boolean(true)),
        ],
        exclusive_groups: &[],
        envelope: Envelope::Keyed("courses"),
        total_path: None,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::RelatedCourses,
        name: "related_courses",
        path: "/courses/directory/{courseReferenceNumber}/related",
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: &[COURSE_REFERENCE],
        exclusive_groups: &[],
        envelope: Envelope::Keyed("courses"),
        total_path: None,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::PopularCourses,
        name: "popular_courses",
        path: "/courses/directory/popular",
        method: HttpMethod::Get,
        api_version: "v1.2",
        channel: AuthChannel::Certificate,
        params: FEATURED_LISTING,
        exclusive_groups: &[],
        envelope: Envelope::Keyed("courses"),
        total_path: DATA_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::FeaturedCourses,
        name: "featured_courses",
        path: "/courses/directory/featured",
        method: HttpMethod::Get,
        api_version: "v1.2",
        channel: AuthChannel::Certificate,
        params: FEATURED_LISTING,
        exclusive_groups: &[],
        envelope: Envelope::Keyed("courses"),
        total_path: DATA_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::JobRoles,
        name: "job_roles",
        path: "/skillsFramework/jobRoles",
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: JOB_ROLE_SEARCH,
        exclusive_groups: &["keyword", "filters"],
        envelope: Envelope::Keyed("jobRoles"),
        total_path: TOP_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::JobRoleTitles,
        name: "job_role_titles",
        path: "/skillsFramework/jobRoles/titles",
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: KEYWORD_ONLY,
        exclusive_groups: &[],
        envelope: Envelope::Sequence,
        total_path: None,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::GenericSkillsAutocomplete,
        name: "generic_skills_autocomplete",
        path: skills_codes!("/generic/autocomplete"),
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: KEYWORD_ONLY,
        exclusive_groups: &[],
        envelope: Envelope::Keyed("codes"),
        total_path: TOP_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::TechnicalSkillsAutocomplete,
        name: "technical_skills_autocomplete",
        path: skills_codes!("/technical/autocomplete"),
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: KEYWORD_ONLY,
        exclusive_groups: &[],
        envelope: Envelope::Keyed("codes"),
        total_path: TOP_TOTAL,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::GenericSkillsAutocompleteDetails,
        name: "generic_skills_autocomplete_details",
        path: skills_codes!("/generic/autocomplete/details"),
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: KEYWORD_ONLY,
        exclusive_groups: &[],
        envelope: Envelope::Keyed("genericSkillCompetencies"),
        total_path: None,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::TechnicalSkillsAutocompleteDetails,
        name: "technical_skills_autocomplete_details",
        path: skills_codes!("/technical/autocomplete/details"),
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::Certificate,
        params: KEYWORD_ONLY,
        exclusive_groups: &[],
        envelope: Envelope::Keyed("technicalSkillCompetencies"),
        total_path: None,
        renames: &[],
    },
    OperationDescriptor {
        operation: Operation::Sectors,
        name: "sectors",
        path: "/skillsFramework/sectors",
        method: HttpMethod::Get,
        api_version: "v1",
        channel: AuthChannel::OAuth,
        params: SECTOR_LISTING,
        exclusive_groups: &[],
        envelope: Envelope::Keyed("sectors"),
        total_path: TOP_TOTAL,
        renames: &[("sectorId", "id")],
    },
];
