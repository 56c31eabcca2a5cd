//! In-memory emulation of the SSG course and skills-framework endpoints.
//!
//! Serves a fixed fixture set. Every route checks the `x-api-version` header
//! the real service requires and answers with the same envelopes: keyed
//! record fields under `data`, totals under `meta` or `data.meta`, and an
//! `error` object with `details` on rejection.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const API_VERSION_HEADER: &str = "x-api-version";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub reference_number: String,
    pub title: String,
    pub tagging_codes: Vec<String>,
    pub category_id: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: u32,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JobRole {
    pub id: u32,
    pub title: String,
    pub sector: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    pub code: String,
    pub title: String,
}

#[derive(Debug, Default)]
pub struct Fixtures {
    pub courses: Vec<Course>,
    pub categories: Vec<Category>,
    pub job_roles: Vec<JobRole>,
    pub job_role_titles: Vec<String>,
    pub generic_skills: Vec<Skill>,
    pub technical_skills: Vec<Skill>,
}

impl Fixtures {
    pub fn sample() -> Self {
        let course = |reference: &str, title: &str, tags: &[&str], category_id| Course {
            reference_number: reference.to_string(),
            title: title.to_string(),
            tagging_codes: tags.iter().map(|t| t.to_string()).collect(),
            category_id,
        };
        let job_role = |id, title: &str, sector: &str| JobRole {
            id,
            title: title.to_string(),
            sector: sector.to_string(),
        };
        let skill = |code: &str, title: &str| Skill {
            code: code.to_string(),
            title: title.to_string(),
        };
        Self {
            courses: vec![
                course("TGS-2020000001", "Python for Data Analysis", &["1", "40"], 34),
                course("TGS-2020000002", "Advanced Python Programming", &["2"], 34),
                course("TGS-2020000003", "Python Web Development", &["40"], 34),
                course("TGS-2020000004", "Workplace Safety and Health", &["9001"], 12),
                course("TGS-2020000005", "Financial Accounting Basics", &["30011"], 7),
            ],
            categories: vec![
                Category {
                    id: 7,
                    description: "Accounting and Finance".to_string(),
                },
                Category {
                    id: 12,
                    description: "Safety Training".to_string(),
                },
                Category {
                    id: 34,
                    description: "Information and Communications Technology".to_string(),
                },
            ],
            job_roles: vec![
                job_role(1, "Data Analyst", "Infocomm Technology"),
                job_role(2, "Data Engineer", "Infocomm Technology"),
                job_role(3, "Financial Analyst", "Financial Services"),
                job_role(4, "Store Manager", "Retail"),
            ],
            job_role_titles: vec![
                "Data Analyst".to_string(),
                "Data Engineer".to_string(),
                "Database Administrator".to_string(),
                "Software Engineer".to_string(),
            ],
            generic_skills: vec![
                skill("GSC-CMM-2001-1.1", "Communication"),
                skill("GSC-CRT-1001-1.1", "Creative Thinking"),
                skill("GSC-DGL-1001-1.1", "Digital Literacy"),
            ],
            technical_skills: vec![
                skill("ICT-DIT-3003-1.1", "Cloud Computing"),
                skill("ICT-SNA-4005-1.1", "Cloud Security Management"),
                skill("FSE-BAM-3001-1.1", "Budgeting"),
            ],
        }
    }
}

pub type Db = Arc<Fixtures>;

type Params = Query<HashMap<String, String>>;

pub fn app() -> Router {
    app_with(Fixtures::sample())
}

pub fn app_with(fixtures: Fixtures) -> Router {
    let db: Db = Arc::new(fixtures);
    Router::new()
        .route("/courses/categories", get(list_categories))
        .route("/courses/categories/{id}/subCategories", get(list_subcategories))
        .route("/courses/tags", get(list_tags))
        .route("/courses/directory", get(search_courses))
        .route("/courses/directory/autocomplete", get(autocomplete_courses))
        .route("/courses/directory/popular", get(popular_courses))
        .route("/courses/directory/featured", get(featured_courses))
        .route("/courses/directory/{reference}", get(course_details))
        .route("/courses/directory/{reference}/related", get(related_courses))
        .route("/skillsFramework/jobRoles", get(list_job_roles))
        .route("/skillsFramework/jobRoles/titles", get(job_role_titles))
        .route(
            "/skillsFramework/codes/skillsAndCompetencies/{kind}/autocomplete",
            get(autocomplete_skills),
        )
        .route(
            "/skillsFramework/codes/skillsAndCompetencies/{kind}/autocomplete/details",
            get(autocomplete_skill_details),
        )
        .route("/skillsFramework/sectors", get(sectors))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// An error envelope in the remote service's shape.
pub struct Rejection {
    status: StatusCode,
    message: &'static str,
    details: Vec<Value>,
}

impl Rejection {
    fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            details: Vec::new(),
        }
    }

    fn detail(mut self, field: Option<&str>, message: &str) -> Self {
        let mut detail = json!({ "message": message });
        if let Some(field) = field {
            detail["field"] = json!(field);
        }
        self.details.push(detail);
        self
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let code = self.status.as_u16();
        let body = json!({
            "status": code,
            "error": {
                "code": code.to_string(),
                "message": self.message,
                "details": self.details,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

fn require_version(headers: &HeaderMap, expected: &str) -> Result<(), Rejection> {
    let found = headers.get(API_VERSION_HEADER).and_then(|v| v.to_str().ok());
    if found == Some(expected) {
        return Ok(());
    }
    tracing::debug!(?found, expected, "api version rejected");
    Err(Rejection::new(StatusCode::BAD_REQUEST, "Bad Request")
        .detail(Some(API_VERSION_HEADER), &format!("Expected API version {expected}")))
}

fn number(params: &HashMap<String, String>, name: &str, default: usize) -> Result<usize, Rejection> {
    match params.get(name) {
        Some(raw) => raw.parse().map_err(|_| {
            Rejection::new(StatusCode::BAD_REQUEST, "Bad Request").detail(Some(name), "Must be a number")
        }),
        None => Ok(default),
    }
}

fn matches_keyword(text: &str, keyword: Option<&String>) -> bool {
    keyword.map_or(true, |kw| text.to_lowercase().contains(&kw.to_lowercase()))
}

async fn list_categories(State(db): State<Db>, headers: HeaderMap, Query(params): Params) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1")?;
    let categories: Vec<&Category> = db
        .categories
        .iter()
        .filter(|c| matches_keyword(&c.description, params.get("keyword")))
        .collect();
    Ok(Json(json!({
        "data": { "categories": categories },
        "meta": { "total": categories.len() }
    })))
}

async fn list_subcategories(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u32>,
) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1")?;
    if !db.categories.iter().any(|c| c.id == id) {
        return Err(Rejection::new(StatusCode::NOT_FOUND, "Not Found").detail(None, "Category is not found."));
    }
    Ok(Json(json!({
        "data": { "subCategories": [{ "id": id * 100 + 1, "description": "General" }] },
        "meta": { "total": 1 }
    })))
}

async fn list_tags(headers: HeaderMap) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1")?;
    Ok(Json(json!({
        "data": { "tags": [{ "text": "python", "count": 3 }, { "text": "safety", "count": 1 }] },
        "meta": { "total": "2" }
    })))
}

async fn search_courses(State(db): State<Db>, headers: HeaderMap, Query(params): Params) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v2.1")?;
    let keyword = params.get("keyword");
    let tagging = params.get("taggingCodes");
    if keyword.is_some() && tagging.is_some() {
        return Err(Rejection::new(StatusCode::BAD_REQUEST, "Bad Request")
            .detail(None, "keyword cannot be combined with taggingCodes"));
    }
    let codes: Vec<&str> = tagging.map(|t| t.split(',').collect()).unwrap_or_default();

    let page = number(&params, "page", 0)?;
    let page_size = number(&params, "pageSize", 10)?;
    let matching: Vec<&Course> = db
        .courses
        .iter()
        .filter(|c| matches_keyword(&c.title, keyword))
        .filter(|c| codes.is_empty() || c.tagging_codes.iter().any(|t| codes.contains(&t.as_str())))
        .collect();
    let window: Vec<&Course> = matching.iter().skip(page * page_size).take(page_size).copied().collect();
    tracing::debug!(total = matching.len(), returned = window.len(), "directory search");

    Ok(Json(json!({
        "data": { "courses": window, "meta": { "total": matching.len() } }
    })))
}

async fn autocomplete_courses(State(db): State<Db>, headers: HeaderMap, Query(params): Params) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1.2")?;
    let titles: Vec<Value> = db
        .courses
        .iter()
        .filter(|c| matches_keyword(&c.title, params.get("keyword")))
        .map(|c| json!({ "title": c.title }))
        .collect();
    Ok(Json(json!({ "data": { "courses": titles } })))
}

async fn popular_courses(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1.2")?;
    let popular: Vec<&Course> = db.courses.iter().take(2).collect();
    Ok(Json(json!({
        "data": { "courses": popular, "meta": { "total": popular.len() } }
    })))
}

async fn featured_courses(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1.2")?;
    let featured: Vec<&Course> = db.courses.iter().rev().take(1).collect();
    Ok(Json(json!({
        "data": { "courses": featured, "meta": { "total": featured.len() } }
    })))
}

fn find_course<'a>(db: &'a Fixtures, reference: &str) -> Result<&'a Course, Rejection> {
    db.courses
        .iter()
        .find(|c| c.reference_number == reference)
        .ok_or_else(|| Rejection::new(StatusCode::NOT_FOUND, "Not Found").detail(None, "Course is not found."))
}

async fn course_details(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1.2")?;
    let course = find_course(&db, &reference)?;
    Ok(Json(json!({ "data": { "courses": [course] } })))
}

async fn related_courses(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1")?;
    let course = find_course(&db, &reference)?;
    let related: Vec<&Course> = db
        .courses
        .iter()
        .filter(|c| c.category_id == course.category_id && c.reference_number != course.reference_number)
        .collect();
    Ok(Json(json!({ "data": { "courses": related } })))
}

async fn job_role_titles(State(db): State<Db>, headers: HeaderMap, Query(params): Params) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1")?;
    let titles: Vec<&String> = db
        .job_role_titles
        .iter()
        .filter(|t| matches_keyword(t, params.get("keyword")))
        .collect();
    Ok(Json(json!({ "data": titles })))
}

async fn list_job_roles(State(db): State<Db>, headers: HeaderMap, Query(params): Params) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1")?;
    let sectors: Vec<&str> = params
        .get("sector")
        .map(|s| s.split(',').collect())
        .unwrap_or_default();
    let page = number(&params, "page", 0)?;
    let page_size = number(&params, "pageSize", 20)?;
    let matching: Vec<&JobRole> = db
        .job_roles
        .iter()
        .filter(|r| matches_keyword(&r.title, params.get("keyword")))
        .filter(|r| sectors.is_empty() || sectors.contains(&r.sector.as_str()))
        .collect();
    let window: Vec<&JobRole> = matching.iter().skip(page * page_size).take(page_size).copied().collect();
    Ok(Json(json!({
        "data": { "jobRoles": window },
        "meta": { "total": matching.len() }
    })))
}

fn skills<'a>(db: &'a Fixtures, kind: &str) -> Result<(&'static str, &'a [Skill]), Rejection> {
    match kind {
        "generic" => Ok(("genericSkillCompetencies", &db.generic_skills)),
        "technical" => Ok(("technicalSkillCompetencies", &db.technical_skills)),
        _ => Err(Rejection::new(StatusCode::NOT_FOUND, "Not Found").detail(None, "Skill category is not found.")),
    }
}

fn matching_skills<'a>(skills: &'a [Skill], params: &HashMap<String, String>) -> Vec<&'a Skill> {
    skills
        .iter()
        .filter(|s| matches_keyword(&s.title, params.get("keyword")))
        .collect()
}

async fn autocomplete_skills(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    Query(params): Params,
) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1")?;
    let (_, pool) = skills(&db, &kind)?;
    let codes = matching_skills(pool, &params);
    Ok(Json(json!({
        "data": { "codes": codes },
        "meta": { "total": codes.len() }
    })))
}

async fn autocomplete_skill_details(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(kind): Path<String>,
    Query(params): Params,
) -> Result<Json<Value>, Rejection> {
    require_version(&headers, "v1")?;
    let (field, pool) = skills(&db, &kind)?;
    let details: Vec<Value> = matching_skills(pool, &params)
        .into_iter()
        .map(|s| json!({ "code": s.code, "title": s.title, "proficiencyLevels": ["Basic", "Intermediate", "Advanced"] }))
        .collect();
    let mut data = serde_json::Map::new();
    data.insert(field.to_string(), Value::Array(details));
    Ok(Json(json!({ "data": data })))
}

/// Certificate callers are not authorized for this listing.
async fn sectors() -> Rejection {
    Rejection::new(StatusCode::FORBIDDEN, "Forbidden").detail(None, "OAuth access token required")
}
