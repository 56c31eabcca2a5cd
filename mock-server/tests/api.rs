use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, API_VERSION_HEADER};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn versioned(uri: &str, version: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(API_VERSION_HEADER, version)
        .body(String::new())
        .unwrap()
}

// --- directory search ---

#[tokio::test]
async fn keyword_search_pages_results() {
    let resp = app()
        .oneshot(versioned("/courses/directory?keyword=python&pageSize=2&page=0", "v2.1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["courses"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["meta"]["total"], 3);
}

#[tokio::test]
async fn tagging_search_filters_by_code() {
    let resp = app()
        .oneshot(versioned(
            "/courses/directory?taggingCodes=9001,30011&courseSupportEndDate=20250101",
            "v2.1",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["meta"]["total"], 2);
}

#[tokio::test]
async fn keyword_with_tagging_codes_is_rejected() {
    let resp = app()
        .oneshot(versioned("/courses/directory?keyword=python&taggingCodes=1", "v2.1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "400");
}

#[tokio::test]
async fn wrong_api_version_is_rejected() {
    let resp = app()
        .oneshot(versioned("/courses/directory?keyword=python", "v1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["details"][0]["field"], API_VERSION_HEADER);
}

#[tokio::test]
async fn missing_api_version_is_rejected() {
    let resp = app()
        .oneshot(Request::builder().uri("/courses/tags").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- details ---

#[tokio::test]
async fn course_details_found() {
    let resp = app()
        .oneshot(versioned("/courses/directory/TGS-2020000004", "v1.2"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["courses"][0]["title"], "Workplace Safety and Health");
}

#[tokio::test]
async fn unknown_course_is_404_with_detail() {
    let resp = app()
        .oneshot(versioned("/courses/directory/TGS-0000000000", "v1.2"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"]["details"][0]["message"], "Course is not found.");
}

#[tokio::test]
async fn static_routes_win_over_reference_lookup() {
    let resp = app()
        .oneshot(versioned("/courses/directory/autocomplete?keyword=pyt", "v1.2"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["courses"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn featured_is_a_listing_not_a_reference() {
    let resp = app()
        .oneshot(versioned("/courses/directory/featured", "v1.2"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["meta"]["total"], 1);
    assert_eq!(body["data"]["courses"][0]["referenceNumber"], "TGS-2020000005");
}

#[tokio::test]
async fn related_courses_share_a_category() {
    let resp = app()
        .oneshot(versioned("/courses/directory/TGS-2020000001/related", "v1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let related = body["data"]["courses"].as_array().unwrap();
    assert_eq!(related.len(), 2);
    assert!(related.iter().all(|c| c["categoryId"] == 34));
}

// --- categories and tags ---

#[tokio::test]
async fn categories_carry_top_level_total() {
    let resp = app()
        .oneshot(versioned("/courses/categories?keyword=Training", "v1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"]["categories"][0]["id"], 12);
}

#[tokio::test]
async fn subcategories_of_unknown_category() {
    let resp = app()
        .oneshot(versioned("/courses/categories/999/subCategories", "v1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- skills framework ---

#[tokio::test]
async fn job_role_titles_are_a_bare_list() {
    let resp = app()
        .oneshot(versioned("/skillsFramework/jobRoles/titles?keyword=data", "v1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(
        body["data"],
        serde_json::json!(["Data Analyst", "Data Engineer", "Database Administrator"])
    );
}

#[tokio::test]
async fn job_roles_filter_by_sector() {
    let resp = app()
        .oneshot(versioned("/skillsFramework/jobRoles?sector=Infocomm%20Technology,Retail", "v1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["jobRoles"].as_array().unwrap().len(), 3);
    assert_eq!(body["meta"]["total"], 3);
}

#[tokio::test]
async fn skills_autocomplete_by_kind() {
    let resp = app()
        .oneshot(versioned(
            "/skillsFramework/codes/skillsAndCompetencies/technical/autocomplete?keyword=cloud",
            "v1",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["codes"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["total"], 2);
}

#[tokio::test]
async fn skill_details_are_keyed_by_kind() {
    let resp = app()
        .oneshot(versioned(
            "/skillsFramework/codes/skillsAndCompetencies/generic/autocomplete/details?keyword=thinking",
            "v1",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["data"]["genericSkillCompetencies"][0]["title"], "Creative Thinking");
    assert!(body["data"].get("technicalSkillCompetencies").is_none());

    let resp = app()
        .oneshot(versioned(
            "/skillsFramework/codes/skillsAndCompetencies/soft/autocomplete",
            "v1",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sectors_forbid_certificate_callers() {
    let resp = app()
        .oneshot(versioned("/skillsFramework/sectors", "v1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_bytes(resp).await;
    assert!(!body.is_empty());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app()
        .oneshot(versioned("/courses/unknown", "v1"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_bytes(resp).await;
    assert!(body.is_empty());
}
