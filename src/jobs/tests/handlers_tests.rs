// src/jobs/tests/handlers_tests.rs

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::{json, Value};

    use crate::common::test_support::{
        get_request, json_request, seed_applicant, seed_employer, send, test_app, test_pool,
        test_state,
    };

    const SYDNEY: [f64; 2] = [151.2093, -33.8688];
    const SURRY_HILLS: [f64; 2] = [151.2100, -33.8850];
    const MELBOURNE: [f64; 2] = [144.9631, -37.8136];

    async fn create_job(app: &Router, token: &str, title: &str, location: [f64; 2]) -> String {
        let (status, _, body) = send(
            app,
            json_request(
                "POST",
                "/api/job/employer/create",
                Some(token),
                json!({
                    "job_title": title,
                    "job_address": "1 George St",
                    "location": location,
                    "key_responsibilities": ["Serve customers"],
                    "work_type": "Onsite"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["job"]["id"].as_str().unwrap().to_string()
    }

    async fn post_job_id(app: &Router, uri: &str, token: &str, job_id: &str) -> (StatusCode, Value) {
        let (status, _, body) =
            send(app, json_request("POST", uri, Some(token), json!({ "jobId": job_id }))).await;
        (status, body)
    }

    async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
        let (status, _, body) = send(app, get_request(uri, Some(token))).await;
        (status, body)
    }

    fn titles(jobs: &Value) -> Vec<String> {
        jobs.as_array()
            .unwrap()
            .iter()
            .map(|j| j["job_title"].as_str().unwrap().to_string())
            .collect()
    }

    // ============================================================================
    // Employer Routes
    // ============================================================================

    #[tokio::test]
    async fn test_create_job_copies_company_name() {
        let (state, _) = test_state(test_pool().await);
        let (employer_id, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let app = test_app(state);

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/job/employer/create",
                Some(&token),
                json!({
                    "job_title": "Barista",
                    "job_address": "1 George St",
                    "location": SYDNEY,
                    "qualifications": ["RSA"],
                    "salary_min": 28.5,
                    "salary_period": "Hourly"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        let job = &body["job"];
        assert!(job["id"].as_str().unwrap().starts_with("J_"));
        assert_eq!(job["employer_id"], employer_id.as_str());
        assert_eq!(job["company_name"], "Acme");
        assert_eq!(job["location"], json!(SYDNEY));
        assert_eq!(job["qualifications"], json!(["RSA"]));
        assert_eq!(job["key_responsibilities"], json!([]));
    }

    #[tokio::test]
    async fn test_create_job_validation_and_role() {
        let (state, _) = test_state(test_pool().await);
        let (_, employer_token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, applicant_token) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/job/employer/create",
                Some(&employer_token),
                json!({ "job_title": "", "job_address": "1 George St" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _, _) = send(
            &app,
            json_request(
                "POST",
                "/api/job/employer/create",
                Some(&applicant_token),
                json!({ "job_title": "Chef", "job_address": "x", "location": SYDNEY }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_jobs_paginates_newest_first() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, other_token) = seed_employer(&state, "bob@other.io", "+61400000001").await;
        let app = test_app(state);

        for i in 0..12 {
            create_job(&app, &token, &format!("Job {}", i), SYDNEY).await;
        }
        create_job(&app, &other_token, "Not mine", SYDNEY).await;

        let (status, body) = get(&app, "/api/job/employer/get/all", &token).await;
        assert_eq!(status, StatusCode::OK);
        let first_page = titles(&body["jobs"]);
        assert_eq!(first_page.len(), 10);
        assert_eq!(first_page[0], "Job 11");
        assert_eq!(
            body["pagination"],
            json!({ "total": 12, "page": 1, "totalPages": 2, "hasNextPage": true, "hasPrevPage": false })
        );

        let (_, body) = get(&app, "/api/job/employer/get/all?page=2", &token).await;
        assert_eq!(titles(&body["jobs"]), vec!["Job 1", "Job 0"]);
        assert_eq!(body["pagination"]["hasNextPage"], false);
        assert_eq!(body["pagination"]["hasPrevPage"], true);
    }

    #[tokio::test]
    async fn test_list_jobs_huge_page_is_empty() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let app = test_app(state);

        create_job(&app, &token, "Barista", SYDNEY).await;

        let (status, body) = get(
            &app,
            "/api/job/employer/get/all?page=9223372036854775807",
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(titles(&body["jobs"]).is_empty());
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["pagination"]["hasNextPage"], false);
        assert_eq!(body["pagination"]["hasPrevPage"], true);
    }

    #[tokio::test]
    async fn test_get_job_includes_application_stats() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, other_token) = seed_employer(&state, "bob@other.io", "+61400000001").await;
        let (applicant_id, applicant_token) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        let job_id = create_job(&app, &token, "Barista", SYDNEY).await;
        post_job_id(&app, "/api/job/applicant/apply", &applicant_token, &job_id).await;

        let uri = format!("/api/job/employer/get/{}", job_id);
        let (status, body) = get(&app, &uri, &token).await;
        assert_eq!(status, StatusCode::OK);
        let job = &body["job"];
        assert_eq!(job["job_title"], "Barista");
        assert_eq!(job["employer"]["company_name"], "Acme");
        assert_eq!(job["applicationStats"], json!({ "total": 1, "rejected": 0, "hired": 0 }));
        assert_eq!(job["applications"][0]["applicant_id"], applicant_id.as_str());
        assert_eq!(job["applications"][0]["status"], "Pending");
        assert_eq!(job["applications"][0]["applicant"]["name"], "Sam Seeker");

        let (status, _) = get(&app, &uri, &other_token).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_job_partial_and_owner_only() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, other_token) = seed_employer(&state, "bob@other.io", "+61400000001").await;
        let app = test_app(state);

        let job_id = create_job(&app, &token, "Barista", SYDNEY).await;

        // Renamed company flows onto the post at its next update
        send(
            &app,
            json_request(
                "PATCH",
                "/api/auth/employer/update-profile",
                Some(&token),
                json!({ "company_name": "Acme Coffee" }),
            ),
        )
        .await;

        let uri = format!("/api/job/employer/update/{}", job_id);
        let (status, _, body) = send(
            &app,
            json_request("PATCH", &uri, Some(&token), json!({ "job_title": "Head Barista" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job"]["job_title"], "Head Barista");
        assert_eq!(body["job"]["job_address"], "1 George St");
        assert_eq!(body["job"]["key_responsibilities"], json!(["Serve customers"]));
        assert_eq!(body["job"]["company_name"], "Acme Coffee");

        let (status, _, _) = send(
            &app,
            json_request("PATCH", &uri, Some(&other_token), json!({ "job_title": "Mine now" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(
            &app,
            json_request("PATCH", &uri, Some(&token), json!({ "work_type": "Sometimes" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_job_removes_dependents() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, applicant_token) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        let job_id = create_job(&app, &token, "Barista", SYDNEY).await;
        post_job_id(&app, "/api/job/applicant/apply", &applicant_token, &job_id).await;
        post_job_id(&app, "/api/job/applicant/save", &applicant_token, &job_id).await;
        post_job_id(&app, "/api/job/applicant/view", &applicant_token, &job_id).await;

        let uri = format!("/api/job/employer/delete/{}", job_id);
        let (status, _, body) = send(&app, json_request("DELETE", &uri, Some(&token), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Job deleted successfully");

        for list in ["saved", "viewed", "popular", "applied"] {
            let (status, body) = get(&app, &format!("/api/job/applicant/{}", list), &applicant_token).await;
            assert_eq!(status, StatusCode::OK);
            let key = if list == "applied" { "applications" } else { "jobs" };
            assert_eq!(body[key].as_array().unwrap().len(), 0, "{} not emptied", list);
        }

        let (status, _, body) = send(&app, json_request("DELETE", &uri, Some(&token), json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Job deletion failed: Job not found");
    }

    // ============================================================================
    // Discovery
    // ============================================================================

    #[tokio::test]
    async fn test_jobs_by_distance() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, applicant_token) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        create_job(&app, &token, "CBD Barista", SYDNEY).await;
        create_job(&app, &token, "Surry Hills Chef", SURRY_HILLS).await;
        create_job(&app, &token, "Melbourne Barista", MELBOURNE).await;

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/job/applicant/map/distance",
                Some(&applicant_token),
                json!({ "latitude": SYDNEY[1], "longitude": SYDNEY[0], "maxDistance": 5000 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let mut found = titles(&body["jobs"]);
        found.sort();
        assert_eq!(found, vec!["CBD Barista", "Surry Hills Chef"]);
        assert_eq!(body["jobs"][0]["isSaved"], false);

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/job/applicant/map/distance",
                Some(&applicant_token),
                json!({ "latitude": SYDNEY[1], "longitude": SYDNEY[0] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_jobs_by_distance_at_high_latitude() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, applicant_token) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        // About 995 km from [0, 60] and poleward of it
        create_job(&app, &token, "Stockholm Barista", [18.1, 61.26]).await;

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/job/applicant/map/distance",
                Some(&applicant_token),
                json!({ "latitude": 60.0, "longitude": 0.0, "maxDistance": 1_000_000 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles(&body["jobs"]), vec!["Stockholm Barista"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_records_history() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, applicant_token) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        create_job(&app, &token, "Senior Barista", SYDNEY).await;
        create_job(&app, &token, "barista", SYDNEY).await;
        create_job(&app, &token, "Chef", SYDNEY).await;

        let (status, body) = get(&app, "/api/job/applicant/search?title=BARISTA", &applicant_token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles(&body["jobs"]), vec!["barista", "Senior Barista"]);

        // Only final searches are remembered, and each query once
        let (_, body) = get(&app, "/api/job/applicant/search/history", &applicant_token).await;
        assert_eq!(body["searches"].as_array().unwrap().len(), 0);

        for term in ["barista", "chef", "barista"] {
            let uri = format!("/api/job/applicant/search?title={}&isFinalSearch=true", term);
            get(&app, &uri, &applicant_token).await;
        }

        let (_, body) = get(&app, "/api/job/applicant/search/history", &applicant_token).await;
        let queries: Vec<&str> = body["searches"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["query"].as_str().unwrap())
            .collect();
        assert_eq!(queries, vec!["barista", "chef"]);

        let (status, _) = get(&app, "/api/job/applicant/search", &applicant_token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_recent_jobs_limited_to_ten() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, applicant_token) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        for i in 0..11 {
            create_job(&app, &token, &format!("Job {}", i), SYDNEY).await;
        }

        let (status, body) = get(&app, "/api/job/applicant/recent", &applicant_token).await;
        assert_eq!(status, StatusCode::OK);
        let recent = titles(&body["jobs"]);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0], "Job 10");
        assert!(!recent.contains(&"Job 0".to_string()));
    }

    #[tokio::test]
    async fn test_recommended_jobs_follow_heading() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, applicant_token) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        create_job(&app, &token, "Barista", SYDNEY).await;
        create_job(&app, &token, "Senior Barista Trainer", SYDNEY).await;
        create_job(&app, &token, "Chef", SYDNEY).await;

        let (status, body) = get(&app, "/api/job/applicant/recommended", &applicant_token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Failed to get recommended jobs: Applicant heading not found");

        send(
            &app,
            json_request(
                "PATCH",
                "/api/auth/applicant/update-profile",
                Some(&applicant_token),
                json!({ "heading": "Experienced barista and trainer" }),
            ),
        )
        .await;

        let (status, body) = get(&app, "/api/job/applicant/recommended", &applicant_token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles(&body["jobs"]), vec!["Senior Barista Trainer", "Barista"]);
    }

    // ============================================================================
    // Applications
    // ============================================================================

    #[tokio::test]
    async fn test_apply_once_and_popularity() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, sam) = seed_applicant(&state, "sam@mail.io").await;
        let (_, alex) = seed_applicant(&state, "alex@mail.io").await;
        let app = test_app(state);

        let busy = create_job(&app, &token, "Barista", SYDNEY).await;
        let quiet = create_job(&app, &token, "Chef", SYDNEY).await;

        let (status, body) = post_job_id(&app, "/api/job/applicant/apply", &sam, &busy).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["application"]["status"], "Pending");
        assert!(body["application"]["id"].as_str().unwrap().starts_with("A_"));

        let (status, body) = post_job_id(&app, "/api/job/applicant/apply", &sam, &busy).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Applying to job failed: You have already applied for this job."
        );

        let (status, body) = post_job_id(&app, "/api/job/applicant/apply", &sam, "JOB_MISSING").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"],
            "Applying to job failed: Job not found. It may have been removed."
        );

        post_job_id(&app, "/api/job/applicant/apply", &alex, &busy).await;
        post_job_id(&app, "/api/job/applicant/apply", &alex, &quiet).await;

        let (status, body) = get(&app, "/api/job/applicant/popular", &sam).await;
        assert_eq!(status, StatusCode::OK);
        let popular = body["jobs"].as_array().unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0]["jobDetails"]["id"], busy.as_str());
        assert_eq!(popular[0]["popularityStats"]["applicationCount"], 2);
        assert_eq!(popular[1]["popularityStats"]["applicationCount"], 1);
        assert_eq!(popular[0]["jobDetails"]["isSaved"], false);
    }

    #[tokio::test]
    async fn test_applied_jobs_paginated() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, sam) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        for i in 0..11 {
            let job_id = create_job(&app, &token, &format!("Job {}", i), SYDNEY).await;
            post_job_id(&app, "/api/job/applicant/apply", &sam, &job_id).await;
        }

        let (status, body) = get(&app, "/api/job/applicant/applied", &sam).await;
        assert_eq!(status, StatusCode::OK);
        let applications = body["applications"].as_array().unwrap();
        assert_eq!(applications.len(), 10);
        assert_eq!(applications[0]["job"]["job_title"], "Job 10");
        assert!(applications[0]["applicationId"].as_str().unwrap().starts_with("A_"));
        assert_eq!(body["pagination"]["totalPages"], 2);

        let (_, body) = get(&app, "/api/job/applicant/applied?page=2", &sam).await;
        assert_eq!(body["applications"][0]["job"]["job_title"], "Job 0");
    }

    // ============================================================================
    // Saved and Viewed Jobs
    // ============================================================================

    #[tokio::test]
    async fn test_save_toggle_and_job_flags() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, sam) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        let job_id = create_job(&app, &token, "Barista", SYDNEY).await;
        let detail_uri = format!("/api/job/applicant/job/{}", job_id);

        let (status, body) = post_job_id(&app, "/api/job/applicant/save", &sam, &job_id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isSaved"], true);

        let (_, body) = get(&app, &detail_uri, &sam).await;
        assert_eq!(body["job"]["isSaved"], true);
        assert_eq!(body["job"]["isApplied"], false);
        assert_eq!(body["job"]["employer"]["company_name"], "Acme");

        let (_, body) = get(&app, "/api/job/applicant/saved", &sam).await;
        assert_eq!(body["jobs"][0]["job"]["id"], job_id.as_str());
        assert_eq!(body["jobs"][0]["job"]["isSaved"], true);
        assert!(body["jobs"][0]["saved_at"].is_string());

        let (_, body) = post_job_id(&app, "/api/job/applicant/save", &sam, &job_id).await;
        assert_eq!(body["isSaved"], false);

        let unsave_uri = format!("/api/job/applicant/save/{}", job_id);
        let (status, _, _) = send(&app, json_request("DELETE", &unsave_uri, Some(&sam), json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        post_job_id(&app, "/api/job/applicant/save", &sam, &job_id).await;
        let (status, _, body) = send(&app, json_request("DELETE", &unsave_uri, Some(&sam), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Job removed from saved jobs");

        post_job_id(&app, "/api/job/applicant/apply", &sam, &job_id).await;
        let (_, body) = get(&app, &detail_uri, &sam).await;
        assert_eq!(body["job"]["isSaved"], false);
        assert_eq!(body["job"]["isApplied"], true);

        let (status, _) = post_job_id(&app, "/api/job/applicant/save", &sam, "JOB_MISSING").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_viewed_jobs_recorded_once() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let (_, sam) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        let first = create_job(&app, &token, "Barista", SYDNEY).await;
        let second = create_job(&app, &token, "Chef", SYDNEY).await;

        for job_id in [&first, &second, &first] {
            let (status, body) = post_job_id(&app, "/api/job/applicant/view", &sam, job_id).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], "Job marked as viewed");
        }
        post_job_id(&app, "/api/job/applicant/save", &sam, &second).await;

        let (status, body) = get(&app, "/api/job/applicant/viewed", &sam).await;
        assert_eq!(status, StatusCode::OK);
        let viewed = body["jobs"].as_array().unwrap();
        assert_eq!(viewed.len(), 2);
        assert_eq!(viewed[0]["job"]["id"], first.as_str());
        assert_eq!(viewed[1]["job"]["isSaved"], true);

        let (status, _) = post_job_id(&app, "/api/job/applicant/view", &sam, "JOB_MISSING").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
