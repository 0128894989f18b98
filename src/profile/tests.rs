//! Tests for profile module
//!
//! These tests verify:
//! - Profile and employment history validators
//! - Profile updates through the router
//! - Employment history create, update and delete with stable ids

#[cfg(test)]
mod tests {
    use super::super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::common::test_support::{
        get_request, json_request, seed_applicant, seed_employer, send, test_app, test_pool,
        test_state,
    };
    use crate::common::Validator;

    fn employment() -> models::CreateEmploymentRequest {
        models::CreateEmploymentRequest {
            job_title: "Backend Engineer".to_string(),
            company_logo: None,
            company_name: "Acme".to_string(),
            employment_type: "Full Time".to_string(),
            start_date: "2021-02-01".to_string(),
            end_date: Some("2023-06-30".to_string()),
            description: Some("Payments team".to_string()),
        }
    }

    // ============================================================================
    // Validator Tests
    // ============================================================================

    #[test]
    fn test_employment_validator_valid_data() {
        let result = validators::EmploymentValidator.validate(&employment());
        assert!(result.is_valid);
        assert_eq!(result.errors.len(), 0);
    }

    #[test]
    fn test_employment_validator_rejects_bad_dates() {
        let mut request = employment();
        request.end_date = Some("2020-01-01".to_string());
        let result = validators::EmploymentValidator.validate(&request);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "end_date");

        request.start_date = "01/02/2021".to_string();
        request.end_date = None;
        let result = validators::EmploymentValidator.validate(&request);
        assert_eq!(result.errors[0].field, "start_date");
    }

    #[test]
    fn test_employment_update_needs_a_field() {
        let result = validators::EmploymentValidator.validate(&models::UpdateEmploymentRequest::default());
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "general");

        let blank_title = models::UpdateEmploymentRequest {
            job_title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!validators::EmploymentValidator.validate(&blank_title).is_valid);
    }

    #[test]
    fn test_employer_profile_validator() {
        let update = models::EmployerProfileUpdate {
            phone: Some("not a phone".to_string()),
            location: Some([10.0, 95.0]),
            ..Default::default()
        };
        let result = validators::EmployerProfileValidator.validate(&update);
        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["phone", "location"]);

        assert!(validators::EmployerProfileValidator
            .validate(&models::EmployerProfileUpdate::default())
            .is_valid);
    }

    // ============================================================================
    // Handler Tests
    // ============================================================================

    #[tokio::test]
    async fn test_update_employer_profile_keeps_absent_fields() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let app = test_app(state);

        let (status, _, body) = send(
            &app,
            json_request(
                "PATCH",
                "/api/auth/employer/update-profile",
                Some(&token),
                json!({ "heading": "We build things", "company_logo": "https://cdn.example.com/a.png" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["employer"]["heading"], "We build things");
        assert_eq!(body["employer"]["company_name"], "Acme");
        assert_eq!(body["employer"]["phone"], "+61400000000");
        assert!(body["employer"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_update_employer_phone_conflict() {
        let (state, _) = test_state(test_pool().await);
        seed_employer(&state, "other@acme.io", "+61400000001").await;
        let (_, token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let app = test_app(state);

        let (status, _, body) = send(
            &app,
            json_request(
                "PATCH",
                "/api/auth/employer/update-profile",
                Some(&token),
                json!({ "phone": "+61400000001" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Profile update failed"));
    }

    #[tokio::test]
    async fn test_update_applicant_profile_role_checked() {
        let (state, _) = test_state(test_pool().await);
        let (_, applicant_token) = seed_applicant(&state, "sam@mail.io").await;
        let (_, employer_token) = seed_employer(&state, "jane@acme.io", "+61400000000").await;
        let app = test_app(state);

        let update = json!({ "heading": "Senior Rust Developer" });
        let (status, _, body) = send(
            &app,
            json_request(
                "PATCH",
                "/api/auth/applicant/update-profile",
                Some(&applicant_token),
                update.clone(),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["applicant"]["heading"], "Senior Rust Developer");
        assert_eq!(body["applicant"]["name"], "Sam Seeker");

        let (status, _, _) = send(
            &app,
            json_request(
                "PATCH",
                "/api/auth/applicant/update-profile",
                Some(&employer_token),
                update,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_employment_history_lifecycle() {
        let (state, _) = test_state(test_pool().await);
        let (_, token) = seed_applicant(&state, "sam@mail.io").await;
        let app = test_app(state);

        let (status, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/job/applicant/employment-history",
                Some(&token),
                json!({
                    "job_title": "Backend Engineer",
                    "company_name": "Acme",
                    "employment_type": "Full Time",
                    "start_date": "2021-02-01"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let entry_id = body["employment_history"][0]["id"].as_str().unwrap().to_string();
        assert!(entry_id.starts_with("EH_"));

        let uri = format!("/api/job/applicant/employment-history/{}", entry_id);
        let (status, _, body) = send(
            &app,
            json_request(
                "PATCH",
                &uri,
                Some(&token),
                json!({ "end_date": "2023-06-30", "job_title": "Staff Engineer" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let entry = &body["employment_history"][0];
        assert_eq!(entry["id"], entry_id.as_str());
        assert_eq!(entry["job_title"], "Staff Engineer");
        assert_eq!(entry["company_name"], "Acme");
        assert_eq!(entry["end_date"], "2023-06-30");

        // An end date before the stored start date is refused
        let (status, _, _) = send(
            &app,
            json_request("PATCH", &uri, Some(&token), json!({ "end_date": "2020-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(
            &app,
            json_request("DELETE", &uri, Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["employment_history"].as_array().unwrap().len(), 0);

        let (status, _, _) = send(
            &app,
            json_request("DELETE", &uri, Some(&token), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_employment_history_is_scoped_to_owner() {
        let (state, _) = test_state(test_pool().await);
        let (_, owner_token) = seed_applicant(&state, "sam@mail.io").await;
        let (_, other_token) = seed_applicant(&state, "alex@mail.io").await;
        let app = test_app(state);

        let (_, _, body) = send(
            &app,
            json_request(
                "POST",
                "/api/job/applicant/employment-history",
                Some(&owner_token),
                json!({
                    "job_title": "Barista",
                    "company_name": "Bean There",
                    "employment_type": "Part Time",
                    "start_date": "2019-01-01"
                }),
            ),
        )
        .await;
        let entry_id = body["employment_history"][0]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/job/applicant/employment-history/{}", entry_id);
        let (status, _, _) = send(
            &app,
            json_request("PATCH", &uri, Some(&other_token), json!({ "job_title": "Owner" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, _, body) = send(
            &app,
            get_request("/api/job/applicant/employment-history", Some(&other_token)),
        )
        .await;
        assert_eq!(body["employment_history"].as_array().unwrap().len(), 0);
    }
}
