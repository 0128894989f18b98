// src/jobs/tests/validators_tests.rs

#[cfg(test)]
mod tests {
    use crate::common::Validator;
    use crate::jobs::models::*;
    use crate::jobs::validators::*;

    fn barista_post() -> CreateJobPost {
        CreateJobPost {
            job_title: "Barista".to_string(),
            job_address: "1 George St, Sydney".to_string(),
            location: Some([151.2093, -33.8688]),
            summary: Some("Morning shifts".to_string()),
            key_responsibilities: Some(vec!["Coffee".to_string()]),
            qualifications: Some(vec!["RSA".to_string()]),
            closing_statement: None,
            salary_min: Some(28.5),
            salary_max: Some(32.0),
            salary_currency: Some("AUD".to_string()),
            salary_period: Some("Hourly".to_string()),
            work_type: Some("Onsite".to_string()),
            employment_type: Some("Part Time".to_string()),
            seniority: Some("Junior".to_string()),
        }
    }

    fn fields(result: &crate::common::ValidationResult) -> Vec<&str> {
        result.errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_job_validator_valid_data() {
        let result = JobPostValidator.validate(&barista_post());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_job_validator_requires_title_address_location() {
        let mut post = barista_post();
        post.job_title = "  ".to_string();
        post.job_address = String::new();
        post.location = None;

        let result = JobPostValidator.validate(&post);
        assert!(!result.is_valid);
        assert_eq!(fields(&result), vec!["job_title", "job_address", "location"]);
    }

    #[test]
    fn test_job_validator_title_too_long() {
        let mut post = barista_post();
        post.job_title = "a".repeat(201);

        let result = JobPostValidator.validate(&post);
        assert_eq!(fields(&result), vec!["job_title"]);
    }

    #[test]
    fn test_job_validator_location_order_is_lng_lat() {
        let mut post = barista_post();
        // Latitude out of range once the pair is read as [lng, lat]
        post.location = Some([-33.8688, 151.2093]);

        let result = JobPostValidator.validate(&post);
        assert_eq!(fields(&result), vec!["location"]);
    }

    #[test]
    fn test_job_validator_salary_range() {
        let mut post = barista_post();
        post.salary_min = Some(40.0);
        post.salary_max = Some(30.0);
        assert_eq!(fields(&JobPostValidator.validate(&post)), vec!["salary_max"]);

        post.salary_min = Some(-1.0);
        post.salary_max = None;
        assert_eq!(fields(&JobPostValidator.validate(&post)), vec!["salary_min"]);
    }

    #[test]
    fn test_job_validator_rejects_unknown_choices() {
        let mut post = barista_post();
        post.work_type = Some("Anywhere".to_string());
        post.seniority = Some("Principal".to_string());

        let result = JobPostValidator.validate(&post);
        assert_eq!(fields(&result), vec!["work_type", "seniority"]);
        assert!(result.errors[0].message.contains("Remote"));
    }

    #[test]
    fn test_job_validator_rejects_blank_list_entries() {
        let mut post = barista_post();
        post.qualifications = Some(vec!["RSA".to_string(), " ".to_string()]);

        let result = JobPostValidator.validate(&post);
        assert_eq!(fields(&result), vec!["qualifications"]);
    }

    #[test]
    fn test_update_validator_allows_empty_patch() {
        let result = JobPostValidator.validate(&UpdateJobPost::default());
        assert!(result.is_valid);
    }

    #[test]
    fn test_update_validator_checks_present_fields() {
        let update = UpdateJobPost {
            job_title: Some(String::new()),
            employment_type: Some("Casual".to_string()),
            ..Default::default()
        };

        let result = JobPostValidator.validate(&update);
        assert_eq!(fields(&result), vec!["job_title", "employment_type"]);
    }

    #[test]
    fn test_distance_validator() {
        let valid = DistanceRequest {
            latitude: Some(-33.87),
            longitude: Some(151.21),
            max_distance: Some(5000.0),
        };
        assert!(DistanceValidator.validate(&valid).is_valid);

        let missing = DistanceRequest {
            latitude: None,
            longitude: Some(200.0),
            max_distance: Some(0.0),
        };
        let result = DistanceValidator.validate(&missing);
        assert_eq!(fields(&result), vec!["latitude", "longitude", "maxDistance"]);
    }

    #[test]
    fn test_search_and_job_id_validators() {
        let search = SearchQuery {
            title: " ".to_string(),
            is_final_search: true,
        };
        assert_eq!(fields(&SearchValidator.validate(&search)), vec!["title"]);

        let job = JobIdRequest {
            job_id: String::new(),
        };
        assert_eq!(fields(&JobIdValidator.validate(&job)), vec!["jobId"]);
    }

    #[test]
    fn test_pagination_flags() {
        let first = Pagination::new(12, 1, 10);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next_page);
        assert!(!first.has_prev_page);

        let last = Pagination::new(12, 2, 2);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        let empty = Pagination::new(0, 1, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn test_page_offset_saturates() {
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(3), 20);
        assert_eq!(page_offset(i64::MAX), i64::MAX);

        let far = Pagination::new(5, i64::MAX, 0);
        assert!(!far.has_next_page);
        assert!(far.has_prev_page);
    }
}
