mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use customer_api::{
    entities::customer_password::PasswordFormat,
    services::localization::activity,
};
use rstest::rstest;
use serde_json::{json, Value};

fn ids(body: &Value) -> Vec<i64> {
    body["customers"]
        .as_array()
        .expect("customers array")
        .iter()
        .map(|c| c["id"].as_i64().expect("numeric id"))
        .collect()
}

#[rstest]
#[case("/api/customers?limit=0", "limit", "Invalid limit parameter")]
#[case("/api/customers?limit=251", "limit", "Invalid limit parameter")]
#[case("/api/customers?page=0", "page", "Invalid request parameters")]
#[case("/api/customers/search?query=email:a&limit=1", "limit", "Invalid limit parameter")]
#[case("/api/customers/search?query=email:a&limit=300", "limit", "Invalid limit parameter")]
#[case("/api/customers/search?query=email:a&page=0", "page", "Invalid page parameter")]
#[case("/api/customers/0", "id", "invalid id")]
#[case("/api/customers/-4", "id", "invalid id")]
#[tokio::test]
async fn out_of_range_parameters_are_rejected(
    #[case] uri: &str,
    #[case] key: &str,
    #[case] message: &str,
) {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][key], json!([message]));
}

#[tokio::test]
async fn unparseable_query_is_a_bad_request() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(Method::GET, "/api/customers?since_id=abc", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["query"].is_array());

    let (status, _) = app.call(Method::GET, "/api/customers/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_customer_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app.call(Method::GET, "/api/customers/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"]["customer"], json!(["not found"]));

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/customers/999",
            Some(json!({ "customer": { "admin_comment": "x" } })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call(Method::DELETE, "/api/customers/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_returns_the_full_customer() {
    let app = TestApp::new().await;
    let created = app
        .create_customer(
            "ada@example.com",
            json!({
                "username": "ada",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "language_id": 1,
                "admin_comment": "vip",
                "password": "correct horse"
            }),
        )
        .await;

    assert!(created["id"].as_i64().unwrap() > 0);
    assert_eq!(created["email"], "ada@example.com");
    assert_eq!(created["username"], "ada");
    assert_eq!(created["first_name"], "Ada");
    assert_eq!(created["last_name"], "Lovelace");
    assert_eq!(created["language_id"], "1");
    assert_eq!(created["active"], true);
    assert_eq!(created["deleted"], false);
    assert_eq!(created["role_ids"], json!([3]));
    assert!(created.get("password").is_none());
    assert!(created["customer_guid"].is_string());

    let (status, body) = app.call(Method::GET, "/api/customers/count", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 1 }));
}

#[tokio::test]
async fn create_stores_a_verifiable_password() {
    let app = TestApp::new().await;
    let created = app
        .create_customer("pw@example.com", json!({ "password": "s3cret!" }))
        .await;
    let id = created["id"].as_i64().unwrap() as i32;

    let services = &app.state.services;
    let stored = services
        .customers
        .get_current_password(id)
        .await
        .unwrap()
        .expect("password row");
    assert_eq!(stored.password_format, PasswordFormat::Hashed);
    assert_ne!(stored.password, "s3cret!");

    let salt = stored.password_salt.clone().expect("salt");
    let algorithm = app.state.config.customer.hashed_password_format;
    assert!(services
        .encryption
        .verify_password_hash("s3cret!", &salt, &stored.password, algorithm)
        .unwrap());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::new().await;
    app.create_customer("dup@example.com", json!({})).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/customers",
            Some(json!({ "customer": { "email": "dup@example.com", "role_ids": [3] } })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errors"]["email"], json!(["Email is already registered"]));
}

#[tokio::test]
async fn create_validation_reports_every_field() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/customers",
            Some(json!({ "customer": { "username": "nobody" } })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["role_ids"].is_array());

    let (status, body) = app
        .call(
            Method::POST,
            "/api/customers",
            Some(json!({ "customer": { "email": "not-an-email", "role_ids": [3] } })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["email"], json!(["Invalid email"]));
}

#[rstest]
#[case(json!([3, 4]), "The customer cannot be in both 'Guests' and 'Registered' customer roles")]
#[case(json!([3, 42]), "Invalid role ids")]
#[tokio::test]
async fn invalid_roles_are_rejected(#[case] role_ids: Value, #[case] message: &str) {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/customers",
            Some(json!({ "customer": { "email": "roles@example.com", "role_ids": role_ids } })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let messages = body["errors"]["role_ids"].as_array().unwrap();
    assert!(messages.contains(&json!(message)), "{body}");
}

#[tokio::test]
async fn malformed_payloads_are_bad_requests() {
    let app = TestApp::new().await;

    let response = app
        .request_raw(
            Method::POST,
            "/api/customers",
            Some(b"{not json".to_vec()),
            Some(app.token()),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["errors"]["json"].is_array());

    let (status, body) = app
        .call(
            Method::POST,
            "/api/customers",
            Some(json!({ "client": { "email": "a@b.com" } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["customer"].is_array());
}

#[tokio::test]
async fn fields_parameter_trims_customers() {
    let app = TestApp::new().await;
    let created = app
        .create_customer("fields@example.com", json!({ "username": "fields" }))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/customers/{id}?fields=Email,%20id,unknown"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "customers": [{ "id": id, "email": "fields@example.com" }] })
    );

    let (_, body) = app
        .call(Method::GET, "/api/customers?fields=username", None)
        .await;
    assert_eq!(body, json!({ "customers": [{ "username": "fields" }] }));
}

#[tokio::test]
async fn list_pages_by_id_and_since_id() {
    let app = TestApp::new().await;
    let mut created = Vec::new();
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        created.push(app.create_customer(email, json!({})).await["id"].as_i64().unwrap());
    }

    let (_, body) = app.call(Method::GET, "/api/customers", None).await;
    assert_eq!(ids(&body), created);

    let (_, body) = app
        .call(Method::GET, "/api/customers?limit=1&page=2", None)
        .await;
    assert_eq!(ids(&body), vec![created[1]]);

    let (_, body) = app
        .call(
            Method::GET,
            &format!("/api/customers?since_id={}", created[0]),
            None,
        )
        .await;
    assert_eq!(ids(&body), created[1..].to_vec());
}

#[tokio::test]
async fn search_matches_columns_and_names() {
    let app = TestApp::new().await;
    let john = app
        .create_customer("john@example.com", json!({ "first_name": "John" }))
        .await["id"]
        .as_i64()
        .unwrap();
    let jane = app
        .create_customer("jane@example.org", json!({ "first_name": "Jane" }))
        .await["id"]
        .as_i64()
        .unwrap();

    let (status, body) = app
        .call(Method::GET, "/api/customers/search?query=first_name:John", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![john]);

    let (_, body) = app
        .call(
            Method::GET,
            "/api/customers/search?query=email:example&order=Email%20desc",
            None,
        )
        .await;
    assert_eq!(ids(&body), vec![john, jane]);

    let (_, body) = app
        .call(
            Method::GET,
            "/api/customers/search?query=email:example.org%20first_name:John",
            None,
        )
        .await;
    assert!(ids(&body).is_empty());

    let (_, body) = app
        .call(Method::GET, "/api/customers/search?query=nonsense", None)
        .await;
    assert!(ids(&body).is_empty());
}

#[tokio::test]
async fn update_changes_only_sent_keys() {
    let app = TestApp::new().await;
    let created = app
        .create_customer(
            "partial@example.com",
            json!({ "username": "partial", "admin_comment": "vip", "first_name": "Pat" }),
        )
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({ "customer": { "id": 12345, "admin_comment": "changed", "active": false } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let updated = &body["customers"][0];
    assert_eq!(updated["id"], id);
    assert_eq!(updated["admin_comment"], "changed");
    assert_eq!(updated["active"], false);
    assert_eq!(updated["username"], "partial");
    assert_eq!(updated["email"], "partial@example.com");
    assert_eq!(updated["first_name"], "Pat");
    assert_eq!(updated["role_ids"], json!([3]));

    let (_, body) = app
        .call(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({ "customer": { "admin_comment": null } })),
        )
        .await;
    assert!(body["customers"][0].get("admin_comment").is_none());
}

#[tokio::test]
async fn billing_and_shipping_addresses_are_mapped() {
    let app = TestApp::new().await;
    let created = app
        .create_customer(
            "addr@example.com",
            json!({
                "billing_address": { "city": "Boston", "country_id": 1, "address1": "1 Main St" },
                "shipping_address": { "city": "Toronto", "country_id": 2 }
            }),
        )
        .await;

    let billing = &created["billing_address"];
    let shipping = &created["shipping_address"];
    assert_eq!(billing["city"], "Boston");
    assert_eq!(billing["country"], "United States");
    assert_eq!(shipping["city"], "Toronto");
    assert!(billing["created_on_utc"].is_string());

    let mapped: Vec<&Value> = created["addresses"].as_array().unwrap().iter().collect();
    assert_eq!(mapped.len(), 2);
    assert!(mapped.iter().any(|a| a["id"] == billing["id"]));
    assert!(mapped.iter().any(|a| a["id"] == shipping["id"]));
}

#[tokio::test]
async fn update_addresses_set_billing_first_and_shipping_last() {
    let app = TestApp::new().await;
    let created = app.create_customer("list@example.com", json!({})).await;
    let id = created["id"].as_i64().unwrap();
    assert!(created.get("billing_address").is_none());

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({ "customer": { "addresses": [
                { "city": "First" },
                { "city": "Middle" },
                { "city": "Last" }
            ] } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let updated = &body["customers"][0];
    assert_eq!(updated["addresses"].as_array().unwrap().len(), 3);
    assert_eq!(updated["billing_address"]["city"], "First");
    assert_eq!(updated["shipping_address"]["city"], "Last");

    // merging into a mapped address keeps its id
    let first_id = updated["billing_address"]["id"].as_i64().unwrap();
    let (_, body) = app
        .call(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({ "customer": { "addresses": [
                { "id": first_id, "zip_postal_code": "02139" }
            ] } })),
        )
        .await;
    let updated = &body["customers"][0];
    assert_eq!(updated["addresses"].as_array().unwrap().len(), 3);
    assert_eq!(updated["billing_address"]["id"], first_id);
    assert_eq!(updated["billing_address"]["city"], "First");
    assert_eq!(updated["billing_address"]["zip_postal_code"], "02139");
    assert_eq!(updated["shipping_address"]["id"], first_id);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({ "customer": { "addresses": [{ "id": 9999 }] } })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"]["address"], json!(["not found"]));
}

#[tokio::test]
async fn update_inserts_missing_billing_address() {
    let app = TestApp::new().await;
    let id = app.create_customer("late@example.com", json!({})).await["id"]
        .as_i64()
        .unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({ "customer": { "billing_address": { "city": "Oslo" } } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let updated = &body["customers"][0];
    assert_eq!(updated["billing_address"]["city"], "Oslo");
    assert_eq!(updated["addresses"][0]["city"], "Oslo");
    assert!(updated.get("shipping_address").is_none());
}

#[tokio::test]
async fn role_ids_are_reconciled() {
    let app = TestApp::new().await;
    let id = app.create_customer("roles@example.com", json!({})).await["id"]
        .as_i64()
        .unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({ "customer": { "role_ids": [1, 5] } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["customers"][0]["role_ids"], json!([1, 5]));

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({ "customer": { "role_ids": [4] } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["customers"][0]["role_ids"], json!([4]));
}

#[tokio::test]
async fn delete_soft_deletes_and_cleans_up() {
    let app = TestApp::new().await;
    let id = app.create_customer("bye@example.com", json!({})).await["id"]
        .as_i64()
        .unwrap();
    let services = &app.state.services;
    let store_id = services.stores.get_all_stores().await.unwrap()[0].id;
    services
        .newsletter
        .insert_subscription("bye@example.com", store_id, true)
        .await
        .unwrap();

    let (status, body) = app
        .call(Method::DELETE, &format!("/api/customers/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = app
        .call(Method::GET, &format!("/api/customers/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.call(Method::GET, "/api/customers/count", None).await;
    assert_eq!(body["count"], 0);

    let stored = services
        .customers
        .get_customer_by_id(id as i32)
        .await
        .unwrap()
        .expect("row kept");
    assert!(stored.deleted);
    assert_eq!(stored.email.as_deref(), Some("bye@example.com"));

    assert!(services
        .newsletter
        .get_subscription_by_email_and_store_id("bye@example.com", store_id)
        .await
        .unwrap()
        .is_none());

    let keywords: Vec<String> = services
        .activity
        .get_activities_for_entity(id as i32)
        .await
        .unwrap()
        .into_iter()
        .map(|a| {
            assert_eq!(a.client_id.as_deref(), Some(app.client_id.as_str()));
            a.system_keyword
        })
        .collect();
    assert_eq!(
        keywords,
        vec![
            activity::ADD_NEW_CUSTOMER.to_string(),
            activity::DELETE_CUSTOMER.to_string()
        ]
    );

    // the email is free again
    app.create_customer("bye@example.com", json!({})).await;
}

#[tokio::test]
async fn deleted_customers_can_be_suffixed() {
    let app = TestApp::with_config(|cfg, _| cfg.customer.suffix_deleted_customers = true).await;
    let id = app
        .create_customer("suffix@example.com", json!({ "username": "suffix" }))
        .await["id"]
        .as_i64()
        .unwrap();

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/customers/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let stored = app
        .state
        .services
        .customers
        .get_customer_by_id(id as i32)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.email.as_deref(), Some("suffix@example.com-DELETED"));
    assert_eq!(stored.username.as_deref(), Some("suffix-DELETED"));
}

#[tokio::test]
async fn duplicate_email_check_ignores_case() {
    let app = TestApp::new().await;
    app.create_customer("Dup@Example.com", json!({})).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/customers",
            Some(json!({ "customer": { "email": "dup@example.com", "role_ids": [3] } })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["errors"]["email"], json!(["Email is already registered"]));

    let (_, body) = app.call(Method::GET, "/api/customers/count", None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn address_list_wins_over_explicit_billing_id() {
    let app = TestApp::new().await;
    let created = app
        .create_customer(
            "slots@example.com",
            json!({ "billing_address": { "city": "Old" } }),
        )
        .await;
    let id = created["id"].as_i64().unwrap();
    let old_id = created["billing_address"]["id"].as_i64().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({ "customer": {
                "addresses": [{ "city": "First" }, { "city": "Last" }],
                "billing_address": { "id": old_id },
                "shipping_address": { "id": old_id }
            } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let updated = &body["customers"][0];
    assert_eq!(updated["billing_address"]["city"], "First");
    assert_eq!(updated["shipping_address"]["city"], "Last");
    assert_eq!(updated["addresses"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn list_honours_inclusive_creation_window() {
    let app = TestApp::new().await;
    let mut customers = Vec::new();
    for email in ["w1@example.com", "w2@example.com", "w3@example.com"] {
        let created = app.create_customer(email, json!({})).await;
        customers.push((
            created["id"].as_i64().unwrap(),
            created["created_on_utc"].as_str().unwrap().to_string(),
        ));
    }
    let (first, _) = &customers[0];
    let (middle, middle_created) = &customers[1];
    let (last, _) = &customers[2];

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/customers?created_at_min={middle_created}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(ids(&body), vec![*middle, *last]);

    let (_, body) = app
        .call(
            Method::GET,
            &format!("/api/customers?created_at_max={middle_created}"),
            None,
        )
        .await;
    assert_eq!(ids(&body), vec![*first, *middle]);

    let (_, body) = app
        .call(
            Method::GET,
            &format!(
                "/api/customers?created_at_min={middle_created}&created_at_max={middle_created}"
            ),
            None,
        )
        .await;
    assert_eq!(ids(&body), vec![*middle]);
}

#[rstest]
#[case(128, StatusCode::OK)]
#[case(129, StatusCode::UNPROCESSABLE_ENTITY)]
#[tokio::test]
async fn password_length_is_capped(#[case] length: usize, #[case] expected: StatusCode) {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/customers",
            Some(json!({ "customer": {
                "email": "long@example.com",
                "role_ids": [3],
                "password": "p".repeat(length)
            } })),
        )
        .await;
    assert_eq!(status, expected, "{body}");
    if expected == StatusCode::UNPROCESSABLE_ENTITY {
        assert_eq!(
            body["errors"]["password"],
            json!(["Password must be at most 128 characters"])
        );
    }
}

#[tokio::test]
async fn create_echoes_the_sent_language_id() {
    let app = TestApp::new().await;
    let created = app
        .create_customer("lang@example.com", json!({ "language_id": "99" }))
        .await;
    assert_eq!(created["language_id"], "99");

    // unknown languages are not stored
    let id = created["id"].as_i64().unwrap();
    let (_, body) = app
        .call(Method::GET, &format!("/api/customers/{id}"), None)
        .await;
    assert!(body["customers"][0].get("language_id").is_none());
}
