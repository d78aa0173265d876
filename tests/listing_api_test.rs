use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axtarget_backend::{
    app,
    config::{Config, DeletePolicy},
    database::{
        memory::MemoryListingStore,
        store::{ListingStore, StoreEvent},
    },
    error::{Error, Result},
    models::listing::{
        Gender, JobSeekerDetails, Listing, ListingDetails, NewListing, SeekerExperience,
        WorkMode, ANY,
    },
    AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value as JsonValue};
use tokio::sync::broadcast;
use tower::ServiceExt;
use uuid::Uuid;

fn test_config(delete_policy: DeletePolicy) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: None,
        session_secret: "test_secret_key".into(),
        session_ttl_hours: 24,
        app_id: "axtarget-test".into(),
        public_rps: 1000,
        write_rps: 1000,
        contact_country_code: "994".into(),
        delete_policy,
        json_logs: false,
    }
}

struct TestApp {
    router: Router,
    state: AppState,
    store: Arc<MemoryListingStore>,
}

impl TestApp {
    fn new(delete_policy: DeletePolicy) -> Self {
        let store = Arc::new(MemoryListingStore::new("axtarget-test"));
        let state = AppState::new(&test_config(delete_policy), store.clone());
        Self {
            router: app(state.clone()),
            state,
            store,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn begin_session(&self) -> String {
        let (status, body) = self
            .send(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    async fn post_listing(&self, token: &str, form: JsonValue) -> (StatusCode, JsonValue) {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/listings")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn delete_listing(&self, token: &str, id: &str) -> (StatusCode, JsonValue) {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/listings/{}", id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn get(&self, uri: &str) -> (StatusCode, JsonValue) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Creates a listing and approves it the way the moderator would.
    async fn publish(&self, token: &str, form: JsonValue) -> String {
        let (status, body) = self.post_listing(token, form).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let id = body["id"].as_str().unwrap().to_string();
        self.store
            .set_approved(Uuid::parse_str(&id).unwrap(), true)
            .await
            .unwrap();
        self.state.feed_service.refresh().await.unwrap();
        id
    }
}

fn job_seeker_form(title: &str) -> JsonValue {
    json!({
        "type": "job_seeker",
        "contact_number": "51-234-56-78",
        "email": "aysel@misal.az",
        "full_name": "Aysel Məmmədova",
        "skills": "Excel, 1C",
        "job_title": title,
        "gender": "female",
        "age": 24,
        "experience": "2_years",
    })
}

fn employer_form(company: &str) -> JsonValue {
    json!({
        "type": "employer",
        "contact_number": "70-555-44-33",
        "email": "hr@sirket.az",
        "full_name": "Rəşad",
        "company": company,
        "age_range": "26-35",
        "experience": "1_year",
        "region": "Bakı",
    })
}

#[tokio::test]
async fn browsing_is_open_but_writes_need_a_session() {
    let app = TestApp::new(DeletePolicy::AnySession);

    let (status, body) = app.get("/api/listings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["empty_message"], "Hələlik aktiv elanı yoxdur.");

    let (status, body) = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/listings")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(job_seeker_form("Mühasib").to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let (status, body) = app.post_listing("not-a-token", job_seeker_form("Mühasib")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn session_endpoint_echoes_the_bearer_identity() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;

    let (status, body) = app
        .send(
            Request::builder()
                .uri("/api/session")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session_id"].is_string());
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn new_listing_waits_for_approval_then_shows_in_feed() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;

    let (status, body) = app.post_listing(&token, job_seeker_form("Mühasib")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["approved"], false);
    assert_eq!(body["notice"]["title"], "Uğurlu!");
    assert_eq!(
        body["notice"]["message"],
        "Elanınız 1-2 saat ərzində yoxlanılıb paylaşılacaqdır."
    );
    let id = body["id"].as_str().unwrap().to_string();

    let (_, feed) = app.get("/api/listings").await;
    assert_eq!(feed["items"], json!([]));

    app.store
        .set_approved(Uuid::parse_str(&id).unwrap(), true)
        .await
        .unwrap();
    app.state.feed_service.refresh().await.unwrap();

    let (_, feed) = app.get("/api/listings").await;
    let item = &feed["items"][0];
    assert_eq!(item["id"], id.as_str());
    assert_eq!(item["contact_number"], "512345678");
    assert_eq!(item["contact_number_display"], "51-234-56-78");
    assert_eq!(item["display_name"], "Aysel Məmmədova");
    assert_eq!(item["headline"], "İş Axtaran: Mühasib");
    assert_eq!(item["region"], ANY);
    assert_eq!(item["work_form"], "online");
    assert!(feed["empty_message"].is_null());

    let (status, single) = app.get(&format!("/api/listings/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single["id"], id.as_str());
}

#[tokio::test]
async fn hidden_name_never_leaves_the_server() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;

    let mut form = job_seeker_form("Dizayner");
    form["hide_my_name"] = json!(true);
    app.publish(&token, form).await;

    let (_, feed) = app.get("/api/listings").await;
    let item = &feed["items"][0];
    assert!(item["display_name"].is_null());
    assert_eq!(item["name_hidden"], true);
    assert!(!feed.to_string().contains("Aysel"));
}

#[tokio::test]
async fn feed_is_newest_first_and_filters_by_type() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;

    let first = app.publish(&token, job_seeker_form("Aşpaz")).await;
    let second = app.publish(&token, employer_form("Bakı Çörək")).await;
    let third = app.publish(&token, job_seeker_form("Sürücü")).await;

    let (_, feed) = app.get("/api/listings").await;
    let ids: Vec<_> = feed["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![third.clone(), second.clone(), first.clone()]);

    let (_, seekers) = app.get("/api/listings?type=job_seeker").await;
    assert_eq!(seekers["filter"], "job_seeker");
    assert_eq!(seekers["items"].as_array().unwrap().len(), 2);
    assert_eq!(seekers["items"][0]["id"], third.as_str());
    assert_eq!(seekers["items"][1]["id"], first.as_str());

    let (_, employers) = app.get("/api/listings?type=employer").await;
    assert_eq!(employers["items"].as_array().unwrap().len(), 1);
    assert_eq!(employers["items"][0]["headline"], "İşçi Axtarılır: Bakı Çörək");
    assert_eq!(employers["items"][0]["gender"], "any");
    assert_eq!(employers["items"][0]["worker_form"], "physical");
}

#[tokio::test]
async fn listing_without_timestamp_sorts_last() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let legacy = NewListing {
        user_id: Uuid::new_v4(),
        contact_number: "553334455".into(),
        email: "kohne@misal.az".into(),
        hide_my_name: false,
        full_name: None,
        details: ListingDetails::JobSeeker(JobSeekerDetails {
            skills: "Word".into(),
            work_form: WorkMode::Physical,
            job_title: "Katib".into(),
            gender: Gender::Male,
            age: 40,
            experience: SeekerExperience::FivePlusYears,
            region: "Sumqayıt".into(),
        }),
    };
    let mut legacy: Listing = legacy.into_listing(Uuid::new_v4(), chrono::Utc::now());
    legacy.created_at = None;
    legacy.approved = true;
    let legacy_id = legacy.id;
    app.store.seed(legacy).await;

    let token = app.begin_session().await;
    let fresh = app.publish(&token, job_seeker_form("Operator")).await;

    let (_, feed) = app.get("/api/listings").await;
    assert_eq!(feed["items"][0]["id"], fresh.as_str());
    assert_eq!(feed["items"][1]["id"], legacy_id.to_string().as_str());
    assert!(feed["items"][1]["created_at"].is_null());
}

#[tokio::test]
async fn deleted_listing_disappears_from_the_feed() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;
    let id = app.publish(&token, employer_form("Araz")).await;

    let other = app.begin_session().await;
    let (status, body) = app.delete_listing(&other, &id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"]["message"], "Elanınız uğurla silindi.");

    let (_, feed) = app.get("/api/listings").await;
    assert_eq!(feed["items"], json!([]));

    let (status, _) = app.delete_listing(&token, &id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_only_policy_rejects_other_sessions() {
    let app = TestApp::new(DeletePolicy::OwnerOnly);
    let owner = app.begin_session().await;
    let id = app.publish(&owner, employer_form("Araz")).await;

    let stranger = app.begin_session().await;
    let (status, _) = app.delete_listing(&stranger, &id).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.len().await, 1);

    let (status, _) = app.delete_listing(&owner, &id).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn invalid_form_is_rejected_before_storage() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;

    let mut form = job_seeker_form("Mühasib");
    form["contact_number"] = json!("512345678");
    form["age"] = json!(15);
    let (status, body) = app.post_listing(&token, form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("contact_number"));
    assert!(message.contains("age"));
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn opted_out_email_is_stored_as_sentinel_and_not_contactable() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;

    let mut form = job_seeker_form("Kuryer");
    form.as_object_mut().unwrap().remove("email");
    form["opt_outs"] = json!({ "email": true });
    let id = app.publish(&token, form).await;

    let (_, feed) = app.get("/api/listings").await;
    assert_eq!(feed["items"][0]["email"], "E-poçt yoxdur");
    assert_eq!(feed["items"][0]["email_contactable"], false);

    let (status, _) = app
        .get(&format!("/api/listings/{}/contact/email", id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, prompt) = app
        .get(&format!("/api/listings/{}/contact/phone", id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prompt["title"], "Zəng Təsdiqi");
    assert_eq!(
        prompt["question"],
        "Siz +994 (51-234-56-78) nömrəsinə zəng etmək istəyirsiniz?"
    );
    assert_eq!(prompt["uri"], "tel:+994512345678");
}

#[tokio::test]
async fn form_state_reflects_opt_outs() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let form = json!({
        "type": "employer",
        "company": "ignored",
        "opt_outs": { "company": true, "phone": true },
    });

    let (status, body) = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/listings/form-state")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "employer");
    assert_eq!(
        body["fields"]["company"],
        json!({ "value": "Şəxsi Elan", "enabled": false, "required": false })
    );
    assert_eq!(body["fields"]["contact_number"]["value"], "Paylaşmaq istəmirəm");
    assert_eq!(body["fields"]["region"]["value"], ANY);
    assert_eq!(body["fields"]["email"]["enabled"], true);
    assert!(body["fields"].get("job_title").is_none());
}

#[tokio::test]
async fn stream_starts_with_current_snapshot() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;
    app.publish(&token, employer_form("Xəzər")).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/listings/stream?type=employer")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let mut frames = response.into_body().into_data_stream();
    let first = tokio::time::timeout(Duration::from_secs(2), frames.next())
        .await
        .expect("first frame")
        .unwrap()
        .unwrap();
    let text = String::from_utf8(first.to_vec()).unwrap();
    assert!(text.contains("event: snapshot"));
    assert!(text.contains("Xəzər"));
}

/// Reads frames until the next `snapshot` event and returns its payload.
async fn next_snapshot<S>(frames: &mut S, buffer: &mut String) -> JsonValue
where
    S: futures::Stream<Item = std::result::Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    loop {
        if let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            if !frame.contains("event: snapshot") {
                continue;
            }
            let data: String = frame
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim_start)
                .collect();
            return serde_json::from_str(&data).unwrap();
        }
        let chunk = tokio::time::timeout(Duration::from_secs(2), frames.next())
            .await
            .expect("next frame")
            .unwrap()
            .unwrap();
        buffer.push_str(std::str::from_utf8(&chunk).unwrap());
    }
}

fn companies(snapshot: &JsonValue) -> Vec<String> {
    snapshot["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["company"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn stream_pushes_full_snapshot_after_publish_and_delete() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;
    let first_id = app.publish(&token, employer_form("Xəzər")).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/listings/stream?type=employer")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let mut frames = response.into_body().into_data_stream();
    let mut buffer = String::new();

    let initial = next_snapshot(&mut frames, &mut buffer).await;
    assert_eq!(companies(&initial), vec!["Xəzər"]);

    app.publish(&token, job_seeker_form("Aşpaz")).await;
    app.publish(&token, employer_form("Bakcell")).await;
    let grown = loop {
        let snapshot = next_snapshot(&mut frames, &mut buffer).await;
        if companies(&snapshot).len() == 2 {
            break snapshot;
        }
    };
    assert_eq!(companies(&grown), vec!["Bakcell", "Xəzər"]);
    assert!(grown["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|item| item["type"] == "employer"));
    assert!(grown["version"].as_u64().unwrap() > initial["version"].as_u64().unwrap());

    let (status, _) = app.delete_listing(&token, &first_id).await;
    assert_eq!(status, StatusCode::OK);
    let shrunk = loop {
        let snapshot = next_snapshot(&mut frames, &mut buffer).await;
        if companies(&snapshot).len() == 1 {
            break snapshot;
        }
    };
    assert_eq!(companies(&shrunk), vec!["Bakcell"]);
}

#[tokio::test]
async fn malformed_body_is_a_json_bad_request() {
    let app = TestApp::new(DeletePolicy::AnySession);
    let token = app.begin_session().await;

    let mut form = job_seeker_form("Mühasib");
    form["age"] = json!("24");
    let (status, body) = app.post_listing(&token, form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let mut form = employer_form("Xəzər");
    form["type"] = json!("freelancer");
    let (status, body) = app.post_listing(&token, form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(app.store.is_empty().await);

    let (status, body) = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/listings/form-state")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

struct FailingStore {
    existing: Listing,
    events: broadcast::Sender<StoreEvent>,
}

#[async_trait]
impl ListingStore for FailingStore {
    fn collection_path(&self) -> String {
        "failing://job_ads".into()
    }

    async fn insert(&self, _listing: NewListing) -> Result<Listing> {
        Err(Error::Internal("network unreachable".into()))
    }

    async fn delete(&self, _id: Uuid) -> Result<bool> {
        Err(Error::Internal("network unreachable".into()))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Listing>> {
        Ok((self.existing.id == id).then(|| self.existing.clone()))
    }

    async fn list_approved(&self) -> Result<Vec<Listing>> {
        Ok(vec![self.existing.clone()])
    }

    fn changes(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[tokio::test]
async fn store_failures_return_notice_and_keep_feed() {
    let mut existing = NewListing {
        user_id: Uuid::new_v4(),
        contact_number: "501112233".into(),
        email: "a@b.az".into(),
        hide_my_name: false,
        full_name: None,
        details: ListingDetails::JobSeeker(JobSeekerDetails {
            skills: "Satış".into(),
            work_form: WorkMode::Online,
            job_title: "Satıcı".into(),
            gender: Gender::Female,
            age: 22,
            experience: SeekerExperience::None,
            region: ANY.into(),
        }),
    }
    .into_listing(Uuid::new_v4(), chrono::Utc::now());
    existing.approved = true;
    let existing_id = existing.id;

    let (events, _) = broadcast::channel(4);
    let store = Arc::new(FailingStore { existing, events });
    let state = AppState::new(&test_config(DeletePolicy::AnySession), store);
    state.feed_service.refresh().await.unwrap();
    let harness = TestApp {
        router: app(state.clone()),
        state,
        store: Arc::new(MemoryListingStore::new("unused")),
    };
    let token = harness.begin_session().await;

    let (status, body) = harness.post_listing(&token, job_seeker_form("Mühasib")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["notice"]["title"], "Xəta");
    assert_eq!(body["notice"]["message"], "Elanınızı paylaşmaq mümkün olmadı.");

    let (status, body) = harness.delete_listing(&token, &existing_id.to_string()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["notice"]["message"], "Elanınızı silmək mümkün olmadı.");

    let (_, feed) = harness.get("/api/listings").await;
    assert_eq!(feed["version"], 1);
    assert_eq!(feed["items"].as_array().unwrap().len(), 1);
    assert_eq!(feed["items"][0]["id"], existing_id.to_string().as_str());
}
