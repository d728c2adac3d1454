//! Provider clients against a local stub of the Gmail and Graph APIs

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{json, Value};

use domain_identity::OutgoingMessage;
use domain_intake::{AttachmentSource, MailProvider};
use infra_mail::{GmailClient, GraphClient, MailError, MailSender};

#[derive(Clone, Default)]
struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    fn push(&self, call: String) {
        self.0.lock().unwrap().push(call);
    }

    fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer good-token")
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn b64url(text: &str) -> String {
    URL_SAFE_NO_PAD.encode(text.as_bytes())
}

async fn gmail_stub(calls: Calls) -> String {
    async fn list(
        State(calls): State<Calls>,
        headers: HeaderMap,
        Query(q): Query<Vec<(String, String)>>,
    ) -> Result<Json<Value>, StatusCode> {
        if !authorized(&headers) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        calls.push(format!("list {:?}", q));
        Ok(Json(json!({ "messages": [{ "id": "m-1", "threadId": "t-1" }], "resultSizeEstimate": 1 })))
    }

    async fn message(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
        if id != "m-1" {
            return Err(StatusCode::NOT_FOUND);
        }
        Ok(Json(json!({
            "id": "m-1",
            "threadId": "t-1",
            "payload": {
                "mimeType": "multipart/mixed",
                "headers": [
                    { "name": "From", "value": "New India Claims <claims@newindia.co.in>" },
                    { "name": "Subject", "value": "Claim No 12345/2024 intimation" },
                    { "name": "Date", "value": "Tue, 02 Jul 2024 10:15:00 +0530" }
                ],
                "parts": [
                    { "mimeType": "text/plain", "body": { "size": 12, "data": b64url("Please assign") } },
                    { "mimeType": "application/pdf", "filename": "policy.pdf",
                      "body": { "attachmentId": "att-9", "size": 2048 } }
                ]
            }
        })))
    }

    async fn attachment(Path((_id, aid)): Path<(String, String)>) -> Json<Value> {
        Json(json!({ "size": 5, "data": b64url(&format!("bytes-of-{}", aid)) }))
    }

    async fn modify(State(calls): State<Calls>, Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
        calls.push(format!("modify {} {}", id, body["removeLabelIds"]));
        Json(json!({ "id": id }))
    }

    async fn send(State(calls): State<Calls>, Json(body): Json<Value>) -> Json<Value> {
        let raw = URL_SAFE_NO_PAD.decode(body["raw"].as_str().unwrap_or_default()).unwrap();
        calls.push(format!("send {}", String::from_utf8(raw).unwrap()));
        Json(json!({ "id": "sent-1" }))
    }

    let app = Router::new()
        .route("/users/me/messages", get(list))
        .route("/users/me/messages/:id", get(message))
        .route("/users/me/messages/:id/attachments/:aid", get(attachment))
        .route("/users/me/messages/:id/modify", post(modify))
        .route("/users/me/messages/send", post(send))
        .route("/users/me/profile", get(|| async { Json(json!({ "emailAddress": "claims@desk.example.com" })) }))
        .with_state(calls);

    format!("http://{}", serve(app).await)
}

#[tokio::test]
async fn test_gmail_lists_fetches_and_marks_read() {
    let calls = Calls::default();
    let base = gmail_stub(calls.clone()).await;
    let client = GmailClient::with_base_url(reqwest::Client::new(), "good-token".to_string(), &base);

    let ids = client.list_unread(10).await.unwrap();
    assert_eq!(ids, vec!["m-1".to_string()]);

    let message = client.fetch_message("m-1").await.unwrap();
    assert_eq!(message.email.sender_email, "claims@newindia.co.in");
    assert_eq!(message.attachments.len(), 1);
    assert_eq!(message.attachments[0].source, AttachmentSource::Remote("att-9".to_string()));

    let bytes = client.fetch_attachment("m-1", "att-9").await.unwrap();
    assert_eq!(bytes, b"bytes-of-att-9");

    client.mark_read("m-1").await.unwrap();
    assert_eq!(client.profile_address().await.unwrap(), "claims@desk.example.com");

    let recorded = calls.all();
    assert!(recorded[0].contains("is:unread"));
    assert!(recorded[0].contains("maxResults"));
    assert!(recorded.iter().any(|c| c == "modify m-1 [\"UNREAD\"]"));
}

#[tokio::test]
async fn test_gmail_rejected_token_is_unauthorized() {
    let base = gmail_stub(Calls::default()).await;
    let client = GmailClient::with_base_url(reqwest::Client::new(), "stale-token".to_string(), &base);

    let err = client.list_unread(10).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_gmail_missing_message_is_provider_error() {
    let base = gmail_stub(Calls::default()).await;
    let client = GmailClient::with_base_url(reqwest::Client::new(), "good-token".to_string(), &base);

    assert!(client.fetch_message("nope").await.is_err());
}

#[tokio::test]
async fn test_gmail_send_builds_raw_message() {
    let calls = Calls::default();
    let base = gmail_stub(calls.clone()).await;
    let client = GmailClient::with_base_url(reqwest::Client::new(), "good-token".to_string(), &base);

    client
        .send(&OutgoingMessage {
            to: "asha@example.com".to_string(),
            subject: "Your verification code - Claims Desk".to_string(),
            body: "Your verification code is: 482913".to_string(),
        })
        .await
        .unwrap();

    let sent = calls.all().into_iter().find(|c| c.starts_with("send")).unwrap();
    assert!(sent.contains("To: asha@example.com\r\n"));
    assert!(sent.ends_with("Your verification code is: 482913"));
}

async fn graph_stub(calls: Calls) -> String {
    async fn list(State(calls): State<Calls>, Query(q): Query<Vec<(String, String)>>) -> Json<Value> {
        calls.push(format!("list {:?}", q));
        Json(json!({ "value": [{ "id": "AAMk-1" }, { "id": "AAMk-2" }] }))
    }

    async fn message(Path(id): Path<String>) -> Json<Value> {
        Json(json!({
            "id": id,
            "conversationId": "conv-1",
            "subject": "Reminder: claim 555",
            "from": { "emailAddress": { "name": "ICICI Lombard", "address": "motor@icicilombard.com" } },
            "toRecipients": [{ "emailAddress": { "address": "claims@desk.example.com" } }],
            "body": { "contentType": "html", "content": "<p>Second reminder</p>" },
            "receivedDateTime": "2024-07-02T04:45:00Z",
            "hasAttachments": true
        }))
    }

    async fn attachments() -> Json<Value> {
        Json(json!({ "value": [
            { "@odata.type": "#microsoft.graph.fileAttachment", "id": "a1", "name": "petition.pdf",
              "contentType": "application/pdf", "size": 4, "contentBytes": STANDARD.encode(b"%PDF") },
            { "@odata.type": "#microsoft.graph.itemAttachment", "id": "a2", "name": "forwarded.msg" }
        ] }))
    }

    async fn mark(State(calls): State<Calls>, Path(id): Path<String>, Json(body): Json<Value>) -> StatusCode {
        calls.push(format!("patch {} {}", id, body["isRead"]));
        StatusCode::OK
    }

    async fn throttled() -> StatusCode {
        StatusCode::TOO_MANY_REQUESTS
    }

    let app = Router::new()
        .route("/me/mailFolders/inbox/messages", get(list))
        .route("/me/messages/:id", get(message).patch(mark))
        .route("/me/messages/:id/attachments", get(attachments))
        .route("/me/sendMail", post(throttled))
        .with_state(calls);

    format!("http://{}", serve(app).await)
}

#[tokio::test]
async fn test_graph_fetches_file_attachments_only() {
    let calls = Calls::default();
    let base = graph_stub(calls.clone()).await;
    let client = GraphClient::with_base_url(reqwest::Client::new(), "good-token".to_string(), &base);

    let ids = client.list_unread(5).await.unwrap();
    assert_eq!(ids.len(), 2);

    let message = client.fetch_message("AAMk-1").await.unwrap();
    assert_eq!(message.email.sender_email, "motor@icicilombard.com");
    assert_eq!(message.email.body_html, "<p>Second reminder</p>");
    assert_eq!(message.attachments.len(), 1);
    assert_eq!(message.attachments[0].source, AttachmentSource::Inline(b"%PDF".to_vec()));

    client.mark_read("AAMk-1").await.unwrap();

    let recorded = calls.all();
    assert!(recorded[0].contains("isRead eq false"));
    assert!(recorded.iter().any(|c| c == "patch AAMk-1 true"));
}

#[tokio::test]
async fn test_graph_send_rate_limited() {
    let base = graph_stub(Calls::default()).await;
    let client = GraphClient::with_base_url(reqwest::Client::new(), "good-token".to_string(), &base);

    let err = client
        .send(&OutgoingMessage { to: "a@b.com".to_string(), subject: "s".to_string(), body: "b".to_string() })
        .await
        .unwrap_err();
    assert!(matches!(err, MailError::RateLimited));
    assert!(err.is_transient());
}
