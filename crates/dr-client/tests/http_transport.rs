//! The HTTP transport against a loopback `tiny_http` backend.

use std::io::Write;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use dr_client::{ClientError, ResearchClient};
use dr_config::ServerConfig;
use dr_core::enums::{ReviewAction, SessionStatus};
use dr_core::ids::ThreadId;
use dr_session::{CONNECTED_MESSAGE, ReviewRequest, SessionController};
use dr_stream::Frame;
use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

/// What the backend saw.
#[derive(Debug)]
struct Seen {
    method: String,
    url: String,
    accept: Option<String>,
    content_type: Option<String>,
    body: Vec<u8>,
}

/// A canned backend reply.
struct Reply {
    status: u16,
    content_type: &'static str,
    body: String,
}

impl Reply {
    fn ok(content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.into(),
        }
    }
}

/// Serve `replies` in order, one request each, and report every request.
fn serve(replies: Vec<Reply>) -> (ResearchClient, mpsc::Receiver<Seen>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for reply in replies {
            let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(10)) else {
                return;
            };
            let header = |name: &str| {
                request
                    .headers()
                    .iter()
                    .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
                    .map(|h| h.value.as_str().to_string())
            };
            let accept = header("Accept");
            let content_type = header("Content-Type");
            let mut body = Vec::new();
            request.as_reader().read_to_end(&mut body).unwrap();
            let seen = Seen {
                method: request.method().as_str().to_string(),
                url: request.url().to_string(),
                accept,
                content_type,
                body,
            };

            let content_type =
                tiny_http::Header::from_bytes("Content-Type", reply.content_type).unwrap();
            let response = tiny_http::Response::from_string(reply.body)
                .with_status_code(reply.status)
                .with_header(content_type);
            let _ = request.respond(response);
            let _ = tx.send(seen);
        }
    });

    let client = ResearchClient::from_config(&ServerConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        ..ServerConfig::default()
    })
    .unwrap();
    (client, rx)
}

fn event(event_type: &str, data: &Value) -> String {
    format!("event: {event_type}\ndata: {data}\n\n")
}

async fn collect(stream: dr_stream::BoxFrameStream) -> Vec<Frame> {
    stream.map(|item| item.unwrap()).collect().await
}

#[tokio::test]
async fn start_stream_is_an_event_source_get() {
    let body = format!(
        ": keep-alive\nretry: 3000\n\n{}{}",
        event("log", &json!({"message": "开始"})),
        event("done", &json!({})),
    );
    let (client, seen) = serve(vec![Reply::ok("text/event-stream", body)]);

    let thread_id = ThreadId::from_raw("thread_42");
    let frames = collect(client.start_stream(&thread_id, "调研A").await.unwrap()).await;

    assert_eq!(
        frames,
        vec![
            Frame::new("log", json!({"message": "开始"})),
            Frame::new("done", json!({})),
        ]
    );
    let seen = seen.recv().unwrap();
    assert_eq!(seen.method, "GET");
    assert_eq!(
        seen.url,
        "/api/research/stream/thread_42?goal=%E8%B0%83%E7%A0%94A"
    );
    assert_eq!(seen.accept.as_deref(), Some("text/event-stream"));
}

#[tokio::test]
async fn resume_posts_review_json() {
    let body = event("report_token", &json!({"token": "# R"}));
    let (client, seen) = serve(vec![Reply::ok("text/plain", body)]);

    let review = ReviewRequest {
        thread_id: ThreadId::from_raw("thread_42"),
        action: ReviewAction::Approve,
        feedback: None,
    };
    let frames = collect(client.resume_stream(&review).await.unwrap()).await;

    assert_eq!(frames, vec![Frame::new("report_token", json!({"token": "# R"}))]);
    let seen = seen.recv().unwrap();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.url, "/api/research/review");
    assert!(
        seen.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"))
    );
    let sent: Value = serde_json::from_slice(&seen.body).unwrap();
    assert_eq!(
        sent,
        json!({"thread_id": "thread_42", "action": "approve", "feedback": null})
    );
}

#[tokio::test]
async fn upload_sends_multipart_file_part() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(b"quarterly numbers")
        .unwrap();

    let body = event("log", &json!({"message": "Indexed 1 chunk"}));
    let (client, seen) = serve(vec![Reply::ok("text/plain", body)]);

    let frames = collect(client.upload_document(&path).await.unwrap()).await;

    assert_eq!(
        frames,
        vec![Frame::new("log", json!({"message": "Indexed 1 chunk"}))]
    );
    let seen = seen.recv().unwrap();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.url, "/api/ingest/upload");
    assert!(
        seen.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("multipart/form-data"))
    );
    let sent = String::from_utf8_lossy(&seen.body);
    assert!(sent.contains(r#"name="file"; filename="notes.txt""#), "{sent}");
    assert!(sent.contains("quarterly numbers"));
}

#[tokio::test]
async fn non_success_status_is_an_api_error() {
    let (client, _seen) = serve(vec![Reply {
        status: 502,
        content_type: "text/plain",
        body: "bad gateway".into(),
    }]);

    let err = client
        .start_stream(&ThreadId::from_raw("thread_1"), "G")
        .await
        .err()
        .unwrap();

    assert!(
        matches!(err, ClientError::Api { status: 502, ref message } if message == "bad gateway"),
        "{err}"
    );
}

#[tokio::test]
async fn missing_upload_file_is_an_io_error() {
    let (client, _seen) = serve(vec![]);
    let err = client
        .upload_document(std::path::Path::new("/nonexistent/paper.pdf"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ClientError::Io(_)));
}

#[tokio::test]
async fn controller_drives_interrupt_and_resume_over_http() {
    let plan = json!({
        "type": "plan_review",
        "data": [{"id": 1, "title": "Market size", "intent": "I", "query": "Q"}],
        "message": "Please review the research plan"
    });
    let (client, seen) = serve(vec![
        Reply::ok("text/event-stream", event("interrupt", &plan)),
        Reply::ok(
            "text/plain",
            format!(
                "{}{}",
                event("report_token", &json!({"token": "```markdown\n# Market\n```"})),
                event("done", &json!({})),
            ),
        ),
    ]);
    let mut controller = SessionController::new(client);

    let thread_id = controller.start("market research").await.unwrap();
    assert_eq!(controller.run().await, SessionStatus::WaitingReview);
    assert_eq!(controller.state().log()[0].message, CONNECTED_MESSAGE);
    assert_eq!(
        controller.state().log()[1].message,
        "Please review the research plan"
    );

    controller.revise("add 2025 data").await.unwrap();
    assert_eq!(controller.run().await, SessionStatus::Completed);
    assert_eq!(controller.state().report().cleaned(), "# Market\n");

    let start = seen.recv().unwrap();
    assert!(start.url.contains(thread_id.as_str()));
    let resume = seen.recv().unwrap();
    let sent: Value = serde_json::from_slice(&resume.body).unwrap();
    assert_eq!(
        sent,
        json!({
            "thread_id": thread_id.as_str(),
            "action": "revise",
            "feedback": "add 2025 data"
        })
    );
}
