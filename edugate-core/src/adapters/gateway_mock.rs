//! Mock EduGate backend for testing the HTTP gateway
//!
//! A small threaded HTTP server speaking the backend's wire format:
//! - GET /courses, GET /courses/{id}, POST /courses
//! - GET /enrollments/seats/{id}, GET /enrollments/check, GET /enrollments/user/{email}
//! - POST /enrollments, DELETE /enrollments
//! - GET /jobs, POST /jobs/{id}/apply
//!
//! Authorized routes expect `Authorization: Bearer valid_...`.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::json;

/// Mock EduGate server for testing
pub struct MockGatewayServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Request as seen by the mock server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Configuration for mock behaviour
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub total_seats: u32,
    pub available_seats: u32,
    /// Reject every enrollment with this message (HTTP 400)
    pub reject_enroll: Option<String>,
    /// Answer enrollment creation with an empty body
    pub empty_enroll_body: bool,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            total_seats: 10,
            available_seats: 5,
            reject_enroll: None,
            empty_enroll_body: false,
            delay_ms: 0,
        }
    }
}

struct Shared {
    config: MockConfig,
    available: AtomicU32,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockGatewayServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let requests = Arc::new(Mutex::new(Vec::new()));

        // Non-blocking so the accept loop can notice shutdown
        listener.set_nonblocking(true)?;

        let shared = Arc::new(Shared {
            available: AtomicU32::new(config.available_seats),
            config,
            requests: requests.clone(),
        });

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let shared = shared.clone();
                        thread::spawn(move || handle_connection(stream, &shared));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockGatewayServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read headers, then as much body as Content-Length announces
fn read_request(stream: &mut TcpStream) -> Option<String> {
    stream.set_nonblocking(false).ok()?;
    let mut data = Vec::new();
    let mut buffer = [0; 4096];
    loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let lower = l.to_lowercase();
                    lower
                        .strip_prefix("content-length:")
                        .and_then(|v| v.trim().parse::<usize>().ok())
                })
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    Some(String::from_utf8_lossy(&data).into_owned())
}

fn handle_connection(mut stream: TcpStream, shared: &Shared) {
    let Some(request) = read_request(&mut stream) else {
        return;
    };

    if shared.config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(shared.config.delay_ms));
    }

    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
        return;
    }
    let method = parts[0].to_string();
    let path = parts[1].to_string();
    let authorization = request
        .lines()
        .find(|l| l.to_lowercase().starts_with("authorization:"))
        .map(|l| l["authorization:".len()..].trim().to_string());
    let body = request
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();

    if let Ok(mut log) = shared.requests.lock() {
        log.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            authorization: authorization.clone(),
            body: body.clone(),
        });
    }

    let authorized = authorization
        .as_deref()
        .is_some_and(|a| a.starts_with("Bearer valid_"));
    let path_without_query = path.split('?').next().unwrap_or(&path);
    let segments: Vec<&str> = path_without_query.trim_matches('/').split('/').collect();

    let needs_auth = !matches!(
        (method.as_str(), segments.as_slice()),
        ("GET", ["courses"]) | ("GET", ["courses", _]) | ("GET", ["enrollments", "seats", _]) | ("GET", ["jobs"])
    ) || segments == ["courses", "my-courses"];
    if needs_auth && !authorized {
        send_response(&mut stream, 401, "Unauthorized", r#"{"error": "Unauthorized access"}"#);
        return;
    }

    let total = shared.config.total_seats;
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["courses"]) => {
            let courses: Vec<_> = (1..=3)
                .map(|i| mock_course(&format!("c{}", i)))
                .collect();
            send_json(&mut stream, 200, &json!(courses));
        }
        ("GET", ["courses", "my-courses"]) => {
            send_json(&mut stream, 200, &json!([mock_course("mine")]));
        }
        ("GET", ["courses", "missing"]) => {
            send_response(&mut stream, 404, "Not Found", r#"{"error": "Course not found"}"#);
        }
        ("GET", ["courses", id]) => {
            send_json(&mut stream, 200, &mock_course(id));
        }
        ("POST", ["courses"]) => {
            send_json(&mut stream, 201, &json!({ "acknowledged": true, "insertedId": "new-course" }));
        }
        ("GET", ["enrollments", "seats", _]) => {
            let available = shared.available.load(Ordering::SeqCst);
            send_json(
                &mut stream,
                200,
                &json!({ "totalSeats": total, "availableSeats": available, "isFull": available == 0 }),
            );
        }
        ("GET", ["enrollments", "check"]) => {
            let enrolled = path.contains("courseId=c1");
            send_json(&mut stream, 200, &json!({ "isEnrolled": enrolled }));
        }
        ("GET", ["enrollments", "user", email]) => {
            let email = email.replace("%40", "@");
            send_json(
                &mut stream,
                200,
                &json!([{ "courseId": "c1", "userEmail": email, "enrolledAt": "2025-01-02T03:04:05Z" }]),
            );
        }
        ("POST", ["enrollments"]) => {
            if let Some(message) = &shared.config.reject_enroll {
                send_json(&mut stream, 400, &json!({ "error": message }));
                return;
            }
            let available = shared.available.load(Ordering::SeqCst).saturating_sub(1);
            shared.available.store(available, Ordering::SeqCst);
            if shared.config.empty_enroll_body {
                send_response(&mut stream, 201, "Created", "");
            } else {
                send_json(&mut stream, 201, &json!({ "success": true, "availableSeats": available }));
            }
        }
        ("DELETE", ["enrollments"]) => {
            let available = (shared.available.load(Ordering::SeqCst) + 1).min(total);
            shared.available.store(available, Ordering::SeqCst);
            send_json(&mut stream, 200, &json!({ "success": true }));
        }
        ("GET", ["jobs"]) => {
            send_json(
                &mut stream,
                200,
                &json!([{ "_id": "j1", "title": "Rust Engineer", "company": "Acme", "type": "Full-time", "description": "Build", "postedAt": "2025-03-04T00:00:00Z" }]),
            );
        }
        ("POST", ["jobs", _, "apply"]) => {
            send_json(&mut stream, 201, &json!({ "success": true }));
        }
        _ => {
            send_response(&mut stream, 404, "Not Found", "");
        }
    }
}

fn mock_course(id: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "title": format!("Course {}", id),
        "description": "Mock course",
        "imageUrl": "https://img.example/c.png",
        "duration": "4 weeks",
        "category": "web development",
        "addedByEmail": "owner@example.com",
        "addedByName": "Owner",
        "addedAt": "2025-01-01T00:00:00Z",
        "enrollments": 2,
        "rating": 4.2
    })
}

fn send_json(stream: &mut TcpStream, status: u16, value: &serde_json::Value) {
    let text = match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        _ => "Error",
    };
    send_response(stream, status, text, &value.to_string());
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::adapters::http::HttpGateway;
    use crate::domain::result::Error;
    use crate::domain::{CourseDraft, CourseSort, Identity, JobApplication};
    use crate::ports::CourseGateway;

    fn client(server: &MockGatewayServer) -> HttpGateway {
        HttpGateway::new_with_base_url(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_and_get_courses() {
        let server = MockGatewayServer::start(MockConfig::default()).unwrap();
        let gw = client(&server);

        let courses = gw.list_courses(CourseSort::MostPopular, 20, 2).await.unwrap();
        assert_eq!(courses.len(), 3);

        let course = gw.get_course("c2").await.unwrap().unwrap();
        assert_eq!(course.title, "Course c2");

        assert!(gw.get_course("missing").await.unwrap().is_none());

        let list = &server.requests()[0];
        assert!(list.path.contains("sort=enrollments_desc"));
        assert!(list.path.contains("limit=20"));
        assert!(list.path.contains("page=2"));
        assert!(list.authorization.is_none());
    }

    #[tokio::test]
    async fn test_seat_info_and_enrollment_round() {
        let server = MockGatewayServer::start(MockConfig {
            total_seats: 3,
            available_seats: 1,
            ..Default::default()
        })
        .unwrap();
        let gw = client(&server);

        let seats = gw.seat_info("c1").await.unwrap();
        assert_eq!(seats.available_seats, 1);
        assert!(!seats.is_full);

        let receipt = gw.create_enrollment("valid_tok", "c1", Utc::now()).await.unwrap();
        assert_eq!(receipt.available_seats, Some(0));
        assert!(gw.seat_info("c1").await.unwrap().is_full);

        gw.delete_enrollment("valid_tok", "c1", "u@example.com").await.unwrap();
        assert_eq!(gw.seat_info("c1").await.unwrap().available_seats, 1);

        let requests = server.requests();
        let create = requests.iter().find(|r| r.method == "POST").unwrap();
        assert_eq!(create.authorization.as_deref(), Some("Bearer valid_tok"));
        assert!(create.body.contains("\"courseId\":\"c1\""));
        assert!(create.body.contains("enrolledAt"));

        let delete = requests.iter().find(|r| r.method == "DELETE").unwrap();
        assert!(delete.body.contains("\"userEmail\":\"u@example.com\""));
    }

    #[tokio::test]
    async fn test_server_rejection_message_is_surfaced() {
        let server = MockGatewayServer::start(MockConfig {
            reject_enroll: Some("Course is full".to_string()),
            ..Default::default()
        })
        .unwrap();
        let gw = client(&server);

        let err = gw.create_enrollment("valid_tok", "c1", Utc::now()).await.unwrap_err();
        match err {
            Error::Gateway { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "Course is full");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bodiless_error_falls_back_to_status() {
        let server = MockGatewayServer::start(MockConfig::default()).unwrap();
        let gw = client(&server);

        // No route deletes courses, so the server answers 404 with no body
        let err = gw.delete_course("valid_tok", "c1").await.unwrap_err();
        match err {
            Error::Gateway { status, message } => {
                assert_eq!(status, Some(404));
                assert_eq!(message, "Request failed with HTTP 404");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_enrollment_body_is_accepted() {
        let server = MockGatewayServer::start(MockConfig {
            empty_enroll_body: true,
            ..Default::default()
        })
        .unwrap();
        let gw = client(&server);
        let receipt = gw.create_enrollment("valid_tok", "c1", Utc::now()).await.unwrap();
        assert!(receipt.available_seats.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_token_maps_to_401() {
        let server = MockGatewayServer::start(MockConfig::default()).unwrap();
        let gw = client(&server);
        let err = gw.user_enrollments("expired", "u@example.com").await.unwrap_err();
        assert!(err.requires_sign_in());
        assert_eq!(err.to_string(), "Unauthorized access");
    }

    #[tokio::test]
    async fn test_user_scoped_reads() {
        let server = MockGatewayServer::start(MockConfig::default()).unwrap();
        let gw = client(&server);

        assert!(gw.check_enrollment("valid_tok", "u@example.com", "c1").await.unwrap());
        assert!(!gw.check_enrollment("valid_tok", "u@example.com", "c2").await.unwrap());

        let mine = gw.user_enrollments("valid_tok", "u@example.com").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].course_id, "c1");

        let owned = gw.my_courses("valid_tok").await.unwrap();
        assert_eq!(owned[0].id, "mine");
    }

    #[tokio::test]
    async fn test_create_course_from_insert_ack() {
        let server = MockGatewayServer::start(MockConfig::default()).unwrap();
        let gw = client(&server);
        let draft = CourseDraft {
            title: "New".to_string(),
            description: "D".to_string(),
            image_url: "https://img".to_string(),
            duration: "2 weeks".to_string(),
        };
        let owner = Identity::new("u", "u@example.com").with_display_name("Ursula");
        let course = gw.create_course("valid_tok", &draft, &owner, Utc::now()).await.unwrap();
        assert_eq!(course.id, "new-course");
        assert_eq!(course.added_by_name.as_deref(), Some("Ursula"));

        let post = server.requests().into_iter().find(|r| r.method == "POST").unwrap();
        assert!(post.body.contains("\"addedByEmail\":\"u@example.com\""));
    }

    #[tokio::test]
    async fn test_jobs() {
        let server = MockGatewayServer::start(MockConfig::default()).unwrap();
        let gw = client(&server);
        let jobs = gw.list_jobs().await.unwrap();
        assert_eq!(jobs[0].company, "Acme");

        let application = JobApplication {
            user_email: "u@example.com".to_string(),
            user_name: "U".to_string(),
            resume_url: "https://cv".to_string(),
            cover_letter: "Hi".to_string(),
        };
        gw.apply_job("valid_tok", "j1", &application).await.unwrap();
        let apply = server.requests().into_iter().find(|r| r.method == "POST").unwrap();
        assert_eq!(apply.path, "/jobs/j1/apply");
        assert!(apply.body.contains("resumeUrl"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_friendly() {
        let gw = HttpGateway::new_with_base_url("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = gw.list_jobs().await.unwrap_err();
        assert!(matches!(err, Error::Gateway { status: None, .. }));
    }
}
