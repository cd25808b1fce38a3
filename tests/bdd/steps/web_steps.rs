use cucumber::{given, then, when};

use crate::WordsWorld;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Start an in-process axum test server using the world's temp database.
/// Binds to a random free port (port 0), stores the port and task handle
/// in the world for later use and cleanup.
pub async fn start_test_server(world: &mut WordsWorld) -> u16 {
    let db_path = world
        .db_path
        .as_ref()
        .expect("db_path not set - did you forget 'Given a words database is initialized'?")
        .clone();

    let db = words::db::Database::open(&db_path).expect("failed to open database for web server");
    db.migrate().expect("failed to migrate database");
    let app = words::web::create_router(words::web::AppState::new(db));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to ephemeral port");
    let port = listener
        .local_addr()
        .expect("failed to get local addr")
        .port();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("web server error in test");
    });

    world.server_port = Some(port);
    world.server_handle = Some(handle);

    // Wait until the server accepts connections (up to ~100 ms).
    for _ in 0..20 {
        if world
            .http_client
            .get(format!("http://127.0.0.1:{port}/health"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    port
}

/// Send a request with an optional raw JSON body and record status, content
/// type and body on the world.
pub async fn http_send(
    world: &mut WordsWorld,
    method: reqwest::Method,
    path: &str,
    body: Option<String>,
) -> (u16, String) {
    http_send_as(world, method, path, body, Some("application/json")).await
}

/// Like [`http_send`], but the body goes out with `content_type`, or with no
/// Content-Type header at all when it is `None`.
pub async fn http_send_as(
    world: &mut WordsWorld,
    method: reqwest::Method,
    path: &str,
    body: Option<String>,
    content_type: Option<&str>,
) -> (u16, String) {
    let port = world
        .server_port
        .expect("server not started - add 'Given the web server is running'");
    let url = format!("http://127.0.0.1:{port}{}", world.resolve(path));
    let mut req = world.http_client.request(method.clone(), &url);
    if let Some(body) = body {
        if let Some(content_type) = content_type {
            req = req.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        req = req.body(world.resolve(&body));
    }
    let resp = req
        .send()
        .await
        .unwrap_or_else(|e| panic!("{method} {url} failed: {e}"));
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let body = resp
        .text()
        .await
        .unwrap_or_else(|e| panic!("failed to read response body: {e}"));
    world.last_response_status = Some(status);
    world.last_response_content_type = content_type;
    world.last_response_body = Some(body.clone());
    (status, body)
}

pub async fn http_get(world: &mut WordsWorld, path: &str) -> (u16, String) {
    http_send(world, reqwest::Method::GET, path, None).await
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

/// Start the in-process web server backed by the world's temp database.
#[given("the web server is running")]
async fn the_web_server_is_running(world: &mut WordsWorld) {
    start_test_server(world).await;
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

/// Perform a GET request to `path` on the test server and store the response.
#[when(expr = "I GET {string}")]
async fn i_get_path(world: &mut WordsWorld, path: String) {
    http_get(world, &path).await;
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

/// Assert that the most recent HTTP response had the given status code.
#[then(expr = "the response status is {int}")]
async fn the_response_status_is(world: &mut WordsWorld, expected: u16) {
    let actual = world
        .last_response_status
        .expect("no HTTP response recorded - did you make a request?");
    assert_eq!(
        actual,
        expected,
        "expected HTTP status {expected} but got {actual}: {}",
        world.last_response_body.as_deref().unwrap_or("")
    );
}

/// Assert that the most recent HTTP response body contains the given substring.
#[then(expr = "the response body contains {string}")]
async fn the_response_body_contains(world: &mut WordsWorld, expected: String) {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response body recorded - did you make a request?");
    assert!(
        body.contains(&expected),
        "expected response body to contain {expected:?}, but body was:\n{body}"
    );
}

/// Assert that the most recent HTTP response body does not contain the given substring.
#[then(expr = "the response body does not contain {string}")]
async fn the_response_body_does_not_contain(world: &mut WordsWorld, unexpected: String) {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response body recorded - did you make a request?");
    assert!(
        !body.contains(&unexpected),
        "expected response body not to contain {unexpected:?}, but body was:\n{body}"
    );
}

/// Assert that the most recent HTTP response has a Content-Type header
/// containing the given value (partial match, e.g. "text/html").
#[then(expr = "the response content type is {string}")]
async fn the_response_content_type_is(world: &mut WordsWorld, expected: String) {
    let actual = world
        .last_response_content_type
        .as_deref()
        .unwrap_or("<no content-type header>");
    assert!(
        actual.contains(&expected),
        "expected Content-Type to contain {expected:?} but got {actual:?}"
    );
}
