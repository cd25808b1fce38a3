use cucumber::{given, then, when};
use serde_json::{Value, json};

use crate::WordsWorld;
use crate::steps::web_steps::{http_send, http_send_as};

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Parse the last response body as JSON, panicking with a descriptive message
/// if it is not valid JSON.
fn parse_last_response(world: &WordsWorld) -> Value {
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response body recorded");
    serde_json::from_str(body)
        .unwrap_or_else(|e| panic!("response body is not valid JSON: {e}\nbody: {body}"))
}

/// POST a JSON body, require 201, and remember the returned id under `alias`.
async fn api_create(world: &mut WordsWorld, alias: &str, path: &str, body: Value) {
    let (status, body_text) =
        http_send(world, reqwest::Method::POST, path, Some(body.to_string())).await;
    assert_eq!(
        status, 201,
        "expected 201 from POST {path} but got {status}: {body_text}"
    );
    let json: Value = serde_json::from_str(&body_text)
        .unwrap_or_else(|e| panic!("POST {path} response is not valid JSON: {e}\n{body_text}"));
    let id = json["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("POST {path} response has no numeric 'id': {json}"));
    world.ids.insert(alias.to_string(), id);
}

fn array_names(json: &Value) -> Vec<String> {
    json.as_array()
        .unwrap_or_else(|| panic!("expected response body to be a JSON array but got: {json}"))
        .iter()
        .map(|item| item["name"].as_str().unwrap_or("").to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Given steps - data setup through the API
// ---------------------------------------------------------------------------

#[given(expr = "a user {string} with password {string} exists")]
async fn a_user_exists(world: &mut WordsWorld, name: String, password: String) {
    let body = json!({"name": name, "password": password});
    api_create(world, &name, "/api/users", body).await;
}

#[given(expr = "a language {string} exists as {string}")]
async fn a_language_exists(world: &mut WordsWorld, name: String, alias: String) {
    api_create(world, &alias, "/api/languages", json!({"name": name})).await;
}

#[given(expr = "a catalog {string} in language {string} owned by {string} exists")]
async fn a_catalog_exists(world: &mut WordsWorld, name: String, language: String, owner: String) {
    let body = json!({
        "name": name,
        "language_id": world.id(&language),
        "user_id": world.id(&owner),
    });
    api_create(world, &name, "/api/catalogs", body).await;
}

#[given(expr = "a word {string} meaning {string} in catalog {string} exists")]
async fn a_word_exists(world: &mut WordsWorld, name: String, value: String, catalog: String) {
    let path = format!("/api/catalogs/{}/words", world.id(&catalog));
    let body = json!({"name": name, "value": value});
    api_create(world, &name, &path, body).await;
}

// ---------------------------------------------------------------------------
// When steps - raw HTTP verbs; `{alias}` tokens in paths and bodies are resolved
// ---------------------------------------------------------------------------

#[when(expr = "I POST {string} with body {string}")]
async fn i_post_path_with_body(world: &mut WordsWorld, path: String, body: String) {
    http_send(world, reqwest::Method::POST, &path, Some(body)).await;
}

#[when(expr = "I POST {string} with body {string} and no content type")]
async fn i_post_path_without_content_type(world: &mut WordsWorld, path: String, body: String) {
    http_send_as(world, reqwest::Method::POST, &path, Some(body), None).await;
}

#[when(expr = "I PUT {string} with body {string}")]
async fn i_put_path_with_body(world: &mut WordsWorld, path: String, body: String) {
    http_send(world, reqwest::Method::PUT, &path, Some(body)).await;
}

#[when(expr = "I DELETE {string}")]
async fn i_delete_path(world: &mut WordsWorld, path: String) {
    http_send(world, reqwest::Method::DELETE, &path, None).await;
}

// ---------------------------------------------------------------------------
// Then steps - JSON response assertions
// ---------------------------------------------------------------------------

/// Remember the `id` of the last response under an alias for later steps.
#[then(expr = "I remember the response id as {string}")]
async fn i_remember_the_response_id(world: &mut WordsWorld, alias: String) {
    let json = parse_last_response(world);
    let id = json["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("response has no numeric 'id': {json}"));
    world.ids.insert(alias, id);
}

#[then(expr = "the response JSON has field {string}")]
async fn the_response_json_has_field(world: &mut WordsWorld, field: String) {
    let json = parse_last_response(world);
    assert!(
        json.get(&field).is_some(),
        "expected response JSON to have field '{field}' but got:\n{}",
        serde_json::to_string_pretty(&json).unwrap_or_default()
    );
}

#[then(expr = "the response JSON has no field {string}")]
async fn the_response_json_has_no_field(world: &mut WordsWorld, field: String) {
    let json = parse_last_response(world);
    assert!(
        json.get(&field).is_none(),
        "expected response JSON not to have field '{field}' but got:\n{}",
        serde_json::to_string_pretty(&json).unwrap_or_default()
    );
}

/// Assert that the response body JSON has a string field equal to expected.
#[then(expr = "the response JSON field {string} equals {string}")]
async fn the_response_json_field_equals_string(
    world: &mut WordsWorld,
    field: String,
    expected: String,
) {
    let json = parse_last_response(world);
    let actual = json[&field].as_str().unwrap_or_else(|| {
        panic!(
            "expected field '{field}' to be a string in: {}",
            serde_json::to_string_pretty(&json).unwrap_or_default()
        )
    });
    assert_eq!(
        actual, expected,
        "expected response JSON field '{field}' to equal '{expected}' but got '{actual}'"
    );
}

/// Assert that the response body JSON has a numeric field equal to expected.
#[then(expr = "the response JSON field {string} equals {int}")]
async fn the_response_json_field_equals_int(world: &mut WordsWorld, field: String, expected: i64) {
    let json = parse_last_response(world);
    let actual = json[&field].as_i64().unwrap_or_else(|| {
        panic!(
            "expected field '{field}' to be a number in: {}",
            serde_json::to_string_pretty(&json).unwrap_or_default()
        )
    });
    assert_eq!(
        actual, expected,
        "expected response JSON field '{field}' to equal {expected} but got {actual}"
    );
}

/// Assert that the response JSON field holds the id remembered under an alias.
#[then(expr = "the response JSON field {string} is the id of {string}")]
async fn the_response_json_field_is_id_of(world: &mut WordsWorld, field: String, alias: String) {
    let json = parse_last_response(world);
    assert_eq!(
        json[&field].as_i64(),
        Some(world.id(&alias)),
        "expected '{field}' to be the id of '{alias}' in: {json}"
    );
}

#[then(expr = "the response JSON array has length {int}")]
async fn the_response_json_array_has_length(world: &mut WordsWorld, expected: usize) {
    let names = array_names(&parse_last_response(world));
    assert_eq!(
        names.len(),
        expected,
        "expected JSON array length {expected} but got {names:?}"
    );
}

/// Assert the `name` fields of the response array, in order.
#[then(expr = "the response JSON array names are {string}")]
async fn the_response_json_array_names_are(world: &mut WordsWorld, expected: String) {
    let names = array_names(&parse_last_response(world));
    let expected: Vec<String> = expected
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    assert_eq!(names, expected);
}
