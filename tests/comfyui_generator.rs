//! Drives `ComfyUiGenerator` against an in-process stand-in for ComfyUI's
//! `/prompt`, `/history/<id>` and `/view` endpoints.
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use prompt_studio::generator::{ComfyUiGenerator, ImageGenerator};
use prompt_studio::{AppError, ComfyUIClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PROMPT_ID: &str = "p1";
const IMAGE_BYTES: &[u8] = b"\x89PNG fake image";

#[derive(Clone, Copy)]
enum Finish {
    Image,
    ExecutionError,
    NoImages,
}

struct FakeComfy {
    finish: Finish,
    queued: Mutex<Option<Value>>,
    polls: AtomicUsize,
    views: Mutex<Vec<HashMap<String, String>>>,
}

async fn queue(State(comfy): State<Arc<FakeComfy>>, Json(body): Json<Value>) -> Json<Value> {
    *comfy.queued.lock().unwrap() = Some(body);
    Json(json!({ "prompt_id": PROMPT_ID, "number": 0 }))
}

async fn history(State(comfy): State<Arc<FakeComfy>>, Path(id): Path<String>) -> Json<Value> {
    // The first poll sees the job still running.
    if comfy.polls.fetch_add(1, Ordering::SeqCst) == 0 || id != PROMPT_ID {
        return Json(json!({}));
    }
    let entry = match comfy.finish {
        Finish::Image => json!({
            "outputs": {"9": {"images": [
                {"filename": "prompt-studio_00001_.png", "subfolder": "", "type": "output"}
            ]}},
            "status": {"status_str": "success", "completed": true, "messages": []}
        }),
        Finish::ExecutionError => json!({
            "outputs": {},
            "status": {"status_str": "error", "completed": false, "messages": [
                ["execution_start", {"prompt_id": PROMPT_ID}],
                ["execution_error", {"prompt_id": PROMPT_ID, "exception_message": "CUDA out of memory\n"}]
            ]}
        }),
        Finish::NoImages => json!({
            "outputs": {},
            "status": {"status_str": "success", "completed": true, "messages": []}
        }),
    };
    let mut body = serde_json::Map::new();
    body.insert(PROMPT_ID.to_string(), entry);
    Json(Value::Object(body))
}

async fn view(
    State(comfy): State<Arc<FakeComfy>>,
    Query(params): Query<HashMap<String, String>>,
) -> Vec<u8> {
    comfy.views.lock().unwrap().push(params);
    IMAGE_BYTES.to_vec()
}

async fn start(finish: Finish) -> (Arc<FakeComfy>, ComfyUiGenerator) {
    let comfy = Arc::new(FakeComfy {
        finish,
        queued: Mutex::new(None),
        polls: AtomicUsize::new(0),
        views: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/prompt", post(queue))
        .route("/history/:id", get(history))
        .route("/view", get(view))
        .with_state(comfy.clone());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let server = axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service());
    tokio::spawn(async move {
        let _ = server.await;
    });

    let workflow = json!({
        "3": {"class_type": "KSampler", "inputs": {"seed": 0, "positive": ["6", 0], "negative": ["7", 0]}},
        "6": {"class_type": "CLIPTextEncode", "inputs": {"text": ""}},
        "7": {"class_type": "CLIPTextEncode", "inputs": {"text": "blurry"}},
        "9": {"class_type": "SaveImage", "inputs": {"images": ["8", 0]}}
    });
    let generator = ComfyUiGenerator::new(ComfyUIClient::new(url), workflow)
        .with_poll_interval(Duration::from_millis(10));
    (comfy, generator)
}

#[tokio::test]
async fn queues_polls_and_downloads_the_image() {
    let (comfy, generator) = start(Finish::Image).await;

    let bytes = generator.generate("a lighthouse at dusk").await.unwrap();
    assert_eq!(bytes, IMAGE_BYTES);

    let queued = comfy.queued.lock().unwrap().clone().expect("prompt was queued");
    assert_eq!(queued["prompt"]["6"]["inputs"]["text"], "a lighthouse at dusk");
    assert_eq!(queued["prompt"]["7"]["inputs"]["text"], "blurry");
    assert!(queued["prompt"]["3"]["inputs"]["seed"].is_u64());
    assert!(comfy.polls.load(Ordering::SeqCst) >= 2);

    let views = comfy.views.lock().unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0]["filename"], "prompt-studio_00001_.png");
    assert_eq!(views[0]["type"], "output");
}

#[tokio::test]
async fn execution_error_becomes_generation_error() {
    let (comfy, generator) = start(Finish::ExecutionError).await;

    let err = generator.generate("anything").await.unwrap_err();
    match err {
        AppError::Generation(message) => assert_eq!(message, "CUDA out of memory"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(comfy.views.lock().unwrap().is_empty());
}

#[tokio::test]
async fn finished_without_images_is_an_error() {
    let (comfy, generator) = start(Finish::NoImages).await;

    let err = generator.generate("anything").await.unwrap_err();
    assert_eq!(err.to_string(), "image generation failed: workflow produced no images");
    assert!(comfy.views.lock().unwrap().is_empty());
}
