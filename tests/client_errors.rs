//! Client and studio behaviour against a server that answers every request
//! with a plain-text 500.
use axum::http::StatusCode;
use axum::Router;
use prompt_studio::studio::controller::CONFIRM_DELETE_ALL;
use prompt_studio::studio::{Dialogs, Outcome, Studio};
use prompt_studio::{AppError, StudioClient};
use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct ScriptedDialogs {
    answers: VecDeque<bool>,
    questions: Vec<String>,
    alerts: Vec<String>,
}

impl Dialogs for ScriptedDialogs {
    fn confirm(&mut self, message: &str) -> bool {
        self.questions.push(message.to_string());
        self.answers.pop_front().unwrap_or(false)
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

/// Starts the broken server and returns its base URL and request counter.
fn broken_server() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let app = Router::new().fallback(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (StatusCode::INTERNAL_SERVER_ERROR, "boom")
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let server = axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service());
    tokio::spawn(async move {
        let _ = server.await;
    });
    (url, hits)
}

fn assert_fallback(err: AppError, expected: &str) {
    match err {
        AppError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, expected);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_errors_use_fixed_messages() {
    let (url, hits) = broken_server();
    let client = StudioClient::new(url);

    assert_fallback(client.generate("a cat").await.unwrap_err(), "Failed to generate image");
    assert_fallback(client.list_prompts().await.unwrap_err(), "Failed to fetch prompts");
    assert_fallback(client.delete_prompt(1).await.unwrap_err(), "Failed to delete prompt");
    assert_fallback(client.delete_all_prompts().await.unwrap_err(), "Failed to delete all prompts");
    assert_fallback(client.shutdown().await.unwrap_err(), "Failed to shut down server");
    assert_fallback(client.fetch_image("static/a.png").await.unwrap_err(), "Failed to fetch image");
    assert_eq!(hits.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn failed_remove_all_alerts_with_fallback() {
    let (url, hits) = broken_server();
    let dialogs = ScriptedDialogs { answers: VecDeque::from([true]), ..Default::default() };
    let mut studio = Studio::new(StudioClient::new(url), dialogs);

    assert_eq!(studio.remove_all_prompts().await, Outcome::Failed);
    assert_eq!(studio.dialogs().questions, vec![CONFIRM_DELETE_ALL.to_string()]);
    assert_eq!(
        studio.dialogs().alerts,
        vec!["Failed to delete all prompts: Failed to delete all prompts".to_string()]
    );
    assert!(studio.view().prompt_list.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn declined_remove_all_sends_nothing() {
    let (url, hits) = broken_server();
    let dialogs = ScriptedDialogs { answers: VecDeque::from([false]), ..Default::default() };
    let mut studio = Studio::new(StudioClient::new(url), dialogs);

    assert_eq!(studio.remove_all_prompts().await, Outcome::Cancelled);
    assert!(studio.dialogs().alerts.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
