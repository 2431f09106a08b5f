//! Form workflow of the to-do page, checked against the rendered HTML.
//!
//! Runs against `$TODO_BASE_URL` when `suite-runner` provides one, otherwise
//! against a server launched per test.

use e2e_tests::assertions::{
    assert_empty_list, element_text, find_item, item_id, real_items, RenderedItem,
};
use e2e_tests::{TestServer, TodoClient};
use reqwest::StatusCode;
use serial_test::serial;

const TODO_APP: &str = env!("CARGO_BIN_EXE_e2e-todo-app");

async fn item(client: &TodoClient, task: &str) -> RenderedItem {
    let page = client.page().await.unwrap();
    find_item(&page, task).unwrap_or_else(|| panic!("'{}' not on the page:\n{}", task, page))
}

async fn click(client: &TodoClient, action: &str, item: &RenderedItem) -> StatusCode {
    let id = item_id(item).expect("item without data-id");
    client
        .post_form(&format!("/{}/{}", action, id), &[])
        .await
        .unwrap()
        .status()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_empty_list_shows_placeholder() {
    let server = TestServer::start(TODO_APP, "ui-empty").await;

    let page = server.client.page().await.unwrap();
    assert_empty_list(&page).unwrap();
    assert!(page.contains("name=\"task\""));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_add_todo_via_form() {
    let server = TestServer::start(TODO_APP, "ui-add").await;
    let client = &server.client;

    let response = client.add_via_form("Buy groceries").await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[reqwest::header::LOCATION], "/");

    let added = item(client, "Buy groceries").await;
    assert!(added.has_class("todo"));
    assert!(!added.has_class("done"));
    assert!(added.has_button("Start"));
    assert!(assert_empty_list(&client.page().await.unwrap()).is_err());

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_toggle_cycles_through_statuses() {
    let server = TestServer::start(TODO_APP, "ui-toggle").await;
    let client = &server.client;

    client.add_via_form("Test task").await.unwrap();

    let current = item(client, "Test task").await;
    assert_eq!(click(client, "toggle", &current).await, StatusCode::SEE_OTHER);
    let current = item(client, "Test task").await;
    assert!(current.has_class("in_progress"));
    assert!(current.has_button("Complete"));

    click(client, "toggle", &current).await;
    let current = item(client, "Test task").await;
    assert!(current.has_class("done"));
    assert!(current.has_button("Reset"));
    assert!(client.list().await.unwrap()[0].done);

    click(client, "toggle", &current).await;
    let current = item(client, "Test task").await;
    assert!(current.has_class("todo"));
    assert!(current.has_button("Start"));
    assert!(!client.list().await.unwrap()[0].done);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_delete_via_form() {
    let server = TestServer::start(TODO_APP, "ui-delete").await;
    let client = &server.client;

    client.add_via_form("Task to delete").await.unwrap();
    let doomed = item(client, "Task to delete").await;
    assert!(doomed.html.contains("class=\"delete-btn\""));

    assert_eq!(click(client, "delete", &doomed).await, StatusCode::SEE_OTHER);
    assert_empty_list(&client.page().await.unwrap()).unwrap();

    assert_eq!(click(client, "delete", &doomed).await, StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_empty_submission_is_rejected() {
    let server = TestServer::start(TODO_APP, "ui-blank").await;
    let client = &server.client;

    for blank in ["", "   "] {
        let response = client.add_via_form(blank).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.text().await.unwrap().contains("Task cannot be empty"));
    }

    assert_empty_list(&client.page().await.unwrap()).unwrap();
    assert!(client.list().await.unwrap().is_empty());

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_multiple_todos_render_in_order() {
    let server = TestServer::start(TODO_APP, "ui-multiple").await;
    let client = &server.client;

    let tasks = ["Task 1", "Task 2", "Task 3"];
    for task in tasks {
        client.add_via_form(task).await.unwrap();
    }

    let page = client.page().await.unwrap();
    let items = real_items(&page);
    assert_eq!(items.len(), tasks.len());
    for (rendered, task) in items.iter().zip(tasks) {
        assert!(rendered.html.contains(task));
    }

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_state_persists_across_reload() {
    let server = TestServer::start(TODO_APP, "ui-reload").await;
    let client = &server.client;

    client.add_via_form("Persistent task").await.unwrap();
    let added = item(client, "Persistent task").await;
    click(client, "toggle", &added).await;
    click(client, "toggle", &added).await;

    // A fresh client sees the same server-side state
    let reloaded = TodoClient::new(client.base_url());
    let page = reloaded.page().await.unwrap();
    let persisted = find_item(&page, "Persistent task").unwrap();
    assert!(persisted.has_class("done"));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_assignee_counts_follow_details_updates() {
    let server = TestServer::start(TODO_APP, "ui-assignee").await;
    let client = &server.client;

    client.add_via_form("Buy milk").await.unwrap();
    client.add_via_form("Walk dog").await.unwrap();

    let page = client.page().await.unwrap();
    assert_eq!(element_text(&page, "unassigned-count").as_deref(), Some("2"));

    let milk = item(client, "Buy milk").await;
    let id = item_id(&milk).unwrap();
    let response = client
        .post_form(
            &format!("/update_todo/{}", id),
            &[("assignee", "John"), ("notes", "Two litres")],
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = client.page().await.unwrap();
    assert_eq!(element_text(&page, "unassigned-count").as_deref(), Some("1"));
    assert_eq!(element_text(&page, "John-count").as_deref(), Some("1"));

    let milk = find_item(&page, "Buy milk").unwrap();
    assert!(milk.html.contains("data-assignee=\"John\""));
    assert!(milk.html.contains("Two litres"));

    let todos = client.list().await.unwrap();
    assert_eq!(todos[0].assignee.as_deref(), Some("John"));

    server.stop().await;
}
