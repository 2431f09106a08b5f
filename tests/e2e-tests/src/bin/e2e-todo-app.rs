#[tokio::main]
async fn main() {
    todo_app::server::main_entry().await
}
