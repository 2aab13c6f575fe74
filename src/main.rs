#[tokio::main]
async fn main() -> std::io::Result<()> {
    visits_backend::run().await
}
