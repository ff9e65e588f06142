#[tokio::main]
async fn main() -> anyhow::Result<()> {
    studydesk_backend::run().await
}
