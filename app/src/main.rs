#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cosmodex::run().await
}
