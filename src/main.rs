#[tokio::main]
async fn main() -> anyhow::Result<()> {
    inventory_webapp_lib::run().await
}
