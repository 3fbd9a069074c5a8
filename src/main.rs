#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    docfill_server::run().await
}
