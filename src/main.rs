#[tokio::main]
async fn main() {
    if let Err(e) = fantasy_broker::run().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
