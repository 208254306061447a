#[tokio::main]
async fn main() -> std::io::Result<()> {
    tank_game::run_with_config().await
}
