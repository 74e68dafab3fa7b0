use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    netwatch_lib::run(netwatch_lib::Cli::parse()).await
}
