use clap::Parser;
use fixtures::{platform::FakePlatform, run_server, FixtureArgs};

/// Fake OAuth 1.0a social platform for local development
#[derive(Parser, Debug)]
#[clap(name = "platform-fixture")]
struct Cli {
    #[clap(flatten)]
    common: FixtureArgs,

    /// Screen name reported for every authorized user
    #[arg(long, default_value = fixtures::platform::DEFAULT_SCREEN_NAME)]
    screen_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let platform = FakePlatform::new().with_screen_name(&args.screen_name);

    run_server(args.common, platform.router()).await
}
