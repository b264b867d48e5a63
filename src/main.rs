//! cumulo binary entry point.

use cumulo_cli::cli::Cli;
use cumulo_cli::core::user_friendly_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    cli.init_logging();

    if let Err(error) = cli.execute().await {
        user_friendly_error(error).display();
        std::process::exit(1);
    }
}
