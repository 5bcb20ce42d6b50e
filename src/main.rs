//! Wellness Gate
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 WELLNESS GATE                 │
//!     Client Request      │  ┌────────┐   ┌──────────────────────────┐   │
//!     ────────────────────┼─▶│  http  │──▶│        RequestGate        │   │
//!                         │  │ server │   │ rate limit → principal → │   │
//!                         │  └────────┘   │       authorization       │   │
//!                         │               └────────────┬─────────────┘   │
//!                         │                            ▼                  │
//!     Client Response     │               ┌──────────────────────────┐   │
//!     ◀───────────────────┼───────────────│ handlers (auth, users)   │   │
//!                         │               └────────────┬─────────────┘   │
//!                         │                            ▼                  │
//!                         │        UserStore · TokenPersistence · Mailer  │
//!                         │                                               │
//!                         │  config (hot-reloaded policy) · sweeper ·     │
//!                         │  observability · lifecycle                    │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use wellness_gate::lifecycle::startup;

#[derive(Parser)]
#[command(name = "wellness-gate")]
#[command(about = "Authentication, rate limiting and authorization gate for the wellness API", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "WELLNESS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    startup::run(args.config.as_deref()).await?;
    Ok(())
}
