use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Client for the Wellness Gate auth API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token for authenticated commands (see `login`).
    #[arg(short, long, env = "GATE_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// Create an account
    Register { email: String, password: String },
    /// Obtain a bearer token
    Login { email: String, password: String },
    /// Request a password reset mail
    ForgotPassword { email: String },
    /// Check whether a reset token is still usable
    ValidateReset { token: String },
    /// Set a new password with a reset token
    ResetPassword { token: String, new_password: String },
    /// Show the profile of the token's user
    Profile,
    /// Change the token user's password
    ChangePassword { current_password: String, new_password: String },
    /// Grant the ADMIN role to a user (requires an ADMIN token)
    MakeAdmin { id: u64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
    }

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Register { email, password } => {
            client
                .post(format!("{}/api/v1/auth/register", base))
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await?
        }
        Commands::Login { email, password } => {
            client
                .post(format!("{}/api/v1/auth/login", base))
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await?
        }
        Commands::ForgotPassword { email } => {
            client
                .post(format!("{}/api/v1/auth/forgot-password", base))
                .json(&json!({ "email": email }))
                .send()
                .await?
        }
        Commands::ValidateReset { token } => {
            client
                .get(format!("{}/api/v1/auth/reset-password/validate", base))
                .query(&[("token", token)])
                .send()
                .await?
        }
        Commands::ResetPassword { token, new_password } => {
            client
                .post(format!("{}/api/v1/auth/reset-password", base))
                .json(&json!({ "token": token, "newPassword": new_password }))
                .send()
                .await?
        }
        Commands::Profile => {
            client
                .get(format!("{}/api/v1/user/profile", base))
                .headers(headers)
                .send()
                .await?
        }
        Commands::ChangePassword { current_password, new_password } => {
            client
                .put(format!("{}/api/v1/user/password", base))
                .headers(headers)
                .json(&json!({ "currentPassword": current_password, "newPassword": new_password }))
                .send()
                .await?
        }
        Commands::MakeAdmin { id } => {
            client
                .post(format!("{}/api/v1/users/{}/make-admin", base, id))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if !text.is_empty() {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
