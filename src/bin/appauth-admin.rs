//! appauth administration CLI
//!
//! Drives the appauth HTTP API: registers applications and clients, obtains
//! and refreshes tokens, and inspects or validates them.
//!
//! ## Usage Examples
//!
//! ```bash
//! appauth-admin register-application --name billing --scope read --scope write
//! appauth-admin register-client --application-name billing --scope read
//! appauth-admin token --client-id "$CLIENT_ID" --client-secret "$CLIENT_SECRET" --scope read
//! appauth-admin inspect --token "$ACCESS_TOKEN"
//! ```
//!
//! `APPAUTH_BASE_URL` may be set instead of `--base-url`.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error (network, parsing, etc.)
//! - 2: Application or client registration error
//! - 3: Authentication or token error

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::{Value, json};
use std::process;

#[derive(Parser)]
#[command(
    name = "appauth-admin",
    about = "appauth administration CLI",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Base URL of the appauth server
    #[arg(long, env = "APPAUTH_BASE_URL", default_value = "http://localhost:9096")]
    base_url: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// JSON formatted output
    Json,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Register a new application
    RegisterApplication(RegisterApplicationArgs),
    /// Register a client for an existing application
    RegisterClient(RegisterClientArgs),
    /// Obtain an access token with client credentials
    Token(TokenArgs),
    /// Exchange a refresh token for a new token pair
    Refresh(RefreshArgs),
    /// Describe an access token
    Inspect(TokenRefArgs),
    /// Check whether an access token is active
    Validate(TokenRefArgs),
    /// Look up an application by id
    GetApplication(IdArgs),
    /// Look up a client by id
    GetClient(IdArgs),
}

#[derive(Args)]
struct RegisterApplicationArgs {
    #[arg(long)]
    name: String,
    /// Scope the application may grant (repeatable)
    #[arg(long = "scope", required = true)]
    scopes: Vec<String>,
}

#[derive(Args)]
struct RegisterClientArgs {
    #[arg(long)]
    application_name: String,
    /// Scope requested for the client (repeatable)
    #[arg(long = "scope")]
    scopes: Vec<String>,
}

#[derive(Args)]
struct TokenArgs {
    #[arg(long)]
    client_id: String,
    #[arg(long)]
    client_secret: String,
    /// Space-delimited scopes; omit for every granted scope
    #[arg(long)]
    scope: Option<String>,
}

#[derive(Args)]
struct RefreshArgs {
    #[arg(long)]
    refresh_token: String,
    #[arg(long, requires = "client_secret")]
    client_id: Option<String>,
    #[arg(long, requires = "client_id")]
    client_secret: Option<String>,
}

#[derive(Args)]
struct TokenRefArgs {
    #[arg(long)]
    token: String,
}

#[derive(Args)]
struct IdArgs {
    #[arg(long)]
    id: String,
}

/// Application errors
#[derive(Debug)]
enum AppError {
    /// Network or HTTP client errors
    Network(reqwest::Error),
    /// JSON parsing or serialization errors
    Json(serde_json::Error),
    /// Application or client registration errors
    Registration(String),
    /// Authentication and token errors
    Authentication(String),
    /// General application errors
    General(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Network(err) => write!(f, "Network error: {}", err),
            AppError::Json(err) => write!(f, "JSON error: {}", err),
            AppError::Registration(msg) => write!(f, "Registration error: {}", msg),
            AppError::Authentication(msg) => write!(f, "Authentication error: {}", msg),
            AppError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::Network(_) | AppError::Json(_) | AppError::General(_) => 1,
            AppError::Registration(_) => 2,
            AppError::Authentication(_) => 3,
        }
    }
}

/// Main application entry point
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let http = Client::new();

    let result = match &cli.command {
        Commands::RegisterApplication(args) => register_application(&cli, &http, args).await,
        Commands::RegisterClient(args) => register_client(&cli, &http, args).await,
        Commands::Token(args) => token(&cli, &http, args).await,
        Commands::Refresh(args) => refresh(&cli, &http, args).await,
        Commands::Inspect(args) => inspect(&cli, &http, args).await,
        Commands::Validate(args) => validate(&cli, &http, args).await,
        Commands::GetApplication(args) => {
            get_resource(&cli, &http, &format!("applications/{}", args.id)).await
        }
        Commands::GetClient(args) => {
            get_resource(&cli, &http, &format!("clients/{}", args.id)).await
        }
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(err.exit_code());
    }
}

fn endpoint(cli: &Cli, path: &str) -> String {
    format!("{}/{}", cli.base_url.trim_end_matches('/'), path)
}

/// Read a response body, surfacing the OAuth error description when present.
async fn error_text(response: Response) -> Result<String, AppError> {
    let status = response.status();
    let text = response.text().await?;
    let description = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| {
            let error = body.get("error")?.as_str()?.to_string();
            let description = body
                .get("error_description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Some(format!("{} {}", error, description))
        })
        .unwrap_or(text);
    Ok(format!("status {}: {}", status, description.trim()))
}

async fn register_application(
    cli: &Cli,
    http: &Client,
    args: &RegisterApplicationArgs,
) -> Result<(), AppError> {
    if cli.verbose {
        eprintln!("Registering application '{}' with {}", args.name, cli.base_url);
    }

    let response = http
        .post(endpoint(cli, "register/application"))
        .json(&json!({"name": args.name, "scopes": args.scopes}))
        .send()
        .await?;

    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    match response.status() {
        StatusCode::CREATED => {
            let body: Value = response.json().await?;
            output_response(&cli.format, &body)
        }
        _ => Err(AppError::Registration(error_text(response).await?)),
    }
}

async fn register_client(
    cli: &Cli,
    http: &Client,
    args: &RegisterClientArgs,
) -> Result<(), AppError> {
    if cli.verbose {
        eprintln!(
            "Registering client for application '{}' with {}",
            args.application_name, cli.base_url
        );
    }

    let response = http
        .post(endpoint(cli, "register/client"))
        .json(&json!({"application_name": args.application_name, "scopes": args.scopes}))
        .send()
        .await?;

    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    match response.status() {
        StatusCode::CREATED => {
            let body: Value = response.json().await?;
            output_response(&cli.format, &body)
        }
        _ => Err(AppError::Registration(error_text(response).await?)),
    }
}

async fn request_token(
    cli: &Cli,
    http: &Client,
    form: &[(&str, &str)],
) -> Result<(), AppError> {
    let response = http.post(endpoint(cli, "token")).form(form).send().await?;

    if cli.verbose {
        eprintln!("Response status: {}", response.status());
    }

    match response.status() {
        StatusCode::OK => {
            let body: Value = response.json().await?;
            output_response(&cli.format, &body)
        }
        StatusCode::INTERNAL_SERVER_ERROR => Err(AppError::General(error_text(response).await?)),
        _ => Err(AppError::Authentication(error_text(response).await?)),
    }
}

async fn token(cli: &Cli, http: &Client, args: &TokenArgs) -> Result<(), AppError> {
    if cli.verbose {
        eprintln!("Requesting token for client '{}'", args.client_id);
    }

    let mut form = vec![
        ("grant_type", "client_credentials"),
        ("client_id", args.client_id.as_str()),
        ("client_secret", args.client_secret.as_str()),
    ];
    if let Some(scope) = &args.scope {
        form.push(("scope", scope.as_str()));
    }

    request_token(cli, http, &form).await
}

async fn refresh(cli: &Cli, http: &Client, args: &RefreshArgs) -> Result<(), AppError> {
    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", args.refresh_token.as_str()),
    ];
    if let (Some(client_id), Some(client_secret)) = (&args.client_id, &args.client_secret) {
        form.push(("client_id", client_id.as_str()));
        form.push(("client_secret", client_secret.as_str()));
    }

    request_token(cli, http, &form).await
}

async fn inspect(cli: &Cli, http: &Client, args: &TokenRefArgs) -> Result<(), AppError> {
    let response = http
        .get(endpoint(cli, "inspect"))
        .bearer_auth(&args.token)
        .send()
        .await?;

    match response.status() {
        StatusCode::OK => {
            let body: Value = response.json().await?;
            output_response(&cli.format, &body)
        }
        StatusCode::UNAUTHORIZED => Err(AppError::Authentication(error_text(response).await?)),
        _ => Err(AppError::General(error_text(response).await?)),
    }
}

async fn validate(cli: &Cli, http: &Client, args: &TokenRefArgs) -> Result<(), AppError> {
    let response = http
        .get(endpoint(cli, "validate"))
        .bearer_auth(&args.token)
        .send()
        .await?;

    match response.status() {
        StatusCode::NO_CONTENT => output_response(&cli.format, &json!({"valid": true})),
        StatusCode::UNAUTHORIZED => Err(AppError::Authentication(
            "access token is invalid or expired".to_string(),
        )),
        _ => Err(AppError::General(error_text(response).await?)),
    }
}

async fn get_resource(cli: &Cli, http: &Client, path: &str) -> Result<(), AppError> {
    if cli.verbose {
        eprintln!("Fetching {}", path);
    }

    let response = http.get(endpoint(cli, path)).send().await?;

    match response.status() {
        StatusCode::OK => {
            let body: Value = response.json().await?;
            output_response(&cli.format, &body)
        }
        StatusCode::NOT_FOUND => Err(AppError::Registration(format!("'{}' not found", path))),
        _ => Err(AppError::General(error_text(response).await?)),
    }
}

/// Output response data in the requested format
fn output_response<T: Serialize>(format: &OutputFormat, data: &T) -> Result<(), AppError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(data)?);
        }
        OutputFormat::JsonPretty => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }
    Ok(())
}
