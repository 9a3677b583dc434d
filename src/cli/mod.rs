use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::user::CreateUserRequest;
use crate::app;
use crate::auth::PasswordHasher;
use crate::config::AppConfig;
use crate::database::models::User;
use crate::database::DatabaseManager;
use crate::services::UserService;

#[derive(Parser)]
#[command(name = "eyesonasset-api")]
#[command(about = "EyesOnAsset API - owner and asset registry server")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve,

    #[command(about = "Create a user account directly in the database")]
    CreateUser {
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    /// Print a one-line success message, or the message plus `details` as JSON.
    /// Failures are returned as errors and printed once by the binary.
    fn report(&self, message: &str, details: Value) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => {
                let mut body = json!({ "success": true, "message": message });
                if let (Some(body), Value::Object(details)) = (body.as_object_mut(), details) {
                    body.extend(details);
                }
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            OutputFormat::Text => println!("✓ {}", message),
        }
        Ok(())
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = AppConfig::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => app::serve(config).await,
        Commands::CreateUser { login, password } => create_user(config, login, password, &output_format).await,
    }
}

async fn create_user(config: AppConfig, login: String, password: String, output_format: &OutputFormat) -> anyhow::Result<()> {
    let db = DatabaseManager::connect(&config.database).await?;
    let users = UserService::new(db.clone(), PasswordHasher::new());

    let result = create_account(&users, login, password).await;
    db.close().await;

    let user = result?;
    output_format.report(&format!("Created user {}", user.login), json!({ "user": user }))
}

async fn create_account(users: &UserService, login: String, password: String) -> anyhow::Result<User> {
    let new_user = CreateUserRequest {
        login: Some(login),
        password: Some(password),
    }
    .validate()?;

    Ok(users.create_user(new_user).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ServiceError;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn create_account_surfaces_conflict_as_error() {
        let ctx = TestContext::new().await.unwrap();

        let user = create_account(&ctx.users, "admin".to_string(), "pw".to_string())
            .await
            .unwrap();
        assert_eq!(user.login, "admin");

        let err = create_account(&ctx.users, "admin".to_string(), "other".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Conflict { field: "login", .. })
        ));
        assert!(err.to_string().contains("admin"));
    }

    #[tokio::test]
    async fn create_account_rejects_blank_login() {
        let ctx = TestContext::new().await.unwrap();
        let err = create_account(&ctx.users, "   ".to_string(), "pw".to_string())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<crate::error::ApiError>().is_some());
    }
}
