use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use customer_api::{
    auth::{AuthConfig, AuthService, ClientService},
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::api_client,
};
use serde::Serialize;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => handle_migrate(&context).await?,
        Commands::Clients(command) => handle_clients_command(&context, command, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "customer-api-cli",
    about = "Customer API administration: migrations and API clients",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    #[command(subcommand)]
    Clients(ClientsCommands),
}

#[derive(Subcommand)]
enum ClientsCommands {
    /// List registered API clients
    List,
    /// Register a client and print its secret once
    Add(ClientAddArgs),
    /// Remove a client
    Remove(ClientIdArgs),
    /// Allow a client to request tokens
    Enable(ClientIdArgs),
    /// Stop a client from requesting tokens
    Disable(ClientIdArgs),
    /// Issue an access token for a client without its secret
    Token(ClientIdArgs),
}

#[derive(Args)]
struct ClientAddArgs {
    #[arg(long, help = "Display name of the client")]
    name: String,
}

#[derive(Args)]
struct ClientIdArgs {
    #[arg(long, help = "Database id of the client")]
    id: i32,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        Ok(Self {
            config,
            db: Arc::new(db_pool),
        })
    }

    fn client_service(&self) -> ClientService {
        ClientService::new(self.db.clone(), self.config.api.restricted_client_ids())
    }

    fn auth_service(&self) -> AuthService {
        AuthService::new(AuthConfig::from_app_config(&self.config), self.db.clone())
    }
}

async fn handle_migrate(context: &CliContext) -> Result<()> {
    db::run_migrations(&context.db)
        .await
        .context("failed to run migrations")?;
    println!("Migrations applied");
    Ok(())
}

#[derive(Serialize)]
struct ClientView {
    id: i32,
    client_id: String,
    name: String,
    enabled: bool,
    restricted: bool,
    created_on_utc: String,
}

#[derive(Serialize)]
struct NewClientView {
    #[serde(flatten)]
    client: ClientView,
    client_secret: String,
}

fn client_view(context: &CliContext, client: &api_client::Model) -> ClientView {
    let restricted = context
        .config
        .api
        .restricted_client_ids()
        .iter()
        .any(|id| id == &client.client_id);
    ClientView {
        id: client.id,
        client_id: client.client_id.clone(),
        name: client.name.clone(),
        enabled: client.enabled,
        restricted,
        created_on_utc: client.created_on_utc.to_rfc3339(),
    }
}

async fn handle_clients_command(
    context: &CliContext,
    command: ClientsCommands,
    json: bool,
) -> Result<()> {
    let service = context.client_service();

    match command {
        ClientsCommands::List => {
            let clients = service
                .get_all_clients()
                .await
                .context("failed to list clients")?;
            let views: Vec<ClientView> =
                clients.iter().map(|c| client_view(context, c)).collect();
            if json {
                print_json(&views)?;
            } else if views.is_empty() {
                println!("No API clients registered");
            } else {
                for view in &views {
                    render_client(view);
                }
            }
        }
        ClientsCommands::Add(args) => {
            let created = service
                .insert_client(&args.name)
                .await
                .context("failed to register client")?;
            let view = NewClientView {
                client: client_view(context, &created.client),
                client_secret: created.client_secret,
            };
            if json {
                print_json(&view)?;
            } else {
                render_client(&view.client);
                println!("Client secret (shown once): {}", view.client_secret);
            }
        }
        ClientsCommands::Remove(args) => {
            service
                .delete_client(args.id)
                .await
                .with_context(|| format!("failed to remove client {}", args.id))?;
            if json {
                print_json(&serde_json::json!({ "removed": args.id }))?;
            } else {
                println!("Client {} removed", args.id);
            }
        }
        ClientsCommands::Enable(args) => {
            set_enabled(context, &service, args.id, true, json).await?;
        }
        ClientsCommands::Disable(args) => {
            set_enabled(context, &service, args.id, false, json).await?;
        }
        ClientsCommands::Token(args) => {
            let client = find_client(&service, args.id).await?;
            if !client.enabled {
                return Err(anyhow!("client {} is disabled", args.id));
            }
            let token = context
                .auth_service()
                .issue_token(&client)
                .context("failed to issue token")?;
            if json {
                print_json(&token)?;
            } else {
                println!("{}", token.access_token);
            }
        }
    }

    Ok(())
}

async fn find_client(service: &ClientService, id: i32) -> Result<api_client::Model> {
    service
        .find_client_by_id(id)
        .await
        .context("failed to load client")?
        .ok_or_else(|| anyhow!("client {} not found", id))
}

async fn set_enabled(
    context: &CliContext,
    service: &ClientService,
    id: i32,
    enabled: bool,
    json: bool,
) -> Result<()> {
    let mut client = find_client(service, id).await?;
    client.enabled = enabled;
    let client = service
        .update_client(client)
        .await
        .context("failed to update client")?;
    let view = client_view(context, &client);
    if json {
        print_json(&view)?;
    } else {
        render_client(&view);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_client(client: &ClientView) {
    println!(
        "- Client {} • {} • {} • {}{}",
        client.id,
        client.client_id,
        client.name,
        if client.enabled { "enabled" } else { "disabled" },
        if client.restricted { " (restricted)" } else { "" }
    );
}
