use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use portal_client::net::auth::DEFAULT_VALIDATE_PATH;
use portal_client::pages::dashboard::dashboard;
use portal_client::util::auth::Route;
use portal_client::{
    ApiError, AuthClient, AuthedFetch, ClientError, Credentials, FileTaskStore, FileTokenStore, Navigator,
    PortalClient, RequestOptions, Session, TaskError, TaskId, TaskService, TokenStore,
};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("missing portal URL; pass --portal-url or set PORTAL_URL")]
    MissingPortalUrl,
    #[error("not authenticated; run `portal login` first")]
    NotAuthenticated,
    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },
}

#[derive(Parser, Debug)]
#[command(name = "portal", about = "Portal auth client: login, session status, dashboard, authenticated requests")]
struct Cli {
    /// Authentication backend base URL.
    #[arg(long, env = "PORTAL_BACKEND_URL", default_value = "http://127.0.0.1:8000")]
    backend_url: String,

    /// Portal gateway base URL; enables gateway logout and `gateway-login`.
    #[arg(long, env = "PORTAL_URL")]
    portal_url: Option<String>,

    /// Token file; defaults to `$HOME/.portal/token.json`.
    #[arg(long, env = "PORTAL_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Task list file; defaults to `$HOME/.portal/tasks.json`.
    #[arg(long, env = "PORTAL_TASKS_FILE")]
    tasks_file: Option<PathBuf>,

    /// Backend path used to validate stored tokens.
    #[arg(long, env = "PORTAL_VALIDATE_PATH", default_value = DEFAULT_VALIDATE_PATH)]
    validate_path: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in against the backend and store the bearer token.
    Login(LoginArgs),
    /// Log in through the portal gateway (cookie session) and print who it says you are.
    GatewayLogin(LoginArgs),
    /// Forget the stored token.
    Logout,
    /// Validate the stored token and print its (unverified) claims.
    Whoami,
    /// Render the dashboard for the current session.
    Dashboard,
    /// Send an authenticated JSON request.
    Fetch(FetchArgs),
    /// Check that the portal gateway is up.
    Ping,
    /// Manage the local todo list.
    Tasks {
        #[command(subcommand)]
        command: TaskCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    /// Add a task.
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// List all tasks.
    List,
    /// Change a task's title.
    Update {
        id: TaskId,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Delete a task.
    Delete { id: TaskId },
    /// Mark a task as completed.
    Complete { id: TaskId },
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,

    #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct FetchArgs {
    url: String,

    #[arg(long, short = 'X', default_value = "GET")]
    method: String,

    /// JSON request body.
    #[arg(long, short = 'd')]
    data: Option<String>,
}

/// Prints route changes instead of performing them.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        eprintln!("-> {path}");
    }
}

struct CliContext {
    store: Arc<dyn TokenStore>,
    auth: AuthClient,
    portal: Option<PortalClient>,
}

impl CliContext {
    fn build(cli: &Cli) -> Result<Self, CliError> {
        let path = cli.token_file.clone().unwrap_or_else(default_token_file);
        tracing::debug!(token_file = %path.display(), backend_url = %cli.backend_url, "building cli context");
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(path));
        let auth = AuthClient::new(cli.backend_url.clone(), store.clone())?.with_validate_path(cli.validate_path.clone());
        let portal = cli.portal_url.clone().map(PortalClient::new).transpose()?;
        Ok(Self { store, auth, portal })
    }

    fn session(&self) -> Session {
        Session::new(self.auth.clone(), self.portal.clone(), Arc::new(TerminalNavigator))
    }
}

fn default_token_file() -> PathBuf {
    portal_dir_file("token.json")
}

fn default_tasks_file() -> PathBuf {
    portal_dir_file("tasks.json")
}

/// `$HOME/.portal/<name>`, or `.portal-<name>` in the working directory.
fn portal_dir_file(name: &str) -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(format!(".portal-{name}")),
        |home| PathBuf::from(home).join(".portal").join(name),
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = CliContext::build(&cli)?;
    match cli.command {
        Command::Login(args) => run_login(&ctx, args).await,
        Command::GatewayLogin(args) => run_gateway_login(&ctx, args).await,
        Command::Logout => {
            ctx.session().logout().await;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => run_whoami(&ctx).await,
        Command::Dashboard => run_dashboard(&ctx).await,
        Command::Fetch(args) => run_fetch(&ctx, args).await,
        Command::Ping => run_ping(&ctx).await,
        Command::Tasks { command } => {
            let path = cli.tasks_file.unwrap_or_else(default_tasks_file);
            tracing::debug!(tasks_file = %path.display(), "opening task list");
            run_tasks(&TaskService::new(Arc::new(FileTaskStore::new(path))), command)
        }
    }
}

async fn run_login(ctx: &CliContext, args: LoginArgs) -> Result<(), CliError> {
    let session = ctx.session();
    session.login(&args.email, &args.password).await?;
    let name = session
        .snapshot()
        .user
        .map_or_else(|| args.email.clone(), |user| user.display_name().to_owned());
    println!("logged in as {name}");
    Ok(())
}

async fn run_gateway_login(ctx: &CliContext, args: LoginArgs) -> Result<(), CliError> {
    let portal = ctx.portal.as_ref().ok_or(CliError::MissingPortalUrl)?;
    portal.login(&Credentials::new(args.email, args.password)).await?;
    let claims = portal.me().await?.ok_or(CliError::NotAuthenticated)?;
    print_json(&serde_json::to_value(claims)?)
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    let session = ctx.session();
    session.initialize().await;
    let user = session.snapshot().user.ok_or(CliError::NotAuthenticated)?;
    print_json(&serde_json::to_value(user)?)
}

async fn run_dashboard(ctx: &CliContext) -> Result<(), CliError> {
    let session = ctx.session();
    session.initialize().await;
    match dashboard(&session.snapshot()) {
        Route::Render(view) => {
            print!("{}", view.render());
            Ok(())
        }
        Route::Redirect(path) => {
            TerminalNavigator.navigate(path);
            Err(CliError::NotAuthenticated)
        }
        Route::Loading => Err(CliError::NotAuthenticated),
    }
}

async fn run_fetch(ctx: &CliContext, args: FetchArgs) -> Result<(), CliError> {
    let method = reqwest::Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| CliError::InvalidMethod(args.method.clone()))?;
    let mut options = RequestOptions::new(method);
    if let Some(data) = args.data {
        options = options.with_body(serde_json::from_str::<Value>(&data)?);
    }
    let fetch = AuthedFetch::new(ctx.store.clone())?;
    let json = fetch.fetch(&args.url, options).await?;
    print_json(&json)
}

async fn run_ping(ctx: &CliContext) -> Result<(), CliError> {
    let portal = ctx.portal.as_ref().ok_or(CliError::MissingPortalUrl)?;
    let url = format!("{}/healthz", portal.base_url().trim_end_matches('/'));
    let response = reqwest::Client::new().get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

fn run_tasks(service: &TaskService, command: TaskCommand) -> Result<(), CliError> {
    match command {
        TaskCommand::Add { title } => {
            let task = service.add_task(&title.join(" "))?;
            println!("Task '{}' added with ID {}", task.title, task.id);
        }
        TaskCommand::List => {
            let tasks = service.tasks()?;
            if tasks.is_empty() {
                println!("No tasks found.");
            }
            for task in &tasks {
                println!("{}", task.render_line());
            }
        }
        TaskCommand::Update { id, title } => {
            service.update_task(id, &title.join(" "))?;
            println!("Task {id} updated.");
        }
        TaskCommand::Delete { id } => {
            service.delete_task(id)?;
            println!("Task {id} deleted.");
        }
        TaskCommand::Complete { id } => {
            service.mark_completed(id)?;
            println!("Task {id} marked as completed.");
        }
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
