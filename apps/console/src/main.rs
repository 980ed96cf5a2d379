use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    CredentialFlow, FetchState, HttpTemplateApi, ListingController, LoginForm, QueryState,
};
use shared::domain::SortOrder;
use storage::{SessionStore, SqliteSessionStore};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(about = "Sign in and browse public templates")]
struct Cli {
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    session_db: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Templates {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_enum, default_value_t = SortArg::Recent)]
        sort: SortArg,
        #[arg(long)]
        search: Option<String>,
    },
    Logout,
    Whoami,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Recent,
    MostShared,
    Alphabetical,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Recent => SortOrder::Recent,
            SortArg::MostShared => SortOrder::MostShared,
            SortArg::Alphabetical => SortOrder::Alphabetical,
        }
    }
}

fn apply_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(v) = &cli.server_url {
        settings.api_url = v.clone();
    }
    if let Some(v) = &cli.session_db {
        settings.session_db = v.clone();
    }
    if let Some(v) = cli.timeout_secs {
        settings.request_timeout_secs = v;
    }
    settings
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();
    let settings = apply_overrides(load_settings(), &cli);

    let store: Arc<dyn SessionStore> =
        Arc::new(SqliteSessionStore::open(&settings.session_db).await?);

    match cli.command {
        Command::Login { email, password } => {
            let api = Arc::new(HttpTemplateApi::new(
                &settings.api_url,
                settings.request_timeout(),
            )?);
            let flow = CredentialFlow::new(api, store);
            let mut form = LoginForm::new();
            form.set_email(email);
            form.set_password(password);

            match flow.submit(&mut form).await {
                Ok(outcome) => {
                    println!("로그인 성공! → {}", outcome.route.path());
                    if let Some(role) = outcome.role {
                        println!("role={role}");
                    }
                }
                Err(err) => bail!(err.user_message()),
            }
        }
        Command::Templates { page, sort, search } => {
            let api = Arc::new(HttpTemplateApi::new(
                &settings.api_url,
                settings.request_timeout(),
            )?);
            let controller = ListingController::new_with_query(
                api,
                store,
                settings.request_timeout(),
                QueryState {
                    page,
                    sort_order: sort.into(),
                    search_text: search.unwrap_or_default(),
                },
            );
            controller.mount().await;
            controller.settle().await;

            let snapshot = controller.snapshot();
            print!("{}", render::render_listing(&snapshot));
            if let FetchState::Error(message) = snapshot.fetch {
                bail!(message);
            }
        }
        Command::Logout => {
            storage::clear_session(store.as_ref()).await?;
            println!("로그아웃되었습니다.");
        }
        Command::Whoami => match storage::access_token(store.as_ref()).await? {
            Some(_) => {
                let role = storage::user_role(store.as_ref()).await?;
                println!(
                    "signed in role={}",
                    role.map(|role| role.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            None => println!("로그인이 필요합니다."),
        },
    }

    Ok(())
}
