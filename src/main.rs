//! wehand-auth -- OAuth sign-in and callback handling for WeHand.
//!
//! Entry point for the command-line shell around the library:
//!   - Resolving the OAuth redirect URL for a page
//!   - Starting a provider sign-in
//!   - Running a callback page against a redirect URL

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use url::Url;

use wehand_auth::AppState;
use wehand_auth::auth::RuntimeEnv;
use wehand_auth::auth::oauth::{CallbackPage, Provider, ProviderStrategy, start_sign_in};
use wehand_auth::config::Config;
use wehand_auth::nav::{NavError, Navigator};
use wehand_auth::web;

// ---------------------------------------------------------------------------
// CLI argument parsing (minimal, no clap dependency)
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Command {
    RedirectUrl(PageArgs),
    SignIn(PageArgs),
    Callback {
        url: String,
        html: Option<PathBuf>,
    },
}

/// Runtime signals of the page starting a sign-in.
#[derive(Debug, PartialEq, Eq)]
struct PageArgs {
    provider: Provider,
    page_url: String,
    standalone: bool,
    user_agent: String,
}

#[derive(Debug)]
struct CliArgs {
    config_path: PathBuf,
    command: Command,
}

enum Parsed {
    Run(CliArgs),
    Help,
    Version,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Parsed, String> {
    let mut args = args.into_iter();
    let mut config_path = PathBuf::from("wehand.toml");
    let mut positional = Vec::new();
    let mut page_url = None;
    let mut standalone = false;
    let mut user_agent = String::new();
    let mut html = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or("--config requires a path argument")?;
                config_path = PathBuf::from(path);
            }
            "--page-url" => page_url = Some(args.next().ok_or("--page-url requires a URL")?),
            "--user-agent" => user_agent = args.next().ok_or("--user-agent requires a value")?,
            "--html" => html = Some(PathBuf::from(args.next().ok_or("--html requires a path")?)),
            "--standalone" => standalone = true,
            "--help" | "-h" => return Ok(Parsed::Help),
            "--version" | "-V" => return Ok(Parsed::Version),
            other if other.starts_with('-') => return Err(format!("Unknown argument: {other}")),
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional.next().ok_or("Missing command")?;
    let operand = positional.next();
    if let Some(extra) = positional.next() {
        return Err(format!("Unexpected argument: {extra}"));
    }

    let page_args = |operand: Option<String>| -> Result<PageArgs, String> {
        let provider = operand
            .ok_or("Missing provider (kakao or apple)")?
            .parse::<Provider>()
            .map_err(|e| e.to_string())?;
        Ok(PageArgs {
            provider,
            page_url: page_url.clone().ok_or("--page-url is required")?,
            standalone,
            user_agent: user_agent.clone(),
        })
    };

    let command = match name.as_str() {
        "redirect-url" => Command::RedirectUrl(page_args(operand)?),
        "sign-in" => Command::SignIn(page_args(operand)?),
        "callback" => Command::Callback {
            url: operand.ok_or("Missing callback URL")?,
            html,
        },
        other => return Err(format!("Unknown command: {other}")),
    };

    Ok(Parsed::Run(CliArgs {
        config_path,
        command,
    }))
}

fn print_usage() {
    println!(
        "\
wehand-auth {version} -- WeHand OAuth sign-in

USAGE:
    wehand-auth [OPTIONS] <COMMAND>

COMMANDS:
    redirect-url <kakao|apple> --page-url <URL> [--standalone] [--user-agent <UA>]
                           Print the OAuth redirect URL for a page
    sign-in <kakao|apple> --page-url <URL> [--standalone] [--user-agent <UA>]
                           Start a provider sign-in and print the authorize URL
    callback <URL> [--html <PATH>]
                           Run the callback page for a provider redirect

OPTIONS:
    -c, --config <PATH>    Path to configuration file [default: wehand.toml]
    -h, --help             Print this help message
    -V, --version          Print version information

ENVIRONMENT:
    RUST_LOG               Override log level (e.g. RUST_LOG=debug)
    WEHAND_CONFIG          Alternative to --config flag
    WEHAND_*               Per-setting overrides (see config documentation)
",
        version = env!("CARGO_PKG_VERSION")
    );
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Prints navigation requests instead of performing them.
struct StdoutNavigator;

#[async_trait::async_trait]
impl Navigator for StdoutNavigator {
    fn navigate(&self, path: &str) {
        println!("navigate {path}");
    }

    async fn open_external(&self, url: &str) -> Result<(), NavError> {
        println!("open {url}");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(Parsed::Run(cli)) => cli,
        Ok(Parsed::Help) => {
            print_usage();
            return Ok(());
        }
        Ok(Parsed::Version) => {
            println!("wehand-auth {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run with --help for usage information.");
            std::process::exit(2);
        }
    };

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: CliArgs) -> anyhow::Result<()> {
    // Allow WEHAND_CONFIG env var as alternative to --config flag
    let config_path = std::env::var("WEHAND_CONFIG")
        .map(PathBuf::from)
        .unwrap_or(cli.config_path);

    let config = Config::load(&config_path)?;
    init_tracing(&config);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        overrides = config.env_overrides.all().len(),
        "Configuration loaded"
    );

    match cli.command {
        Command::RedirectUrl(page) => {
            let state = AppState::from_config(config);
            let env = runtime_env(&page)?;
            println!("{}", state.resolver.resolve(&env, page.provider.callback_path()));
        }
        Command::SignIn(page) => {
            config.validate()?;
            let state = AppState::from_config(config);
            let env = runtime_env(&page)?;
            start_sign_in(
                state.store.as_ref(),
                &StdoutNavigator,
                &state.resolver,
                page.provider,
                &env,
            )
            .await?;
        }
        Command::Callback { url, html } => {
            config.validate()?;
            let state = AppState::from_config(config);
            let url = Url::parse(&url)?;

            let reconciler = Arc::new(state.reconciler(Arc::new(StdoutNavigator)));
            let page = CallbackPage::new(ProviderStrategy::for_path(url.path()), reconciler);
            let outcome = page.mount(&url).await;

            if let Some(path) = html {
                std::fs::write(&path, web::render_status_page(&page.view())?)?;
                tracing::info!(path = %path.display(), "Status page written");
            }
            if let Some(outcome) = outcome.filter(|o| o.message.is_some()) {
                anyhow::bail!(outcome.message.unwrap_or_default());
            }
        }
    }
    Ok(())
}

fn runtime_env(page: &PageArgs) -> anyhow::Result<RuntimeEnv> {
    Ok(RuntimeEnv::from_page_url(
        &page.page_url,
        page.standalone,
        page.user_agent.as_str(),
    )?)
}

// ---------------------------------------------------------------------------
// Tracing initialization
// ---------------------------------------------------------------------------

/// Set up the tracing subscriber based on configuration.
fn init_tracing(config: &Config) {
    // RUST_LOG env var takes precedence over config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        EnvFilter::new(format!("wehand_auth={level},warn"))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
