//! creditpro - operator CLI for the CreditPro backend
//!
//! Logs in with the configured (or given) credentials and exercises the
//! client core: permission matrix, visible sections, live chat and report
//! export.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use creditpro_client::logging::init_tracing;
use creditpro_client::models::{
    ChatMessage, Credentials, ExportFormat, PermissionAction, PermissionModule,
};
use creditpro_client::services::{AuthSession, ChatSession};
use creditpro_client::utils::DateRange;
use creditpro_client::Config;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "creditpro")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Username, overrides CREDITPRO__AUTH__USERNAME
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Password, overrides CREDITPRO__AUTH__PASSWORD
    #[arg(short, long, global = true)]
    password: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the credentials and show the logged-in user
    Login,

    /// Print the module × action permission matrix
    Permissions,

    /// List the dashboard sections the user may open
    Nav,

    /// Follow the realtime chat
    Chat {
        /// Open the conversation with this user (marks it read)
        #[arg(long)]
        peer: Option<i64>,

        /// Send this message to --peer once connected
        #[arg(long, requires = "peer")]
        send: Option<String>,

        /// Stop after this many seconds (runs until Ctrl-C otherwise)
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Download a credit report for a date range
    Export {
        /// pdf or excel
        #[arg(short, long, value_parser = parse_format, default_value = "pdf")]
        format: ExportFormat,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Output directory, overrides CREDITPRO__EXPORT__OUTPUT_DIR
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn parse_format(value: &str) -> std::result::Result<ExportFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "pdf" => Ok(ExportFormat::Pdf),
        "excel" | "xlsx" => Ok(ExportFormat::Excel),
        other => Err(format!("unknown format {other}, expected pdf or excel")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = Config::load().context("failed to load configuration")?;
    let session = AuthSession::from_config(&config)?;
    login(&session, &config, &cli).await?;

    let outcome = run(&session, &config, cli.command).await;
    session.logout().await;
    outcome
}

async fn login(session: &AuthSession, config: &Config, cli: &Cli) -> Result<()> {
    let username = cli
        .username
        .clone()
        .or_else(|| config.auth.username.clone())
        .context("no username given (--username or CREDITPRO__AUTH__USERNAME)")?;
    let password = cli
        .password
        .clone()
        .or_else(|| config.auth.password.clone())
        .context("no password given (--password or CREDITPRO__AUTH__PASSWORD)")?;

    let user = session
        .login(Credentials::new(username, password))
        .await
        .context("login failed")?;
    info!(user_id = user.id, "authenticated");
    Ok(())
}

async fn run(session: &AuthSession, config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Login => {
            let Some(user) = session.current_user() else {
                bail!("no active session");
            };
            println!("{} <{}>", user.display_name(), user.email);
            println!("id:   {}", user.id);
            println!("role: {}", user.role);
        }
        Commands::Permissions => {
            let matrix = session.permissions(|p| p.matrix());
            print!("{:<18}", "module");
            for action in PermissionAction::ALL {
                print!("{:>10}", action.as_str());
            }
            println!();
            for (module, row) in matrix {
                print!("{:<18}", module.as_str());
                for allowed in row {
                    print!("{:>10}", if allowed { "yes" } else { "-" });
                }
                println!();
            }
        }
        Commands::Nav => {
            for section in session.visible_sections() {
                println!("{:<18} {}", section.id, section.label);
            }
        }
        Commands::Chat {
            peer,
            send,
            duration,
        } => chat(session, peer, send, duration).await?,
        Commands::Export {
            format,
            from,
            to,
            out,
        } => {
            session.require(PermissionModule::Reportes, PermissionAction::Ver)?;
            let range = DateRange::parse(&from, &to)?;
            let result = session.api().reportes().exportar(format, &range).await;
            let report = session.guard(result).await?;
            let dir = out.unwrap_or_else(|| config.export.output_dir.clone());
            let path = report.save_to(&dir).await?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn chat(
    session: &AuthSession,
    peer: Option<i64>,
    send: Option<String>,
    duration: Option<u64>,
) -> Result<()> {
    let user = session.current_user().context("no active session")?;
    let relay = session.relay().clone();
    relay
        .wait_until_connected(Duration::from_secs(10))
        .await
        .context("chat relay did not connect")?;

    // replace_all overwrites counters, so seed before the listener runs.
    let chat = ChatSession::new(user.id, relay.clone());
    let loaded = chat.load_unread_counts(session.api()).await;
    session.guard(loaded).await?;
    chat.start();

    let mut messages = relay.subscribe_messages();
    let mut presence = relay.subscribe_presence();
    let mut typing = relay.subscribe_typing();
    let mut reads = relay.subscribe_read_receipts();
    let mut errors = relay.subscribe_errors();

    if let Some(peer) = peer {
        let history = chat.load_history(session.api(), peer).await;
        let count = session.guard(history).await?;
        for message in chat.conversation(peer) {
            print_message(&message);
        }
        info!(peer, count, "history loaded");
        chat.open_conversation(peer)?;
        if let Some(text) = send {
            chat.send(peer, &text)?;
        }
    }
    print_unread(&chat);

    let deadline = async {
        match duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            Some(message) = messages.recv() => {
                print_message(&message);
            }
            Some(event) = presence.recv() => {
                let status = if event.is_online { "online" } else { "offline" };
                println!("* user {} is {}", event.user_id, status);
            }
            Some(event) = typing.recv() => {
                if event.is_typing {
                    println!("* user {} is typing", event.user_id);
                }
            }
            Some(receipt) = reads.recv() => {
                println!("* user {} read your messages", receipt.read_by_id);
            }
            Some(error) = errors.recv() => {
                eprintln!("! {}", error.error);
            }
        }
    }

    chat.stop();
    print_unread(&chat);
    Ok(())
}

fn print_message(message: &ChatMessage) {
    println!(
        "[{}] {} -> {}: {}",
        message.timestamp, message.sender_id, message.receiver_id, message.content
    );
}

fn print_unread(chat: &ChatSession) {
    println!(
        "unread total: {} by peer: {:?}",
        chat.total_unread(),
        chat.unread_snapshot()
    );
}
