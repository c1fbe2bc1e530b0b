use std::path::Path;

use chrono::FixedOffset;
use clap::Args;
use habitroom_core::{
    ConfigError, CronTimerPort, HabitService, HabitStore, ScoreLedger, ServiceOptions, Settings,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::CliResult;
use crate::telegram::{poll_updates, TelegramClient};

#[derive(Args)]
pub struct RunArgs {
    /// Bot token (overrides settings.toml)
    #[arg(long, env = "HABITROOM_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Admin chat id (overrides settings.toml)
    #[arg(long, env = "HABITROOM_ADMIN_CHAT")]
    admin_chat: Option<i64>,
}

pub fn run(dir: &Path, args: RunArgs) -> CliResult {
    let mut settings = Settings::load(dir)?;
    if let Some(token) = args.token {
        settings.bot_token = token;
    }
    if let Some(chat) = args.admin_chat {
        settings.admin_chat_id = Some(chat);
    }
    if settings.bot_token.trim().is_empty() {
        return Err(ConfigError::MissingKey("bot_token".into()).into());
    }
    let admin_chat_id = settings.admin_chat()?;
    let offset = settings.offset()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(dir, &settings, admin_chat_id, offset))
}

async fn serve(
    dir: &Path,
    settings: &Settings,
    admin_chat_id: i64,
    offset: FixedOffset,
) -> CliResult {
    let (queue, mut events) = mpsc::unbounded_channel();
    let client = TelegramClient::new(&settings.bot_token);

    let options = ServiceOptions {
        admin_chat_id,
        offset,
        summary_include_events: settings.summary_include_events,
    };
    let mut service = HabitService::new(
        options,
        HabitStore::in_dir(dir),
        ScoreLedger::in_dir(dir),
        client.clone(),
        CronTimerPort::new(queue.clone()),
    )?;
    let timers = service.start();
    info!(
        timers,
        admin_chat_id,
        %offset,
        data_dir = %dir.display(),
        "Habitroom running"
    );

    let poller = tokio::spawn(poll_updates(client, settings.poll_timeout_secs, queue));

    while let Some(event) = events.recv().await {
        service.handle(event).await;
    }

    warn!("Event queue closed, shutting down");
    poller.abort();
    Ok(())
}
