use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use dvmn_notify::api::DevmanClient;
use dvmn_notify::config::Config;
use dvmn_notify::logging::{Fanout, FileLog, LogSink, TelegramLog};
use dvmn_notify::poll::{Poller, PollerConfig};
use dvmn_notify::telegram::{TelegramBot, TelegramNotifier};

#[derive(Parser)]
#[command(name = "dvmn-notify")]
#[command(about = "Watches dvmn.org for homework review results and notifies a Telegram chat", long_about = None)]
#[command(version)]
struct Cli {
    /// File that timestamped log records are appended to
    #[arg(long, default_value = "log.txt")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // A local .env is a development convenience; variables already present
    // in the real environment win.
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let mut sinks: Vec<Box<dyn LogSink>> = vec![Box::new(FileLog::open(&cli.log_file)?)];
    if let Some(log_token) = &config.telegram_log_token {
        let log_bot = TelegramBot::new(log_token.clone())?;
        sinks.push(Box::new(TelegramLog::new(
            log_bot,
            config.telegram_chat_id.clone(),
        )));
    }
    let log = Fanout::new(sinks);

    let source = DevmanClient::new(config.devman_token)?;
    let bot = TelegramBot::new(config.telegram_token)?;
    let notifier = TelegramNotifier::new(bot, config.telegram_chat_id);

    println!("{}", "Watching dvmn.org for review results...".bold().blue());
    println!("  Log file: {}", cli.log_file.display());
    if config.telegram_log_token.is_some() {
        println!("  Log records are forwarded to the Telegram chat");
    }
    println!();

    let mut poller = Poller::new(PollerConfig::default(), source, notifier, Box::new(log));
    poller.run()
}
