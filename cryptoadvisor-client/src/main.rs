use std::sync::Arc;

use anyhow::{Context, Result, bail};
use cryptoadvisor_client::app::{self, ClientConfig};
use cryptoadvisor_client::common::{CrossDomainEvent, EventBus, Topic};
use cryptoadvisor_client::domains::session::{
    Session, SessionError, SessionStorage,
};
use cryptoadvisor_client::infra::constants::wallet::POLL_INTERVAL;

enum Command {
    Watch,
    Deposit(f64),
    Logout,
}

fn parse_command() -> Result<Command> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("watch") => Ok(Command::Watch),
        Some("deposit") => {
            let raw = args
                .next()
                .context("usage: cryptoadvisor deposit <amount>")?;
            let amount = raw
                .parse::<f64>()
                .with_context(|| format!("invalid amount: {raw}"))?;
            Ok(Command::Deposit(amount))
        }
        Some("logout") => Ok(Command::Logout),
        Some(other) => bail!("unknown command: {other}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    app::init_logger();

    let command = parse_command()?;
    let config = ClientConfig::from_environment()?;
    let api = Arc::new(config.api_client()?);
    let storage = SessionStorage::new()?;
    let bus = EventBus::new();

    let _balance_log = bus.subscribe(Topic::Balance, |event| {
        if let CrossDomainEvent::BalanceChanged { owner, balance } = event {
            log::info!(
                "Balance for {}: {:.2} ({:?} {})",
                owner,
                balance.value,
                balance.source,
                balance.sequence
            );
        }
    });
    let _error_log = bus.subscribe(Topic::BackgroundErrors, |event| {
        if let CrossDomainEvent::RefreshFailed { owner, message } = event {
            log::debug!(
                "Background refresh for {} failed: {}",
                owner,
                message
            );
        }
    });

    let session = match Session::resume(api, storage, bus).await {
        Ok(session) => session,
        Err(SessionError::NotAuthenticated) => {
            log::warn!(
                "No stored session, please login through the web client"
            );
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    match command {
        Command::Logout => {
            session.end().await?;
        }
        Command::Deposit(amount) => {
            let result = session.store().deposit(amount).await;
            session.close().await;
            match result {
                Ok(balance) => log::info!("New balance: {:.2}", balance.value),
                Err(err) if err.requires_login() => {
                    bail!("session expired, please login again")
                }
                Err(err) => bail!(err),
            }
        }
        Command::Watch => {
            session.start_polling(POLL_INTERVAL)?;
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
            session.close().await;
        }
    }

    Ok(())
}
