use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use sinala_core::{ConnectionManager, EventSender, ManagerEvent, MqttBrokerClient, event_channel};
use tracing::info;

use crate::config;
use crate::dashboard::TerminalDashboard;
use crate::desktop::DesktopNotifier;
use crate::error::MonitorResult;
use crate::status::StatusHandle;

/// How long a final DISCONNECT may take before exit.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

#[derive(Args)]
pub struct WatchArgs {
    /// Path to a YAML config file
    #[arg(long, short, env = "SINALA_CONFIG")]
    config: Option<PathBuf>,
    /// Keep a JSON snapshot of the dashboard in this file
    #[arg(long)]
    status_file: Option<PathBuf>,
}

/// Load config, connect, and show readings until SIGINT/SIGTERM.
///
/// SIGUSR1 acts as "focus regained" (reconnect now if idle) and SIGUSR2 as
/// "retry now" (leave a halted session).
pub async fn run_watch(args: WatchArgs) -> MonitorResult<()> {
    let config = config::load(args.config.as_deref()).await?;

    let (events_tx, events_rx) = event_channel();
    let client = MqttBrokerClient::new(&config.broker, events_tx.clone())?;
    info!(
        broker = %config.broker.host,
        port = config.broker.port,
        topic = %config.topic,
        client_id = client.client_id(),
        "starting monitor"
    );

    let status = args.status_file.map(StatusHandle::spawn);
    let stdout = std::io::stdout();
    let color = stdout.is_terminal();
    let dashboard = TerminalDashboard::new(stdout, color, status);
    let native = DesktopNotifier::new(config.notifications);

    tokio::spawn(forward_signals(events_tx));

    let manager = ConnectionManager::new(config, client, dashboard, native)
        .run(events_rx)
        .await;
    info!(state = %manager.state(), "monitor stopped");

    let (mut client, dashboard) = manager.into_parts();
    client.wait_closed(DISCONNECT_GRACE).await;
    dashboard.close().await;
    Ok(())
}

/// Translate process signals into manager events.
async fn forward_signals(events: EventSender) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).ok();
    let mut sigint = signal(SignalKind::interrupt()).ok();
    let mut sigusr1 = signal(SignalKind::user_defined1()).ok();
    let mut sigusr2 = signal(SignalKind::user_defined2()).ok();

    loop {
        let event = tokio::select! {
            _ = recv_signal(&mut sigterm) => {
                info!("received SIGTERM, shutting down");
                ManagerEvent::Unload
            }
            _ = recv_signal(&mut sigint) => {
                info!("received SIGINT, shutting down");
                ManagerEvent::Unload
            }
            _ = recv_signal(&mut sigusr1) => ManagerEvent::FocusRegained,
            _ = recv_signal(&mut sigusr2) => ManagerEvent::Resume,
        };
        let unload = matches!(event, ManagerEvent::Unload);
        if events.send(event).is_err() || unload {
            return;
        }
    }
}

/// Await a signal if registered, or pend forever if registration failed.
async fn recv_signal(sig: &mut Option<tokio::signal::unix::Signal>) {
    match sig {
        Some(s) => {
            s.recv().await;
        }
        None => std::future::pending().await,
    }
}
