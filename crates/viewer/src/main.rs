use log::{info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use viewer::{
    config::ViewerConfig,
    poller::HttpFetcher,
    session::{run, Action, Render, ViewerSession},
};

/// Writes the view to the log, one line per zone.
struct LogRenderer;

impl Render for LogRenderer {
    fn render(&mut self, session: &ViewerSession) {
        let view = session.view();
        let stats = view.stats();
        info!(
            "[{:?}] {} zones, {} free / {} occupied / {} total",
            session.channel_state(),
            stats.total_zones,
            stats.total_empty,
            stats.total_occupied,
            stats.total_spots
        );
        for zone in view.zones() {
            info!(
                "  #{} {} ({}): {} / {} free, {}",
                zone.number,
                zone.name,
                zone.zone_type,
                zone.empty_spots,
                zone.total_spots,
                zone.occupancy.label()
            );
        }
        if let Some(panel) = view.panel() {
            info!(
                "  > {} {}{} | {} | {} | {} | {}",
                panel.name,
                panel.badge,
                if panel.stale { " (stale)" } else { "" },
                panel.type_name,
                panel.price_text,
                panel.schedule,
                panel.facilities.join(", ")
            );
        }
        if let Some(notification) = session.notification() {
            warn!("{:?}: {}", notification.kind, notification.message);
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = ViewerConfig::from_env();
    info!("watching {} via {}", config.api_url, config.ws_url);

    let shutdown = CancellationToken::new();
    let (actions, actions_rx) = mpsc::channel(16);

    // `select <name>`, `close` and `refresh` on stdin
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let action = match line.trim().split_once(' ') {
                Some(("select", name)) => Action::Select(name.trim().to_owned()),
                _ if line.trim() == "close" => Action::ClosePanel,
                _ if line.trim() == "refresh" => Action::Refresh,
                _ => {
                    warn!("unknown command `{}`", line.trim());
                    continue;
                }
            };
            if actions.send(action).await.is_err() {
                break;
            }
        }
    });

    let stop = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.cancel();
        }
    });

    let fetcher = HttpFetcher::new(&config).expect("could not build the http client");
    run(config, fetcher, LogRenderer, actions_rx, shutdown).await;
}
