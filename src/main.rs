// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Denonbt bridge daemon

use anyhow::Result;
use clap::Parser;
use std::fmt::Display;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use denonbt::bluetooth::{Frame, LinkError, LinkManager, LinkTimings, RfcommConnector};
use denonbt::config::{Cli, Config};
use denonbt::http::{create_router, HttpState};

/// Exit status for configuration errors the process cannot recover from.
const EXIT_CONFIG_ERROR: i32 = 99;

fn fatal_error(err: impl Display) -> ! {
    error!("fatal error: {}", err);
    std::process::exit(EXIT_CONFIG_ERROR);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("denonbt=info".parse()?),
        )
        .init();

    info!("denonbt v{} started", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load(cli.config.as_deref())?.with_cli(&cli);
    let target = config.target().unwrap_or_else(|e| fatal_error(e));
    if let Some(target) = &target {
        info!("Receiver: {}", target);
    }

    let link = LinkManager::new(
        Arc::new(RfcommConnector::new()),
        target,
        LinkTimings::default(),
    );

    let signal_link = link.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("unable to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown signal received");
        signal_link.shutdown();
    });

    match link.open_link(false).await {
        Ok(()) => {}
        Err(LinkError::MissingTarget) => fatal_error("--hwaddr parameter must be set"),
        Err(LinkError::Shutdown) => {
            info!("denonbt stopped before connecting");
            return Ok(());
        }
    }

    // The receiver's own app opens every session with this frame.
    link.send(&Frame::startup()).await;

    let mut tasks = Vec::new();
    if let Some(interval) = config.ping_interval() {
        tasks.push(tokio::spawn(
            link.clone().run_keepalive(interval, Frame::keepalive()),
        ));
    }
    tasks.push(tokio::spawn(link.clone().run_reader()));

    let router = create_router(HttpState { link: link.clone() });
    let listener = TcpListener::bind(&config.server.listen).await?;
    info!("HTTP server listening on {}", config.server.listen);

    let shutdown_link = link.clone();
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown_link.shutdown_requested().await })
        .await;

    if let Err(e) = &served {
        error!("error listening: {}", e);
    }

    link.shutdown();
    for task in tasks {
        let _ = task.await;
    }

    info!("denonbt stopped");
    served.map_err(Into::into)
}
