use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    serenity::{Client, http::Http},
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use {
    dmbridge_config::BridgeConfig,
    dmbridge_mirror::{
        CorrelationStore, EngineSettings, EventDispatcher, SyncEngine,
        dispatch::DEFAULT_QUEUE_CAPACITY,
    },
};

use crate::{access::DiscordPermissionGate, handler::MirrorHandler, outbound::DiscordTransport};

/// How long queued events may keep running after the gateway closes.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a sync engine that talks to Discord through `http`.
pub fn build_engine(
    config: &BridgeConfig,
    store: Arc<dyn CorrelationStore>,
    http: Arc<Http>,
) -> SyncEngine {
    let settings = EngineSettings {
        channel_id: config.channel.clone(),
        locale: config.locale,
        verify_writes: config.verify_writes,
    };
    SyncEngine::new(
        store,
        Arc::new(DiscordTransport::new(Arc::clone(&http))),
        Arc::new(DiscordPermissionGate::new(http)),
        settings,
    )
}

/// Connect to the gateway and mirror DMs until `cancel` fires.
///
/// On shutdown the gateway is closed first, then events already queued are
/// given [`DRAIN_TIMEOUT`] to settle. The dispatcher only finishes once every
/// lane has applied its events, so a timeout here means work was abandoned.
pub async fn start_bridge(
    config: BridgeConfig,
    store: Arc<dyn CorrelationStore>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let token = config.token.expose_secret();
    let http = Arc::new(Http::new(token));
    let engine = Arc::new(build_engine(&config, store, http));

    let (events, dispatcher) = EventDispatcher::new(engine, DEFAULT_QUEUE_CAPACITY);
    // The queue closes when the handler drops, which ends the dispatcher.
    let mut dispatch = tokio::spawn(dispatcher.run(CancellationToken::new()));

    let handler = MirrorHandler::new(events, &config.channel);
    let mut client = Client::builder(token, MirrorHandler::intents())
        .event_handler(handler)
        .await?;

    let shard_manager = Arc::clone(&client.shard_manager);
    let stopper = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            cancel.cancelled().await;
            info!("closing discord gateway");
            shard_manager.shutdown_all().await;
        }
    });

    info!(channel = %config.channel, locale = ?config.locale, "starting discord bridge");
    let result = client.start().await;
    stopper.abort();
    // Dropping the client drops the handler, which closes the event queue.
    drop(client);

    if tokio::time::timeout(DRAIN_TIMEOUT, &mut dispatch).await.is_err() {
        warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "queued events did not settle in time, abandoning them"
        );
        dispatch.abort();
    }
    info!("discord bridge stopped");

    result.map_err(Into::into)
}
