mod cli;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use substrata_engine::{
    resources::{
        CameraPosition, DownloadQueueResource, LoadItemQueueResource, ResourcesDirResource,
        SenderHandleResource, TokioHandleResource,
    },
    systems::{
        animated_texture_sweep_system, load_item_consumer_system, lod_and_download_sweep_system,
        physics_ownership_sweep_system, proximity_and_script_sweep_system, timer_sweep_system,
    },
    EngineClient, EngineServer,
};
use substrata_net::{session::SessionTransport, voice, ForegroundMessage, SenderHandle};
use substrata_pipeline::{
    download_workers, upload_workers, DownloadQueue, DownloadSink, DownloadWorkerConfig, LoadItemQueue,
};
use substrata_protocol::handshake::ConnectionType;
use substrata_protocol::UrlString;
use substrata_scripting::{ScriptEventRegistry, ScriptedObjectProximityChecker, TimerQueue};
use substrata_world::{ProximityLoader, WorldState};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::cli::{parse_sub_url, Args};
use crate::config::SubstrataConfig;

/// The parameters every subsystem constructor takes by reference/clone
/// instead of reading from a global, mirroring `dare`'s `BevyTokioRunTime`
/// resource pattern.
#[derive(Clone)]
pub struct Runtime {
    pub config: Arc<SubstrataConfig>,
    pub handle: tokio::runtime::Handle,
    pub resources_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub lightmaps_dir: PathBuf,
}

impl Runtime {
    fn new(config: SubstrataConfig) -> Self {
        let app_data_dir = config.resolved_app_data_dir();
        Self {
            resources_dir: app_data_dir.join("resources"),
            screenshots_dir: app_data_dir.join("screenshots"),
            lightmaps_dir: app_data_dir.join("lightmaps"),
            config: Arc::new(config),
            handle: tokio::runtime::Handle::current(),
        }
    }
}

fn resolve_config(args: &Args) -> Result<SubstrataConfig> {
    let sub_url = args.sub_url.as_deref().and_then(parse_sub_url);

    let mut config = if let Some(path) = &args.config {
        SubstrataConfig::load_from_file(path).context("reading --config file")?
    } else {
        let host = sub_url
            .as_ref()
            .map(|u| u.host.clone())
            .or_else(|| args.host.clone())
            .context("a --host flag or a sub:// URL is required")?;
        SubstrataConfig {
            host,
            port: 7600,
            world: None,
            load_distance: 500.0,
            max_num_concurrent_downloads: 10,
            num_download_workers: 4,
            num_upload_workers: 2,
            app_data_dir: None,
            stale_ownership_threshold_s: 20.0,
            ownership_renewal_period_s: 10.0,
            script_proximity_radius_m: 20.0,
        }
    };

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(url) = &sub_url {
        config.host = url.host.clone();
        if let Some(port) = url.port {
            config.port = port;
        }
        if url.world.is_some() {
            config.world = url.world.clone();
        }
    }
    if args.port != 7600 {
        config.port = args.port;
    }
    if args.world.is_some() {
        config.world = args.world.clone();
    }
    if args.load_distance != 500.0 {
        config.load_distance = args.load_distance;
    }

    if config.host.is_empty() {
        bail!("no host resolved from --host, --config, or a sub:// URL");
    }
    Ok(config)
}

/// Forwards completed downloads into the load-item pipeline; this is the
/// seam between §4.G (download workers) and §4.J (load coordination).
struct ForegroundDownloadSink {
    foreground_tx: mpsc::UnboundedSender<ForegroundMessage>,
}

impl DownloadSink for ForegroundDownloadSink {
    fn resource_present(&self, url: &UrlString) {
        let _ = self
            .foreground_tx
            .send(ForegroundMessage::ResourceDownloadedOnServer { url: url.as_str().to_string() });
    }

    fn resource_failed(&self, url: &UrlString) {
        warn!("resource failed to download: {url}");
    }
}

struct DiscardingVoiceSink;

impl voice::VoiceSink for DiscardingVoiceSink {
    fn push_samples(&mut self, _avatar_uid: substrata_protocol::Uid, _samples: &[f32]) {
        // No audio mixer in this workspace (§9 Non-goals); decoded PCM is
        // produced and discarded so the decode path is still exercised.
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if args.screenshotslave {
        info!("--screenshotslave requested; the screenshot-slave socket protocol is out of scope, flag logged only");
    }
    if args.screenshot {
        info!("--screenshot requested; the screenshot bot itself is out of scope, flag logged only");
    }

    let config = resolve_config(&args)?;
    let runtime = Runtime::new(config);
    info!(host = %runtime.config.host, port = runtime.config.port, "starting substrata client runtime");

    std::fs::create_dir_all(&runtime.resources_dir)?;
    std::fs::create_dir_all(&runtime.screenshots_dir)?;
    std::fs::create_dir_all(&runtime.lightmaps_dir)?;

    let world_state = Arc::new(WorldState::new());
    let download_queue = Arc::new(DownloadQueue::new());
    let load_item_queue = Arc::new(LoadItemQueue::new());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (foreground_tx, mut foreground_rx) = mpsc::unbounded_channel::<ForegroundMessage>();

    let (session, handshake_info) =
        SessionTransport::connect(&runtime.config.host, runtime.config.port, ConnectionType::Updates)
            .await
            .context("connecting to server")?;
    info!(server_protocol_version = handshake_info.server_protocol_version, "handshake complete");

    let sender_handle = SenderHandle::new();
    let (read_half, write_half) = session.split();

    tokio::spawn(substrata_net::sender::run(sender_handle.clone(), write_half, shutdown_rx.clone()));
    tokio::spawn(substrata_net::receiver::run(
        read_half,
        world_state.clone(),
        foreground_tx.clone(),
        shutdown_rx.clone(),
    ));

    for worker_i in 0..runtime.config.num_download_workers {
        let cfg = DownloadWorkerConfig {
            host: runtime.config.host.clone(),
            port: runtime.config.port,
            resources_dir: runtime.resources_dir.clone(),
            reconnect_backoff: std::time::Duration::from_secs(2),
            idle_poll: std::time::Duration::from_millis(250),
        };
        let sink: Arc<dyn DownloadSink> = Arc::new(ForegroundDownloadSink { foreground_tx: foreground_tx.clone() });
        let queue = download_queue.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            info!(worker_i, "download worker starting");
            download_workers::run(cfg, queue, sink, shutdown).await;
        });
    }

    struct LoggingUploadSink;
    impl upload_workers::UploadSink for LoggingUploadSink {
        fn upload_succeeded(&self, url: &UrlString) {
            info!(%url, "upload succeeded");
        }
        fn upload_failed(&self, url: &UrlString, reason: &str) {
            warn!(%url, reason, "upload failed");
        }
    }

    // Content-creation dialogs are out of scope in this workspace, so
    // nothing ever feeds `upload_inbox` yet; the worker pool still runs so
    // the upload path is exercised the moment a producer is wired in.
    let (_upload_tx, upload_rx) = mpsc::unbounded_channel::<upload_workers::ResourceToUpload>();
    let outstanding_uploads = Arc::new(upload_workers::OutstandingUploads::default());
    if runtime.config.num_upload_workers > 0 {
        let cfg = upload_workers::UploadWorkerConfig {
            host: runtime.config.host.clone(),
            port: runtime.config.port,
            username: String::new(),
            password: String::new(),
            reconnect_backoff: std::time::Duration::from_secs(2),
        };
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            upload_workers::run(cfg, upload_rx, Arc::new(LoggingUploadSink), outstanding_uploads, shutdown).await;
        });
    }

    if let Ok(socket) = tokio::net::UdpSocket::bind("0.0.0.0:0").await {
        let voice_receiver = Arc::new(voice::VoiceReceiver::new());
        let server_addr = format!("{}:{}", runtime.config.host, runtime.config.port)
            .parse()
            .unwrap_or_else(|_| "0.0.0.0:0".parse().unwrap());
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            voice::run(socket, server_addr, voice_receiver, DiscardingVoiceSink, shutdown).await;
        });
    }

    let download_queue_for_engine = download_queue.clone();
    let world_state_for_engine = world_state.clone();
    let handle_for_engine = runtime.handle.clone();
    let load_item_queue_for_engine = load_item_queue.clone();
    let resources_dir_for_engine = runtime.resources_dir.clone();
    let sender_handle_for_engine = sender_handle.clone();
    let load_distance = runtime.config.load_distance as f64;
    let (engine_server, engine_client) = EngineServer::new(move |app| {
        app.world_mut().insert_resource(substrata_engine::WorldStateResource(world_state_for_engine));
        app.world_mut().insert_resource(CameraPosition::default());
        app.world_mut().insert_resource(DownloadQueueResource(download_queue_for_engine));
        app.world_mut().insert_resource(LoadItemQueueResource(load_item_queue_for_engine));
        app.world_mut().insert_resource(ResourcesDirResource(resources_dir_for_engine));
        app.world_mut().insert_resource(SenderHandleResource(sender_handle_for_engine));
        app.world_mut().insert_resource(TokioHandleResource(handle_for_engine));
        app.world_mut().insert_resource(ProximityLoader::new(load_distance, 16));
        app.world_mut().insert_resource(ScriptEventRegistry::default());
        app.world_mut().insert_resource(TimerQueue::new());
        app.world_mut().insert_resource(ScriptedObjectProximityChecker::new());
        app.schedule_scope(|schedule| {
            schedule.add_systems((
                lod_and_download_sweep_system,
                proximity_and_script_sweep_system,
                animated_texture_sweep_system,
                load_item_consumer_system,
                physics_ownership_sweep_system,
                timer_sweep_system,
            ));
        });
    })?;

    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(16));
    let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                if let Err(e) = engine_client.tick() {
                    warn!("engine tick failed: {e}");
                    break;
                }
            }
            msg = foreground_rx.recv() => {
                match msg {
                    Some(m) => handle_foreground_message(m, &engine_client),
                    None => break,
                }
            }
            _ = &mut ctrl_c => {
                info!("ctrl-c received, shutting down");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    drop(engine_server);
    Ok(())
}

fn handle_foreground_message(msg: ForegroundMessage, engine_client: &EngineClient) {
    match msg {
        ForegroundMessage::Chat { from_name, text, .. } => info!(from = %from_name, %text, "chat"),
        ForegroundMessage::Info(text) => info!(%text, "server info"),
        ForegroundMessage::Error(text) => warn!(%text, "server error"),
        ForegroundMessage::ServerAdmin(text) => info!(%text, "server admin message"),
        ForegroundMessage::LoggedIn { user_id, username, .. } => {
            info!(%username, %user_id, "logged in");
            if let Err(e) = engine_client.set_self_id(user_id) {
                warn!("failed to hand self id to engine thread: {e}");
            }
        }
        ForegroundMessage::LoggedOut => info!("logged out"),
        ForegroundMessage::SignedUp { user_id } => info!(%user_id, "signed up"),
        ForegroundMessage::ClientProtocolTooOld => warn!("server rejected client protocol as too old"),
        ForegroundMessage::ChangeToDifferentWorld { new_world_name } => {
            info!(%new_world_name, "server requested a world change")
        }
        ForegroundMessage::MapTilesResult { tile_urls } => info!(count = tile_urls.len(), "map tiles received"),
        ForegroundMessage::ObjectPhysicsOwnershipTaken { object_uid, owner_client_id, .. } => {
            info!(%object_uid, %owner_client_id, "physics ownership taken")
        }
        ForegroundMessage::ObjectPhysicsTransformUpdate { object_uid } => {
            info!(%object_uid, "physics transform update")
        }
        ForegroundMessage::AvatarPerformGesture { avatar_uid, gesture_name } => {
            info!(%avatar_uid, %gesture_name, "avatar gesture")
        }
        ForegroundMessage::AvatarStopGesture { avatar_uid } => info!(%avatar_uid, "avatar gesture stopped"),
        ForegroundMessage::AvatarEnteredVehicle { avatar_uid } => info!(%avatar_uid, "avatar entered vehicle"),
        ForegroundMessage::AvatarExitedVehicle { avatar_uid } => info!(%avatar_uid, "avatar exited vehicle"),
        ForegroundMessage::ParcelList { parcel_ids } => info!(count = parcel_ids.len(), "parcel list received"),
        ForegroundMessage::ResourceDownloadedOnServer { url } => info!(%url, "resource downloaded"),
        ForegroundMessage::KeepAlive => {}
    }
}
