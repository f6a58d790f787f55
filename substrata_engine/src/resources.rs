//! ECS resources threading the runtime handle and shared world state into
//! `bevy_ecs` systems, mirroring `dare::concurrent::tokio::BevyTokioRunTime`
//! — a `tokio::runtime::Handle` installed as a resource so synchronous
//! systems can `block_on` the async queues without a global.

use std::path::PathBuf;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use glam::DVec3;
use substrata_net::SenderHandle;
use substrata_pipeline::{DownloadQueue, LoadItemQueue};
use substrata_protocol::Uid;
use substrata_world::WorldState;

#[derive(Resource, Clone)]
pub struct TokioHandleResource(pub tokio::runtime::Handle);

#[derive(Resource, Clone)]
pub struct WorldStateResource(pub Arc<WorldState>);

#[derive(Resource, Clone)]
pub struct DownloadQueueResource(pub Arc<DownloadQueue>);

#[derive(Resource, Clone)]
pub struct LoadItemQueueResource(pub Arc<LoadItemQueue>);

#[derive(Resource, Clone, Copy, Default)]
pub struct CameraPosition(pub DVec3);

/// Base directory decoded downloads are read from; mirrors the directory
/// `download_workers` already writes into.
#[derive(Resource, Clone)]
pub struct ResourcesDirResource(pub PathBuf);

/// Outbound wire sender, installed as a resource so foreground systems can
/// send self-initiated frames (physics ownership claims) the same way
/// `main.rs` sends the handshake.
#[derive(Resource, Clone)]
pub struct SenderHandleResource(pub SenderHandle);

/// This client's own identifier for physics-ownership purposes, set once
/// login completes. `None` beforehand means "not yet known, take nothing".
#[derive(Resource, Clone, Copy, Default)]
pub struct SelfId(pub Option<Uid>);
