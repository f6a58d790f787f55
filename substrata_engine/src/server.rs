//! Foreground ECS scheduling thread. Mirrors the client's single dedicated
//! thread, running a `substrata_ecs::App` (the teacher's `bevy_ecs`-backed
//! scheduling backbone) as its tick loop, with `WorldState`, the pipeline
//! queues, and the engine's own coordinators installed as resources rather
//! than living behind a global.

use anyhow::Result;
use substrata_ecs::App;
use substrata_protocol::Uid;
use tokio::sync::oneshot::error::TryRecvError;

use crate::animated_texture::AnimatedTextureCoordinator;
use crate::load_coordinator::LoadCoordinator;
use crate::physics_arbiter::PhysicsOwnershipArbiter;
use crate::resource_arena::ResourceArena;
use crate::resources::SelfId;

#[derive(Debug)]
enum EnginePacket {
    Tick,
    SetSelfId(Uid),
}

#[derive(Debug, Clone)]
pub struct EngineClient {
    server_send: std::sync::mpsc::Sender<EnginePacket>,
}

impl EngineClient {
    pub fn new(server_send: std::sync::mpsc::Sender<EnginePacket>) -> Self {
        Self { server_send }
    }

    pub fn tick(&self) -> Result<()> {
        Ok(self.server_send.send(EnginePacket::Tick)?)
    }

    /// Tells the engine thread this client's own user id, once login
    /// completes, so `physics_ownership_sweep_system` knows whose uid to
    /// stamp when taking ownership of a dynamic object.
    pub fn set_self_id(&self, uid: Uid) -> Result<()> {
        Ok(self.server_send.send(EnginePacket::SetSelfId(uid))?)
    }
}

#[derive(Debug)]
pub struct EngineServer {
    drop_sender: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl EngineServer {
    /// Spawns the engine thread. `init` runs once on the engine thread with
    /// exclusive access to the freshly-created `App`, the place to install
    /// systems and any caller-provided starting resources (e.g.
    /// `WorldState`, the pipeline queues).
    pub fn new<F>(init: F) -> Result<(Self, EngineClient)>
    where
        F: FnOnce(&mut App) + Send + 'static,
    {
        let (server_send, server_recv) = std::sync::mpsc::channel::<EnginePacket>();
        let mut app = App::new();
        app.world_mut().insert_resource(LoadCoordinator::new());
        app.world_mut().insert_resource(AnimatedTextureCoordinator::new());
        app.world_mut().insert_resource(PhysicsOwnershipArbiter::default());
        app.world_mut().insert_resource(ResourceArena::new());
        app.world_mut().insert_resource(SelfId::default());
        init(&mut app);

        let (drop_sender, mut drop_receiver) = tokio::sync::oneshot::channel();
        let thread = std::thread::spawn(move || {
            loop {
                match drop_receiver.try_recv() {
                    Ok(_) | Err(TryRecvError::Closed) => break,
                    Err(TryRecvError::Empty) => {}
                }
                match server_recv.recv() {
                    Err(_) => break,
                    Ok(EnginePacket::Tick) => {
                        app.tick();
                    }
                    Ok(EnginePacket::SetSelfId(uid)) => {
                        app.world_mut().insert_resource(SelfId(Some(uid)));
                    }
                }
            }
            drop(app);
            tracing::trace!("engine thread stopped");
        });

        Ok((
            Self {
                thread: Some(thread),
                drop_sender: Some(drop_sender),
            },
            EngineClient::new(server_send),
        ))
    }
}

impl Drop for EngineServer {
    fn drop(&mut self) {
        tracing::trace!("dropping engine server");
        if let Some(drop_sender) = self.drop_sender.take() {
            let _ = drop_sender.send(());
        }
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}
