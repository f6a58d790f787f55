use std::sync::Arc;
use std::time::Instant;

use glam::{DVec3, IVec3};
use substrata_protocol::wire::Reader;
use substrata_protocol::{message_id, ParcelId, ProtocolError, Uid};
use substrata_world::{LodChunk, Parcel, WorldObject, WorldState};
use tokio::io::ReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_rustls::client::TlsStream;
use tracing::{trace, warn};

use crate::error::NetError;
use crate::message::ForegroundMessage;
use crate::session::read_frame_from;

/// Decompresses and parses a single `ObjectInitialSendCompressed` frame,
/// which carries a Zstd-compressed stream of back-to-back, length-prefixed
/// `WorldObject` wire encodings.
pub fn parse_compressed_object_batch(compressed: &[u8]) -> Result<Vec<WorldObject>, NetError> {
    let decompressed =
        zstd::stream::decode_all(compressed).map_err(NetError::Io)?;
    let mut objects = Vec::new();
    let mut reader = Reader::new(&decompressed);
    while reader.remaining() > 0 {
        let len = reader.read_u32()? as usize;
        let bytes = reader.read_bytes(len)?;
        objects.push(WorldObject::read_from_bytes(bytes)?);
    }
    Ok(objects)
}

fn read_optional_url_str(r: &mut Reader) -> Result<Option<String>, ProtocolError> {
    Ok(if r.read_bool()? { Some(r.read_string()?) } else { None })
}

/// Reads frames from `read_half` until shutdown, applying object/avatar/
/// parcel mutations directly to `world` and forwarding everything else
/// through `foreground_tx`.
pub async fn run(
    mut read_half: ReadHalf<TlsStream<TcpStream>>,
    world: Arc<WorldState>,
    foreground_tx: mpsc::UnboundedSender<ForegroundMessage>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let frame = tokio::select! {
            frame = read_frame_from(&mut read_half) => frame,
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
                continue;
            }
        };

        let (message_type, payload) = match frame {
            Ok(f) => f,
            Err(e) => {
                warn!("receiver: connection error: {e}");
                return;
            }
        };

        if let Err(e) = dispatch(message_type, &payload, &world, &foreground_tx) {
            warn!("receiver: failed to parse message {message_type}: {e}");
        }
    }
}

fn dispatch(
    message_type: u32,
    payload: &[u8],
    world: &WorldState,
    tx: &mpsc::UnboundedSender<ForegroundMessage>,
) -> Result<(), NetError> {
    let mut r = Reader::new(payload);

    match message_type {
        message_id::OBJECT_CREATED | message_id::OBJECT_FULL_UPDATE | message_id::OBJECT_INITIAL_SEND => {
            let object = WorldObject::read_from_bytes(payload)?;
            world.insert_object(object);
        }
        message_id::OBJECT_INITIAL_SEND_COMPRESSED => {
            for object in parse_compressed_object_batch(payload)? {
                world.insert_object(object);
            }
        }
        message_id::OBJECT_DESTROYED => {
            let uid = Uid(r.read_u64()?);
            world.remove_object(uid);
        }
        message_id::OBJECT_TRANSFORM_UPDATE => {
            let uid = Uid(r.read_u64()?);
            let pos = r.read_vec3_f64()?;
            let axis = r.read_vec3_f32()?;
            let angle = r.read_f32()?;
            let scale = r.read_vec3_f32()?;
            world.with_object_mut(uid, |ob| {
                ob.pos = pos;
                ob.axis = axis;
                ob.angle = angle;
                ob.scale = scale;
            });
        }
        message_id::OBJECT_PHYSICS_TRANSFORM_UPDATE => {
            let uid = Uid(r.read_u64()?);
            let pos = r.read_vec3_f64()?;
            let axis = r.read_vec3_f32()?;
            let angle = r.read_f32()?;
            let scale = r.read_vec3_f32()?;
            world.with_object_mut(uid, |ob| {
                ob.pos = pos;
                ob.axis = axis;
                ob.angle = angle;
                ob.scale = scale;
            });
            let _ = tx.send(ForegroundMessage::ObjectPhysicsTransformUpdate { object_uid: uid });
        }
        message_id::OBJECT_PHYSICS_OWNERSHIP_TAKEN => {
            let uid = Uid(r.read_u64()?);
            let owner_client_id = Uid(r.read_u64()?);
            let take_time = r.read_f64()?;
            world.with_object_mut(uid, |ob| {
                ob.physics_owner_id = Some(owner_client_id);
                ob.physics_owner_take_time = take_time;
                ob.physics_owner_last_renewal_time = take_time;
            });
            let _ = tx.send(ForegroundMessage::ObjectPhysicsOwnershipTaken {
                object_uid: uid,
                owner_client_id,
                take_time,
            });
        }
        message_id::OBJECT_FLAGS_CHANGED => {
            let uid = Uid(r.read_u64()?);
            let flags = r.read_u32()?;
            world.with_object_mut(uid, |ob| {
                ob.flags = substrata_world::ObjectFlags::from_bits_truncate(flags);
            });
        }
        message_id::OBJECT_LIGHTMAP_URL_CHANGED => {
            let uid = Uid(r.read_u64()?);
            let url = read_optional_url_str(&mut r)?.map(Into::into);
            world.with_object_mut(uid, |ob| {
                ob.lightmap_url = url;
            });
        }
        message_id::OBJECT_MODEL_URL_CHANGED => {
            let uid = Uid(r.read_u64()?);
            let url = read_optional_url_str(&mut r)?.map(Into::into);
            world.with_object_mut(uid, |ob| {
                ob.model_url = url;
            });
        }
        message_id::OBJECT_CONTENT_CHANGED | message_id::SUMMON_OBJECT => {
            let uid = Uid(r.read_u64()?);
            world.with_object_mut(uid, |_| {});
        }

        message_id::AVATAR_CREATED | message_id::AVATAR_IS_HERE | message_id::AVATAR_FULL_UPDATE => {
            let uid = Uid(r.read_u64()?);
            let name = r.read_string()?;
            let pos = r.read_vec3_f64()?;
            let axis = r.read_vec3_f32()?;
            let angle = r.read_f32()?;
            let mut avatar = substrata_world::Avatar::new(uid, name, pos);
            avatar.axis = axis;
            avatar.angle = angle;
            world.insert_avatar(avatar);
        }
        message_id::AVATAR_DESTROYED => {
            let uid = Uid(r.read_u64()?);
            world.remove_avatar(uid);
        }
        message_id::AVATAR_TRANSFORM_UPDATE => {
            let uid = Uid(r.read_u64()?);
            let pos = r.read_vec3_f64()?;
            let axis = r.read_vec3_f32()?;
            let angle = r.read_f32()?;
            // No with_avatar_mut helper exists yet; re-insert with updated
            // pose, preserving identity fields via remove-then-insert.
            if let Some(mut avatar) = world.remove_avatar(uid) {
                avatar.pos = pos;
                avatar.axis = axis;
                avatar.angle = angle;
                world.insert_avatar(avatar);
            }
        }
        message_id::AVATAR_PERFORM_GESTURE => {
            let avatar_uid = Uid(r.read_u64()?);
            let gesture_name = r.read_string()?;
            let _ = tx.send(ForegroundMessage::AvatarPerformGesture { avatar_uid, gesture_name });
        }
        message_id::AVATAR_STOP_GESTURE => {
            let avatar_uid = Uid(r.read_u64()?);
            let _ = tx.send(ForegroundMessage::AvatarStopGesture { avatar_uid });
        }
        message_id::AVATAR_ENTERED_VEHICLE => {
            let avatar_uid = Uid(r.read_u64()?);
            let _ = tx.send(ForegroundMessage::AvatarEnteredVehicle { avatar_uid });
        }
        message_id::AVATAR_EXITED_VEHICLE => {
            let avatar_uid = Uid(r.read_u64()?);
            let _ = tx.send(ForegroundMessage::AvatarExitedVehicle { avatar_uid });
        }

        message_id::CHAT_MESSAGE => {
            let from_uid = Uid(r.read_u64()?);
            let from_name = r.read_string()?;
            let text = r.read_string()?;
            let _ = tx.send(ForegroundMessage::Chat { from_uid, from_name, text });
        }

        message_id::PARCEL_CREATED | message_id::PARCEL_FULL_UPDATE => {
            let parcel = read_parcel(&mut r)?;
            world.insert_parcel(parcel);
        }
        message_id::PARCEL_DESTROYED => {
            let _id = ParcelId(r.read_u32()?);
        }
        message_id::PARCEL_INITIAL_SEND_COMPRESSED => {
            let decompressed = zstd::stream::decode_all(payload).map_err(NetError::Io)?;
            let mut pr = Reader::new(&decompressed);
            while pr.remaining() > 0 {
                let len = pr.read_u32()? as usize;
                let sub_bytes = pr.read_bytes(len)?;
                let mut sub_reader = Reader::new(sub_bytes);
                let parcel = read_parcel(&mut sub_reader)?;
                world.insert_parcel(parcel);
            }
        }

        message_id::LOD_CHUNK_INITIAL_SEND | message_id::LOD_CHUNK_UPDATED => {
            let x = r.read_i32()?;
            let y = r.read_i32()?;
            let z = r.read_i32()?;
            let combined_mesh_url = read_optional_url_str(&mut r)?.map(Into::into);
            let combined_array_texture_url = read_optional_url_str(&mut r)?.map(Into::into);
            let material_info_len = r.read_u32()? as usize;
            let compressed_material_info = r.read_bytes(material_info_len)?.to_vec();
            let mut chunk = LodChunk::new(IVec3::new(x, y, z));
            chunk.combined_mesh_url = combined_mesh_url;
            chunk.combined_array_texture_url = combined_array_texture_url;
            chunk.compressed_material_info = compressed_material_info;
            chunk.needs_rebuild = false;
            world.insert_lod_chunk(chunk);
        }

        message_id::MAP_TILES_RESULT => {
            let count = r.read_u32()?;
            let mut tile_urls = Vec::with_capacity(count as usize);
            for _ in 0..count {
                tile_urls.push(r.read_string()?);
            }
            let _ = tx.send(ForegroundMessage::MapTilesResult { tile_urls });
        }

        message_id::TIME_SYNC_MESSAGE => {
            let server_time = r.read_f64()?;
            world.update_with_global_time_received(server_time, Instant::now());
        }

        message_id::KEEP_ALIVE => {
            let _ = tx.send(ForegroundMessage::KeepAlive);
        }

        message_id::LOGGED_IN_MESSAGE => {
            let user_id = Uid(r.read_u64()?);
            let flags = r.read_u32()?;
            let username = r.read_string()?;
            let _ = tx.send(ForegroundMessage::LoggedIn { user_id, flags, username });
        }
        message_id::LOGGED_OUT_MESSAGE => {
            let _ = tx.send(ForegroundMessage::LoggedOut);
        }
        message_id::SIGNED_UP_MESSAGE => {
            let user_id = Uid(r.read_u64()?);
            let _ = tx.send(ForegroundMessage::SignedUp { user_id });
        }

        message_id::CHANGE_TO_DIFFERENT_WORLD => {
            let new_world_name = r.read_string()?;
            let _ = tx.send(ForegroundMessage::ChangeToDifferentWorld { new_world_name });
        }

        message_id::INFO_MESSAGE => {
            let _ = tx.send(ForegroundMessage::Info(r.read_string()?));
        }
        message_id::ERROR_MESSAGE => {
            let _ = tx.send(ForegroundMessage::Error(r.read_string()?));
        }
        message_id::SERVER_ADMIN_MESSAGE => {
            let _ = tx.send(ForegroundMessage::ServerAdmin(r.read_string()?));
        }

        message_id::NEW_RESOURCE_ON_SERVER => {
            let url = r.read_string()?;
            let _ = tx.send(ForegroundMessage::ResourceDownloadedOnServer { url });
        }

        other => {
            trace!("receiver: ignoring unknown/forward-compatible message type {other}");
        }
    }

    Ok(())
}

fn read_parcel(r: &mut Reader) -> Result<Parcel, NetError> {
    let id = ParcelId(r.read_u32()?);
    let aabb_min = r.read_vec3_f64()?;
    let aabb_max = r.read_vec3_f64()?;
    let flags = r.read_u32()?;
    let num_writer_ids = r.read_u32()?;
    let mut writer_ids = Vec::with_capacity(num_writer_ids as usize);
    for _ in 0..num_writer_ids {
        writer_ids.push(Uid(r.read_u64()?));
    }
    let spawn_point = if r.read_bool()? {
        Some(r.read_vec3_f64()?)
    } else {
        None
    };
    let title = r.read_string()?;
    Ok(Parcel {
        id,
        aabb_min,
        aabb_max,
        flags,
        writer_ids,
        spawn_point,
        title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use substrata_protocol::url_string::UrlString;
    use substrata_protocol::wire::Writer;

    fn sample_object(uid: u64) -> WorldObject {
        WorldObject::new(Uid(uid), Uid(0), DVec3::new(1.0, 2.0, 3.0), UrlString::new("a_1.bmesh"))
    }

    // P7: decompressing and parsing an ObjectInitialSendCompressed frame
    // produces the same multiset of objects as individual ObjectInitialSend
    // frames would.
    #[test]
    fn compressed_initial_send_round_trips_p7() {
        let objects = vec![sample_object(1), sample_object(2), sample_object(3)];

        let mut plain = Vec::new();
        for ob in &objects {
            let bytes = ob.write_to_bytes();
            let mut w = Writer::new();
            w.write_u32(bytes.len() as u32);
            w.write_bytes(&bytes);
            plain.extend_from_slice(&w.into_bytes());
        }
        let compressed = zstd::stream::encode_all(&plain[..], 0).unwrap();

        let parsed = parse_compressed_object_batch(&compressed).unwrap();
        assert_eq!(parsed.len(), objects.len());
        for (original, restored) in objects.iter().zip(parsed.iter()) {
            assert_eq!(original.uid, restored.uid);
            assert_eq!(original.pos, restored.pos);
            assert_eq!(original.model_url, restored.model_url);
        }
    }
}
