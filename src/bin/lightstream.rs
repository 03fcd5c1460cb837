use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lightstream_rs::cabinet::{identify_cabinet, ConnectedHardware};
use lightstream_rs::config;
use lightstream_rs::host::{self, DeviceInfo};
use lightstream_rs::scheduler::{PlaybackScheduler, SequenceBlender, SuppressCodes, UpdateOutcome};
use lightstream_rs::{Color, Frame, LightSequence, ProtocolVersion, StreamingLightPlayer};

/// Lights per frame in the demo animation.
const LIGHTS: usize = 13;
/// Frames in one loop of the demo animation.
const FRAMES: u16 = 120;

/// Slow rainbow wave across the lights.
fn demo_sequence(version: ProtocolVersion, frame_ms: u16) -> LightSequence {
    let speed = 0.1;
    let frames = (0..FRAMES)
        .map(|step| {
            let t = f32::from(step) * speed;
            let lights = (0..LIGHTS)
                .map(|index| {
                    let i = index as f32;
                    let r = (t + i).sin() * 0.5 + 0.5;
                    let g = (t + i + 2.25).sin() * 0.5 + 0.5;
                    let b = (t + i + 4.5).sin() * 0.5 + 0.5;
                    Color::rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
                })
                .collect();
            Frame::new(frame_ms, lights)
        })
        .collect::<Vec<_>>();
    let (intro, rest) = frames.split_at(frames.len() / 4);
    LightSequence::builder(1, version.number())
        .segment(intro.to_vec())
        .segment(rest.to_vec())
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./lightstream.yaml".to_string());
    let config = if path.ends_with(".json") {
        config::read_config_json(&path)?
    } else {
        config::read_config_yaml(&path)?
    };

    let hardware: ConnectedHardware = config.device.hardware.iter().copied().collect();
    let identification = identify_cabinet(&hardware);
    info!(
        family = ?identification.family,
        found = identification.found,
        "identified cabinet"
    );

    let device = DeviceInfo::new(config.device.name.clone(), config.device.group_count);
    let group = device.group(config.device.group)?;
    let transport = host::open_transport(&config.transport)?;
    let player = StreamingLightPlayer::new(transport, device.name());

    let version = player.negotiated_version()?;
    let frame_ms = config.scheduler.interval_ms.min(u64::from(u16::MAX)) as u16;
    let sequence = Arc::new(demo_sequence(version, frame_ms));
    info!(
        device = device.name(),
        %group,
        version = version.number(),
        frames = sequence.frame_count(),
        "starting playback"
    );

    let blender = SequenceBlender::new(sequence, config.scheduler.frames_per_update)
        .looping(config.scheduler.max_updates.is_some());
    let mut scheduler = PlaybackScheduler::new(player, group, blender)
        .with_filter(SuppressCodes::new(config.scheduler.suppress.clone()))
        .with_chunk_budget(config.scheduler.chunk_budget);

    if let Some(feature_id) = config.device.feature_id {
        if !scheduler.device_acquired(feature_id)? {
            info!(feature_id, "transport has no device recovery");
        }
    }

    let interval = Duration::from_millis(config.scheduler.interval_ms);
    let mut updates = 0u64;
    loop {
        if config.scheduler.max_updates.map_or(false, |max| updates >= max) {
            break;
        }
        match scheduler.update_device(false) {
            Ok(UpdateOutcome::Finished) => {
                info!(updates, "sequence finished");
                break;
            }
            Ok(UpdateOutcome::Suppressed) => warn!("device busy, playback suspended"),
            Ok(_) => {}
            Err(err) => error!(%err, "device update failed"),
        }
        updates += 1;
        thread::sleep(interval);
    }

    scheduler.shutdown();
    Ok(())
}
