use anyhow::Context;
use ffmpeg_next::media::Type;
use std::{path::Path, sync::Once};

static FFMPEG_INIT: Once = Once::new();

/// Length in seconds of the best video stream of `path`, falling back to the
/// container duration when the stream does not carry one.
pub fn probe_duration(path: &Path) -> anyhow::Result<f64> {
    FFMPEG_INIT.call_once(|| {
        if let Err(err) = ffmpeg_next::init() {
            log::error!("failed to initialize ffmpeg: {err}");
        }
    });

    let input_ctx = ffmpeg_next::format::input(&path)
        .context("failed to get input format context for file from ffmpeg")?;
    let stream = input_ctx
        .streams()
        .best(Type::Video)
        .context("failed to locate video stream")?;

    let stream_duration = stream.duration() as f64 * f64::from(stream.time_base());
    if stream_duration > 0.0 {
        return Ok(stream_duration);
    }

    let container_duration =
        input_ctx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE);
    anyhow::ensure!(
        container_duration > 0.0,
        "no duration reported for \"{}\"",
        path.display()
    );
    Ok(container_duration)
}
