use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::assoc::{FinalMapping, FrameGroup};
use crate::error::Error;

/// The mapping as a flat JSON object, e.g. `{"0": 1, "1": 0}`.
pub fn mapping_to_json(mapping: &FinalMapping) -> Result<serde_json::Value, Error> {
    Ok(serde_json::to_value(mapping)?)
}

/// Write the mapping to `path` and echo it to the log for the operator.
pub fn write_mapping<P: AsRef<Path>>(path: P, mapping: &FinalMapping) -> Result<(), Error> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);

    serde_json::to_writer(&mut writer, mapping)?;
    writer.flush()?;

    echo(mapping);
    info!("mapping written to {}", path.display());

    Ok(())
}

/// Human-readable echo of the secondary -> primary mapping.
pub fn echo(mapping: &FinalMapping) {
    if mapping.is_empty() {
        info!("secondary to primary player id mapping is empty (no frames matched)");
    } else {
        info!("secondary to primary player id mapping: {}", mapping);
    }
}

/// Write one view's detections in the single-view tracker's input format.
///
/// One line per detection: `frame,x,y,width,height,confidence,class` with a
/// 1-based frame index, frames ascending and per-frame order preserved.
pub fn write_tracker_log<W: Write>(mut writer: W, group: &FrameGroup) -> Result<(), Error> {
    for (frame, dets) in group.iter() {
        for det in dets {
            let bbox = det.bbox.as_ltwh();

            writeln!(
                writer,
                "{},{},{},{},{},{},{}",
                frame + 1,
                bbox.left(),
                bbox.top(),
                bbox.width(),
                bbox.height(),
                det.confidence,
                det.class,
            )?;
        }
    }

    writer.flush()?;

    Ok(())
}
