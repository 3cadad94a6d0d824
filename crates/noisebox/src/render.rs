//! Offline rendering to memory and to 8-bit WAV files.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use noisebox_core::{Engine, Selector};
use std::path::Path;

/// Mono unsigned 8-bit at `sample_rate`, the format the engine emits.
pub fn wav_spec(sample_rate: u32) -> WavSpec {
  WavSpec {
    channels: 1,
    sample_rate,
    bits_per_sample: 8,
    sample_format: SampleFormat::Int,
  }
}

/// hound takes 8-bit samples as signed and stores them offset by 128.
#[inline]
pub(crate) fn to_wav_sample(sample: u8) -> i8 {
  sample.wrapping_sub(128) as i8
}

/// Advance `selector` by `count` samples.
pub fn render_samples(
  engine: &mut Engine,
  selector: Selector,
  master_gain: f32,
  count: usize,
) -> Vec<u8> {
  profiling::scope!("render_samples");
  (0..count)
    .map(|_| engine.produce(selector, master_gain))
    .collect()
}

pub fn write_wav(path: impl AsRef<Path>, samples: &[u8], sample_rate: u32) -> Result<()> {
  let path = path.as_ref();
  let mut writer = WavWriter::create(path, wav_spec(sample_rate))
    .with_context(|| format!("failed to create {}", path.display()))?;
  for &s in samples {
    writer.write_sample(to_wav_sample(s))?;
  }
  writer
    .finalize()
    .with_context(|| format!("failed to finalize {}", path.display()))?;
  Ok(())
}

/// Read an 8-bit mono WAV back into engine samples.
pub fn read_wav(path: impl AsRef<Path>) -> Result<(u32, Vec<u8>)> {
  let path = path.as_ref();
  let mut reader =
    WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
  let spec = reader.spec();
  if spec.bits_per_sample != 8 || spec.channels != 1 {
    anyhow::bail!(
      "{} is {}-bit with {} channels, expected 8-bit mono",
      path.display(),
      spec.bits_per_sample,
      spec.channels
    );
  }
  let samples = reader
    .samples::<i8>()
    .map(|s| s.map(|v| (v as u8).wrapping_add(128)))
    .collect::<Result<Vec<_>, _>>()?;
  Ok((spec.sample_rate, samples))
}

/// Render `seconds` of `selector` at the engine's rate and write it to
/// `path`. Returns the number of samples written.
pub fn render_to_wav(
  engine: &mut Engine,
  selector: Selector,
  master_gain: f32,
  seconds: f32,
  path: impl AsRef<Path>,
) -> Result<usize> {
  if !(seconds.is_finite() && seconds >= 0.0) {
    anyhow::bail!("render length must be a non-negative number of seconds, got {seconds}");
  }
  let count = (seconds * engine.sample_rate() as f32).round() as usize;
  let samples = render_samples(engine, selector, master_gain, count);
  write_wav(&path, &samples, engine.sample_rate())?;
  tracing::info!(
    selector = %selector,
    samples = count,
    path = %path.as_ref().display(),
    "rendered"
  );
  Ok(count)
}
