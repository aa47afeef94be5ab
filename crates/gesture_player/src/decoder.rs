//! 音频解码（symphonia）

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// 解码器错误
#[derive(thiserror::Error, Debug)]
pub enum DecoderError {
    #[error("No supported audio track found")]
    NoTrack,
    #[error("Unsupported codec")]
    UnsupportedCodec,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SymphoniaError> for DecoderError {
    fn from(e: SymphoniaError) -> Self {
        match e {
            SymphoniaError::IoError(io) => DecoderError::Io(io),
            SymphoniaError::Unsupported(_) => DecoderError::UnsupportedCodec,
            other => DecoderError::Decode(other.to_string()),
        }
    }
}

/// 音频流信息
#[derive(Debug, Clone)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration: Option<Duration>,
    pub codec: String,
}

/// 单轨解码器，输出交错 f32 采样
pub struct AudioDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_buf: Option<SampleBuffer<f32>>,
    pub info: AudioInfo,
}

impl AudioDecoder {
    /// 打开音频文件，以扩展名作为格式提示
    pub fn open(path: &Path) -> Result<Self, DecoderError> {
        let file = File::open(path)?;
        let ext = path.extension().and_then(|e| e.to_str());
        Self::new(file, ext)
    }

    pub fn new<S: MediaSource + 'static>(source: S, ext: Option<&str>) -> Result<Self, DecoderError> {
        let mss = MediaSourceStream::new(Box::new(source), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = ext {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecoderError::NoTrack)?;

        let track_id = track.id;
        let params = &track.codec_params;

        let sample_rate = params.sample_rate.unwrap_or(44100);
        let channels = params.channels.map(|c| c.count()).unwrap_or(2);
        let duration = params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / sample_rate as f64));

        let info = AudioInfo {
            sample_rate,
            channels,
            duration,
            codec: format!("{:?}", params.codec),
        };

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|_| DecoderError::UnsupportedCodec)?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_buf: None,
            info,
        })
    }

    /// 解码下一个包；`Ok(None)` 表示到达结尾
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>, DecoderError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                // 坏包跳过
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(e.into()),
            };

            let frames = decoded.capacity();
            let spec = *decoded.spec();
            if self
                .sample_buf
                .as_ref()
                .is_some_and(|buf| buf.capacity() < frames)
            {
                self.sample_buf = None;
            }
            let buf = self
                .sample_buf
                .get_or_insert_with(|| SampleBuffer::new(frames as u64, spec));
            buf.copy_interleaved_ref(decoded);

            return Ok(Some(buf.samples().to_vec()));
        }
    }
}

/// 只读取流信息，用于检查文件能否播放
pub fn probe(path: &Path) -> Result<AudioInfo, DecoderError> {
    AudioDecoder::open(path).map(|d| d.info)
}

/// 生成一段 16-bit 单声道 PCM WAV
#[cfg(test)]
pub(crate) fn wav_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    bytes
}
