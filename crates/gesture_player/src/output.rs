//! 音频输出（cpal）
//!
//! 播放线程把解码好的采样块送进有界通道，输出回调直接从通道取数据；
//! 通道满时由播放线程保留待发送的块，不丢数据。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// 音频输出错误
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("No output device available")]
    NoDevice,
    #[error("No supported config for {channels} ch @ {sample_rate} Hz")]
    NoConfig { channels: u16, sample_rate: u32 },
    #[error("Stream error: {0}")]
    Stream(String),
}

/// 输出参数
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// 通道中最多排队的采样块数
    pub queue_blocks: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            queue_blocks: 32,
        }
    }
}

/// 播放线程一侧看到的输出端
pub trait SampleQueue {
    /// 尝试送入一块采样；队列已满时原样退回
    fn write(&self, samples: Vec<f32>) -> Result<(), Vec<f32>>;
    fn set_playing(&self, playing: bool);
    /// 送入的采样是否已全部输出
    fn is_drained(&self) -> bool;
}

/// 一条打开的输出流，析构时释放设备
pub struct AudioOutput {
    _stream: Stream,
    sample_tx: Sender<Vec<f32>>,
    is_playing: Arc<AtomicBool>,
    /// 已送入但还没被回调输出的采样数（含回调手里的残余）
    in_flight: Arc<AtomicUsize>,
}

impl AudioOutput {
    /// 在默认输出设备上打开
    pub fn open(config: OutputConfig) -> Result<Self, OutputError> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(OutputError::NoDevice)?;
        Self::with_device(&device, config)
    }

    pub fn with_device(device: &Device, config: OutputConfig) -> Result<Self, OutputError> {
        let stream_config = pick_stream_config(device, &config)?;

        let (sample_tx, sample_rx) = bounded::<Vec<f32>>(config.queue_blocks.max(1));
        let is_playing = Arc::new(AtomicBool::new(false));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut feeder = Feeder {
            rx: sample_rx,
            pending: VecDeque::new(),
            is_playing: is_playing.clone(),
            in_flight: in_flight.clone(),
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| feeder.fill(data),
                |err| log::error!("audio output error: {}", err),
                None,
            )
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        stream.play().map_err(|e| OutputError::Stream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            sample_tx,
            is_playing,
            in_flight,
        })
    }
}

impl SampleQueue for AudioOutput {
    fn write(&self, samples: Vec<f32>) -> Result<(), Vec<f32>> {
        // 先计数再发送，回调不会先于计数把它减掉
        let len = samples.len();
        self.in_flight.fetch_add(len, Ordering::AcqRel);
        match self.sample_tx.try_send(samples) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(samples)) | Err(TrySendError::Disconnected(samples)) => {
                self.in_flight.fetch_sub(len, Ordering::AcqRel);
                Err(samples)
            }
        }
    }

    fn set_playing(&self, playing: bool) {
        self.is_playing.store(playing, Ordering::Relaxed);
    }

    fn is_drained(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) == 0
    }
}

fn pick_stream_config(device: &Device, config: &OutputConfig) -> Result<StreamConfig, OutputError> {
    let no_config = || OutputError::NoConfig {
        channels: config.channels,
        sample_rate: config.sample_rate,
    };

    let supported = device
        .supported_output_configs()
        .map_err(|e| OutputError::Stream(e.to_string()))?
        .find(|c| {
            c.channels() == config.channels
                && c.min_sample_rate().0 <= config.sample_rate
                && c.max_sample_rate().0 >= config.sample_rate
                && c.sample_format() == SampleFormat::F32
        })
        .ok_or_else(no_config)?;

    Ok(supported
        .with_sample_rate(cpal::SampleRate(config.sample_rate))
        .into())
}

/// 输出回调侧的状态
struct Feeder {
    rx: Receiver<Vec<f32>>,
    pending: VecDeque<f32>,
    is_playing: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
}

impl Feeder {
    fn fill(&mut self, data: &mut [f32]) {
        if !self.is_playing.load(Ordering::Relaxed) {
            data.fill(0.0);
            return;
        }

        let mut written = 0;
        while written < data.len() {
            if self.pending.is_empty() {
                match self.rx.try_recv() {
                    Ok(block) => self.pending.extend(block),
                    Err(_) => break,
                }
            }
            let n = (data.len() - written).min(self.pending.len());
            for (slot, sample) in data[written..written + n].iter_mut().zip(self.pending.drain(..n)) {
                *slot = sample;
            }
            written += n;
        }

        // 数据不够时补静音
        data[written..].fill(0.0);
        self.in_flight.fetch_sub(written, Ordering::AcqRel);
    }
}
