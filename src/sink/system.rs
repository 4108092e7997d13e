use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{OutputCallbackInfo, Sample, SampleFormat, SampleRate, Stream, StreamConfig};
use rb::{RbConsumer, RbProducer, RB};

// how long to wait for the device to drain when the ring is full
const FULL_RING_POLL: Duration = Duration::from_micros(500);

pub struct System {
    samplerate: f32,
    _stream: Stream,
    _buffer: rb::SpscRb<i16>,
    tx: rb::Producer<i16>,
    failed: Arc<AtomicBool>,
}

struct AudioThread {
    rx: rb::Consumer<i16>,
    buffer: Vec<i16>,
    channels: usize,
}

impl System {
    pub fn open(samplerate: u32, bufsize: usize) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("could not find default output device"))?;
        let supported = device.supported_output_configs()?;
        let range = supported
            .filter(|c| c.min_sample_rate().0 <= samplerate && samplerate <= c.max_sample_rate().0)
            .min_by_key(|c| c.channels())
            .ok_or_else(|| anyhow::anyhow!("no output configuration supports {} Hz", samplerate))?;
        let sample_format = range.sample_format();
        let mut config: StreamConfig = range.with_max_sample_rate().into();
        config.sample_rate = SampleRate(samplerate);

        let buffer = rb::SpscRb::new(bufsize);
        let tx = buffer.producer();
        let rx = buffer.consumer();
        let mut thread = AudioThread {
            rx,
            buffer: vec![],
            channels: config.channels as usize,
        };

        let failed = Arc::new(AtomicBool::new(false));
        let flag = failed.clone();
        let err_fn = move |err| {
            eprintln!("audio stream error: {}", err);
            flag.store(true, Ordering::Release);
        };

        let stream = match sample_format {
            SampleFormat::F32 => device.build_output_stream(
                &config,
                move |d, cb| thread.callback::<f32>(d, cb),
                err_fn,
            ),
            SampleFormat::I16 => device.build_output_stream(
                &config,
                move |d, cb| thread.callback::<i16>(d, cb),
                err_fn,
            ),
            SampleFormat::U16 => device.build_output_stream(
                &config,
                move |d, cb| thread.callback::<u16>(d, cb),
                err_fn,
            ),
        }?;
        stream.play()?;

        Ok(Self {
            samplerate: samplerate as f32,
            _stream: stream,
            _buffer: buffer,
            tx,
            failed,
        })
    }
}

impl AudioThread {
    pub fn callback<T>(&mut self, data: &mut [T], _: &OutputCallbackInfo)
    where
        T: Sample,
    {
        // never block here: take what the ring has and pad with silence,
        // otherwise dropping the stream could hang against this callback
        let frames = data.len() / self.channels;
        if self.buffer.len() < frames {
            self.buffer.resize(frames, 0);
        }
        let got = self.rx.read(&mut self.buffer[..frames]).unwrap_or(0);
        for value in self.buffer[got..frames].iter_mut() {
            *value = 0;
        }

        // mono signal, duplicated across whatever channels the device has
        for (frame, value) in data.chunks_mut(self.channels).zip(self.buffer[..frames].iter()) {
            for sample in frame.iter_mut() {
                *sample = Sample::from(value);
            }
        }
    }
}

impl super::Sink for System {
    fn samplerate(&self) -> f32 {
        self.samplerate
    }

    fn channels(&self) -> u16 {
        1
    }

    fn write(&mut self, mut buffer: &[i16]) -> anyhow::Result<()> {
        while !buffer.is_empty() {
            if self.failed.load(Ordering::Acquire) {
                anyhow::bail!("audio stream failed");
            }
            match self.tx.write(buffer) {
                Ok(0) | Err(_) => std::thread::sleep(FULL_RING_POLL),
                Ok(count) => buffer = &buffer[count..],
            }
        }
        Ok(())
    }
}
