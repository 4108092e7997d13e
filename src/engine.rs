use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use crate::{Params, Sink};

type Opener = dyn Fn() -> anyhow::Result<Box<dyn Sink>> + Send + Sync;

pub struct Engine {
    params: Arc<Params>,
    playing: Arc<AtomicBool>,
    error: Arc<Mutex<Option<anyhow::Error>>>,
    opener: Arc<Opener>,
    worker: Option<thread::JoinHandle<()>>,
    samplerate: u32,
    bufsize: usize,
}

impl Engine {
    pub fn new(samplerate: u32, bufsize: usize) -> Self {
        Self::with_sink(samplerate, bufsize, move || {
            Ok(Box::new(crate::sink::System::open(samplerate, bufsize)?) as Box<dyn Sink>)
        })
    }

    pub fn with_sink<F>(samplerate: u32, bufsize: usize, opener: F) -> Self
    where
        F: Fn() -> anyhow::Result<Box<dyn Sink>> + Send + Sync + 'static,
    {
        Self {
            params: Arc::new(Params::new(440.0, 1.0)),
            playing: Arc::new(AtomicBool::new(false)),
            error: Arc::new(Mutex::new(None)),
            opener: Arc::new(opener),
            worker: None,
            samplerate,
            bufsize,
        }
    }

    pub fn start(&mut self) -> anyhow::Result<()> {
        if self.playing.load(Ordering::Acquire) {
            return Ok(());
        }

        // a session that died on a write error leaves a finished worker
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.error.lock().unwrap().take();

        let opener = self.opener.clone();
        let params = self.params.clone();
        let playing = self.playing.clone();
        let error = self.error.clone();
        let bufsize = self.bufsize;
        let (ready_tx, ready_rx) = mpsc::channel();

        // the sink is opened on the generation thread itself, since audio
        // streams must stay on the thread that drives them; the channel
        // hands the open result back before the loop begins
        let worker = thread::spawn(move || {
            let mut sink = match opener() {
                Ok(sink) => sink,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            playing.store(true, Ordering::Release);
            let _ = ready_tx.send(Ok(()));

            if let Err(e) = run(&mut *sink, &params, &playing, bufsize) {
                error.lock().unwrap().replace(e);
            }
            playing.store(false, Ordering::Release);
            // sink drops here, releasing the output device
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(worker);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                anyhow::bail!("audio thread died while opening the output")
            }
        }
    }

    pub fn stop(&mut self) {
        self.playing.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn set_frequency(&self, frequency: f32) -> anyhow::Result<()> {
        let nyquist = self.samplerate as f32 / 2.0;
        if !frequency.is_finite() || frequency <= 0.0 || frequency >= nyquist {
            anyhow::bail!(
                "frequency must be between 0 and {} Hz, got {}",
                nyquist,
                frequency
            );
        }
        self.params.set_frequency(frequency);
        Ok(())
    }

    pub fn set_amplitude(&self, amplitude: f32) -> anyhow::Result<()> {
        if !amplitude.is_finite() {
            anyhow::bail!("amplitude must be finite, got {}", amplitude);
        }
        self.params.set_amplitude(amplitude.clamp(0.0, 1.0));
        Ok(())
    }

    pub fn set_mute(&self, mute: bool) {
        self.params.set_mute(mute);
    }

    pub fn muted(&self) -> bool {
        self.params.mute()
    }

    pub fn frequency(&self) -> f32 {
        self.params.frequency()
    }

    pub fn amplitude(&self) -> f32 {
        self.params.amplitude()
    }

    pub fn take_error(&self) -> Option<anyhow::Error> {
        self.error.lock().unwrap().take()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    sink: &mut dyn Sink,
    params: &Params,
    playing: &AtomicBool,
    bufsize: usize,
) -> anyhow::Result<()> {
    let samplerate = sink.samplerate();
    let mut buffer = vec![0i16; bufsize];
    let mut phase = 0.0f64;

    while playing.load(Ordering::Acquire) {
        // parameters are sampled once per buffer, so an update is audible
        // one fill later at the latest
        let frequency = params.frequency();
        let amplitude = params.effective_amplitude();
        phase = crate::synth::fill(&mut buffer, phase, frequency, amplitude, samplerate);
        sink.write(&buffer)?;
    }
    Ok(())
}
