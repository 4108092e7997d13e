use std::io::BufRead;
use std::time::Duration;

use clap::clap_app;

const SAMPLERATE: u32 = 44100;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let matches = clap_app!(
        siggen =>
            (@arg FREQUENCY: -f --frequency +takes_value "tone frequency in hertz")
            (@arg LEVEL: -l --level +takes_value "output level in dBFS, -80 to 0")
            (@arg DURATION: -d --duration +takes_value "play for this many seconds, then exit")
            (@arg BUFSIZE: -b --bufsize +takes_value "samples generated per buffer")
    )
    .get_matches();

    let frequency: f32 = matches.value_of("FREQUENCY").unwrap_or("440").parse()?;
    let level: f32 = matches.value_of("LEVEL").unwrap_or("0").parse()?;
    let bufsize: usize = matches.value_of("BUFSIZE").unwrap_or("4096").parse()?;

    let mut engine = siggen::Engine::new(SAMPLERATE, bufsize);
    engine.set_frequency(frequency)?;
    engine.set_amplitude(siggen::db_to_amplitude(level))?;
    engine.start()?;
    status(&engine);

    if let Some(duration) = matches.value_of("DURATION") {
        let seconds: f32 = duration.parse()?;
        if !seconds.is_finite() || seconds < 0.0 {
            anyhow::bail!("duration must be a non-negative number of seconds");
        }
        std::thread::sleep(Duration::from_secs_f32(seconds));
    } else {
        control(&engine)?;
    }

    engine.stop();
    if let Some(e) = engine.take_error() {
        return Err(e);
    }
    Ok(())
}

// the interactive side of the readout: adjust the tone while it plays
fn control(engine: &siggen::Engine) -> anyhow::Result<()> {
    println!("commands: f <hz>, l <dbfs>, m (mute), q (quit)");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("f"), Some(value)) => match value.parse() {
                Ok(hz) => {
                    if let Err(e) = engine.set_frequency(hz) {
                        eprintln!("{}", e);
                    }
                }
                Err(e) => eprintln!("bad frequency: {}", e),
            },
            (Some("l"), Some(value)) => match value.parse() {
                Ok(db) => {
                    if let Err(e) = engine.set_amplitude(siggen::db_to_amplitude(db)) {
                        eprintln!("{}", e);
                    }
                }
                Err(e) => eprintln!("bad level: {}", e),
            },
            (Some("m"), None) => engine.set_mute(!engine.muted()),
            (Some("q"), None) => break,
            (None, _) => continue,
            (Some(command), _) => {
                eprintln!("unknown command: {}", command);
                continue;
            }
        }
        status(engine);
        if !engine.is_playing() {
            break;
        }
    }
    Ok(())
}

fn status(engine: &siggen::Engine) {
    println!(
        "{:.2} Hz  {:.1} dBFS{}",
        engine.frequency(),
        siggen::amplitude_to_db(engine.amplitude()),
        if engine.muted() { "  (muted)" } else { "" }
    );
}
