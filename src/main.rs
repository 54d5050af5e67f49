#[cfg(not(feature = "streaming"))]
fn main() {
    eprintln!(
        "The xa-player CLI requires the \"streaming\" feature. Rebuild with `--features streaming` to enable playback."
    );
}

#[cfg(feature = "streaming")]
mod cli {
    use std::env;
    use std::fs;
    use std::thread;
    use std::time::Duration;

    use anyhow::{bail, Context};

    use cdxa::{wav, AudioDevice, AudioEngine, StreamConfig};

    struct Args {
        path: String,
        filter: Option<(u8, u8)>,
        wav_out: Option<String>,
        list_only: bool,
    }

    fn usage() -> ! {
        eprintln!("Usage: xa-player <file.xa> [--filter FF:CC] [--wav out.wav] [--list]");
        eprintln!();
        eprintln!("  --filter FF:CC  select stream by hex file/channel pair (default: first)");
        eprintln!("  --wav out.wav   export the selected stream instead of playing it");
        eprintln!("  --list          list streams and exit");
        std::process::exit(2);
    }

    fn parse_filter(value: &str) -> anyhow::Result<(u8, u8)> {
        let (file, channel) = value
            .split_once(':')
            .context("filter must look like FF:CC")?;
        Ok((
            u8::from_str_radix(file, 16).context("bad file number")?,
            u8::from_str_radix(channel, 16).context("bad channel number")?,
        ))
    }

    fn parse_args() -> anyhow::Result<Args> {
        let mut args = env::args().skip(1);
        let mut parsed = Args {
            path: String::new(),
            filter: None,
            wav_out: None,
            list_only: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--filter" => {
                    let value = args.next().context("--filter needs a value")?;
                    parsed.filter = Some(parse_filter(&value)?);
                }
                "--wav" => {
                    parsed.wav_out = Some(args.next().context("--wav needs a path")?);
                }
                "--list" => parsed.list_only = true,
                "--help" | "-h" => usage(),
                _ if parsed.path.is_empty() => parsed.path = arg,
                _ => usage(),
            }
        }

        if parsed.path.is_empty() {
            usage();
        }
        Ok(parsed)
    }

    pub fn run() -> anyhow::Result<()> {
        let args = parse_args()?;

        let data = fs::read(&args.path)
            .with_context(|| format!("failed to read '{}'", args.path))?;

        let rate = AudioDevice::preferred_sample_rate();
        let engine = AudioEngine::new(rate);
        engine
            .load(&data)
            .with_context(|| format!("failed to load '{}'", args.path))?;

        if let Some((file, channel)) = args.filter {
            engine.set_filter(file, channel);
        }

        let (selected, streams) = engine.with_mixer(|mixer| {
            let mut streams: Vec<(u16, u32, usize)> = mixer
                .stream()
                .channels()
                .map(|(filter, ch)| (filter, ch.sample_rate, ch.frames()))
                .collect();
            streams.sort_unstable_by_key(|&(filter, ..)| filter);
            (mixer.filter(), streams)
        });

        if streams.is_empty() {
            bail!("'{}' contains no audio streams", args.path);
        }

        println!("{}: {} stream(s)", args.path, streams.len());
        for (filter, sample_rate, frames) in &streams {
            let marker = if *filter == selected { '*' } else { ' ' };
            let seconds = *frames as f32 / *sample_rate as f32;
            println!(" {marker} {filter:04X}  {sample_rate} Hz  {frames} frames ({seconds:.1}s)");
        }

        if args.list_only {
            return Ok(());
        }

        let Some(&(_, sample_rate, frames)) =
            streams.iter().find(|&&(filter, ..)| filter == selected)
        else {
            bail!("stream {selected:04X} not present");
        };

        if let Some(path) = &args.wav_out {
            let pcm = engine.with_mixer(|mixer| {
                mixer
                    .stream()
                    .channel(selected)
                    .map(|ch| ch.pcm.clone())
                    .unwrap_or_default()
            });
            wav::write_pcm(path, &pcm, sample_rate)?;
            println!("wrote {path}");
            return Ok(());
        }

        let device = AudioDevice::open(engine.clone(), StreamConfig::stable(rate))
            .context("failed to open the output device")?;
        engine.play();

        let seconds = frames as f32 / sample_rate as f32;
        println!("playing {selected:04X} for {seconds:.1}s at {rate} Hz output");
        thread::sleep(Duration::from_secs_f32(seconds + 0.5));

        engine.stop();
        drop(device);
        Ok(())
    }
}

#[cfg(feature = "streaming")]
fn main() -> anyhow::Result<()> {
    cli::run()
}
