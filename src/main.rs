use std::process::ExitCode;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;

use kokoro_bridge::cli::{usage_message, Cli};
use kokoro_bridge::engines::kokoro::KokoroEngine;
use kokoro_bridge::{bridge, Error, SynthesisEngine};

fn main() -> ExitCode {
    // stderr carries the one-line failure diagnostic, so logging stays silent
    // unless RUST_LOG asks for it.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            // Printing help only fails if stdout is gone; nothing left to report then.
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => return report(Error::Usage(usage_message(&err))),
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(err),
    }
}

fn run(cli: Cli) -> kokoro_bridge::Result<()> {
    let request = cli.request()?;

    log::info!(
        "Bridge startup: voice={}, model={}, voices={}",
        request.voice(),
        cli.model.display(),
        cli.voices.display()
    );

    let mut engine = KokoroEngine::with_espeak(cli.espeak_config());
    let load_start = Instant::now();
    engine.load_model_with_params(&cli.model, &cli.voices, cli.model_params())?;
    log::info!("Model loaded in {:.2?}", load_start.elapsed());

    let written = bridge::run(&mut engine, &request, std::io::stdout().lock())?;
    log::info!("Streamed {written} bytes of WAV");
    Ok(())
}

fn report(err: Error) -> ExitCode {
    eprintln!("{}", err.diagnostic());
    ExitCode::from(1)
}
