use std::{fs, io};
use std::io::{Read, Write};
use std::process::ExitCode;
use log::{error, info};
use localmap::{Config, Server, Session, SessionFile};
use localmap::config::{ConvertConfig, ServeConfig};
use localmap::convert::convert_text;
use localmap::style::Style;


async fn serve(config: ServeConfig) -> Result<(), ()> {
    let (session, style) = match config.session {
        Some(path) => {
            let file = SessionFile::load(&path).map_err(|err| {
                error!(
                    "Failed to load session file {}: {}", path.display(), err
                );
            })?;
            let session = Session::from_source(&file.source).map_err(|err| {
                error!("{}: {}", path.display(), err);
            })?;
            (session, file.style)
        }
        None => {
            let origin = config.origin.unwrap_or_default();
            (Session::new(origin), Style::default())
        }
    };
    info!(
        "Session with origin {} and {} sequences.",
        session.origin(), session.len()
    );

    Server::new(session, style, config.tile_cache).run(config.listen).await
        .map_err(|err| error!("Server error: {}", err))
}

fn convert(config: ConvertConfig) -> Result<(), ()> {
    let text = match config.input {
        Some(ref path) => fs::read_to_string(path).map_err(|err| {
            error!("Failed to read {}: {}", path.display(), err);
        })?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map_err(|err| {
                error!("Failed to read standard input: {}", err);
            })?;
            text
        }
    };
    let res = convert_text(&text, config.origin, config.direction).map_err(
        |err| {
            let source = config.input.as_ref().map(|path| {
                path.display().to_string()
            }).unwrap_or_else(|| "<stdin>".into());
            error!("{}:{}", source, err);
        }
    )?;
    io::stdout().write_all(res.as_bytes()).map_err(|err| {
        error!("Failed to write output: {}", err);
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let config = match Config::get() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE
        }
    };

    let res = match config {
        Config::Serve(config) => serve(config).await,
        Config::Convert(config) => convert(config),
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}
