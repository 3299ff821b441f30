//! aimpctl - control a running AIMP from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use aimp_remote::{AimpClient, CliCommand, ClientConfig};

fn program_name(args: &[String]) -> &str {
  args.first().map_or("aimpctl", String::as_str)
}

fn print_usage(program: &str) {
  eprintln!("Usage:");
  eprintln!("  {} status                 # playback state, position, volume", program);
  eprintln!("  {} info                   # current track as JSON", program);
  eprintln!("  {} version", program);
  eprintln!("  {} play|play-pause|pause|stop|next|prev|quit", program);
  eprintln!("  {} volume [percent]", program);
  eprintln!("  {} seek <ms>", program);
  eprintln!("  {} mute|repeat|shuffle|record on|off", program);
  eprintln!("  {} album-art <output>     # extension added from image type", program);
  eprintln!("  {} add-play|bookmark|dir|file|insert|queue <path>", program);
}

#[cfg(windows)]
fn connect(config: ClientConfig) -> Result<AimpClient, String> {
  AimpClient::connect_native(config).map_err(|e| e.to_string())
}

#[cfg(not(windows))]
fn connect(_config: ClientConfig) -> Result<AimpClient, String> {
  Err(format!(
    "Unsupported platform ({}): the AIMP remote API is only available on Windows",
    std::env::consts::OS
  ))
}

fn parse_switch(value: Option<&String>) -> Result<bool, String> {
  match value.map(String::as_str) {
    Some("on") | Some("true") | Some("1") => Ok(true),
    Some("off") | Some("false") | Some("0") => Ok(false),
    other => Err(format!("Expected on|off, got {:?}", other)),
  }
}

fn parse_number(value: Option<&String>, what: &str) -> Result<u32, String> {
  value
    .ok_or_else(|| format!("Missing {}", what))?
    .parse()
    .map_err(|e| format!("Invalid {}: {}", what, e))
}

fn format_ms(ms: u32) -> String {
  let seconds = ms / 1000;
  format!("{}:{:02}", seconds / 60, seconds % 60)
}

async fn run(client: &AimpClient, command: &str, args: &[String]) -> Result<(), String> {
  match command {
    "status" => {
      println!("State:    {}", client.playback_state());
      println!(
        "Position: {} / {}",
        format_ms(client.position()),
        format_ms(client.duration())
      );
      println!(
        "Volume:   {}%{}",
        client.volume(),
        if client.is_muted() { " (muted)" } else { "" }
      );
      println!("Repeat:   {}", client.is_track_repeated());
      println!("Shuffle:  {}", client.is_shuffled());
    }
    "info" => {
      let track = client.read_track_metadata().map_err(|e| e.to_string())?;
      let json = serde_json::to_string_pretty(&track).map_err(|e| e.to_string())?;
      println!("{}", json);
    }
    "version" => match client.version() {
      Some(version) => println!("AIMP {}", version),
      None => println!("AIMP version unavailable"),
    },
    "play" => client.play(),
    "play-pause" => client.play_pause(),
    "pause" => client.pause(),
    "stop" => client.stop(),
    "next" => client.next(),
    "prev" => client.prev(),
    "quit" => client.quit(),
    "volume" => match args.first() {
      Some(_) => client.set_volume(parse_number(args.first(), "volume")?.min(100)),
      None => println!("{}", client.volume()),
    },
    "seek" => client.set_position(parse_number(args.first(), "position")?),
    "mute" => client.set_muted(parse_switch(args.first())?),
    "repeat" => client.set_track_repeated(parse_switch(args.first())?),
    "shuffle" => client.set_shuffled(parse_switch(args.first())?),
    "record" => client.set_recording(parse_switch(args.first())?),
    "album-art" => {
      let output = args.first().ok_or("Missing output path")?;
      let art = client.fetch_album_art().await.map_err(|e| e.to_string())?;
      let mut path = PathBuf::from(output);
      if path.extension().is_none() {
        if let Some(ext) = art.extension() {
          path.set_extension(ext);
        }
      }
      std::fs::write(&path, &art.data).map_err(|e| e.to_string())?;
      println!("Saved {} bytes to {}", art.data.len(), path.display());
    }
    other => {
      let cli = CliCommand::parse(other).ok_or_else(|| format!("Unknown command: {}", other))?;
      let argument = args.first().ok_or("Missing path")?;
      client.run_cli(cli, argument).map_err(|e| e.to_string())?;
    }
  }
  Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let args: Vec<String> = std::env::args().collect();
  if args.len() < 2 {
    print_usage(program_name(&args));
    return ExitCode::FAILURE;
  }

  let config = match ClientConfig::load_default() {
    Ok(config) => config,
    Err(e) => {
      log::error!("Failed to load config: {}", e);
      return ExitCode::FAILURE;
    }
  };

  let client = match connect(config) {
    Ok(client) => client,
    Err(e) => {
      log::error!("{}", e);
      return ExitCode::FAILURE;
    }
  };

  match run(&client, &args[1], &args[2..]).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!("{}", e);
      ExitCode::FAILURE
    }
  }
}
