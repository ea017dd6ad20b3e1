//! Replays a JSON gesture script and prints what the core did.

mod script;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "freedraw-replay")]
#[command(about = "Replay a gesture script against an in-memory page store")]
struct Args {
    /// Gesture script to replay
    script: PathBuf,

    /// Print the final store as JSON instead of a per-page summary
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    log::info!("Replaying {}", args.script.display());
    let replay = match script::Script::load(&args.script).and_then(|s| script::run(&s)) {
        Ok(replay) => replay,
        Err(e) => {
            log::error!("Replay failed: {}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    for entry in &replay.log {
        println!("#{} {:?}", entry.index, entry.step);
        for event in &entry.events {
            println!("    {}", script::describe(event));
        }
    }

    if args.json {
        match replay.store.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize store: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for page in replay.store.pages() {
            println!("page {}:", page);
            for line in script::summarize(&replay.store, page) {
                println!("    {}", line);
            }
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_script_and_flag() {
        let args = Args::try_parse_from(["freedraw-replay", "demo.json", "--json"]).unwrap();
        assert_eq!(args.script, PathBuf::from("demo.json"));
        assert!(args.json);

        let args = Args::try_parse_from(["freedraw-replay", "demo.json"]).unwrap();
        assert!(!args.json);
    }

    #[test]
    fn test_args_reject_unknown_flag_and_missing_script() {
        assert!(Args::try_parse_from(["freedraw-replay", "demo.json", "--jsn"]).is_err());
        assert!(Args::try_parse_from(["freedraw-replay"]).is_err());
    }
}
