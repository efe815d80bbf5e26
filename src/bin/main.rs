use crossterm::{
    cursor::MoveTo,
    execute,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use phrase_core::{EngineConfig, PhraseEngine, Utterance};
use std::env;
use std::io::{self, stdin, stdout, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: phrase_sim [RULES.json] [--config CONFIG.json]";

fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{}\n{}", msg, USAGE);
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut engine = match PhraseEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Could not load rules: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&mut engine) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Terminal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<EngineConfig, String> {
    let mut args = env::args().skip(1);
    let mut config = EngineConfig::default();
    let mut rules_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                config = EngineConfig::from_file(Path::new(&path)).map_err(|e| e.to_string())?;
            }
            "-h" | "--help" => return Err(String::new()),
            other => rules_path = Some(PathBuf::from(other)),
        }
    }
    if rules_path.is_some() {
        config.rules_path = rules_path;
    }
    if config.snapshot_path.is_none() && config.rules_path.is_none() {
        config.snapshot_path = EngineConfig::default_snapshot_path().filter(|p| p.exists());
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn run(engine: &mut PhraseEngine) -> io::Result<()> {
    let mut last: Option<Utterance> = None;

    loop {
        print_ui(engine, last.as_ref())?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let cmd = input.trim();

        match cmd {
            "exit" => break,
            "" => {}
            ":play" => {
                let phrase = engine.complete();
                println!("\n{} {}", "Speaking:".bold().green(), phrase.tts);
                println!("(press Enter)");
                stdin().read_line(&mut String::new())?;
                last = None;
            }
            ":undo" => {
                engine.undo();
                last = None;
            }
            ":reset" => {
                engine.reset();
                last = None;
            }
            tap => {
                // `cellId` or `cellId=text`
                let (id, text) = tap.split_once('=').unwrap_or((tap, tap));
                last = engine.select(id.trim(), text.trim());
            }
        }
    }
    Ok(())
}

fn print_ui(engine: &PhraseEngine, last: Option<&Utterance>) -> io::Result<()> {
    let mut out = stdout();
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    writeln!(out, "{}", "AAC Phrase Simulator".bold())?;
    writeln!(out, "---------------------------------------------------------------")?;
    writeln!(out, "Tap with 'cellId' or 'cellId=text'. ':play' speaks and clears,")?;
    writeln!(out, "':undo', ':reset'. 'exit' to quit.")?;
    writeln!(out, "Compounds loaded: {}\n", engine.rules().len())?;

    if let Some(u) = last {
        let source = match &u.compound {
            Some(id) => format!("compound '{}'", id).cyan().to_string(),
            None => "raw text".dark_grey().to_string(),
        };
        writeln!(out, "Last tap says: {} [{}]", u.tts.clone().green(), source)?;
    }

    let phrase = engine.play_all();
    writeln!(out, "\nPhrase:  [{}]", phrase.display)?;
    writeln!(out, "Speaks:  [{}]", phrase.tts)?;
    write!(out, "\n> ")?;
    out.flush()
}
