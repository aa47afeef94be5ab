//! gesture-player - 手势控制音乐播放器
//!
//! 从录制的关键点帧（或手势脚本）识别手势，控制本地音乐目录的播放。

mod app;
mod check;
mod config;
mod source;

use std::path::PathBuf;

use gesture_core::{DwellEngine, Session};
use gesture_player::{AudioSink, EngineSink, MusicController, Playlist, SilentSink};
use gesture_vision::{GestureClassifier, HandDetector, HeuristicClassifier, ModelClassifier};

use app::{App, LoopOptions, RunStats};
use check::CheckError;
use config::{ClassifierKind, Config, ConfigError};
use source::{LabelScript, RecordedDetector, RecordedFrame, RecordedFrames, RecordedRecognizer};

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 帧输入
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Frames(PathBuf),
    Script(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunArgs {
    config: Option<PathBuf>,
    music: Option<PathBuf>,
    input: Input,
    classifier: Option<ClassifierKind>,
    silent: bool,
    realtime: bool,
    no_autoplay: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Run(RunArgs),
    Check(Option<PathBuf>),
}

fn usage(program: &str) {
    eprintln!("Usage:");
    eprintln!(
        "  {} run [--config F] [--music DIR] (--frames F.jsonl | --script F) \
         [--classifier heuristic|model] [--silent] [--realtime] [--no-autoplay]",
        program
    );
    eprintln!("  {} check [DIR]", program);
    eprintln!();
    eprintln!("Type `q` + Enter to quit while running.");
}

fn parse_args(args: &[String]) -> Result<Command, AppError> {
    let Some(command) = args.first() else {
        return Err(AppError::Usage("missing command".to_string()));
    };

    match command.as_str() {
        "check" => match args.len() {
            1 => Ok(Command::Check(None)),
            2 => Ok(Command::Check(Some(PathBuf::from(&args[1])))),
            _ => Err(AppError::Usage("check takes at most one directory".to_string())),
        },
        "run" => {
            let mut config = None;
            let mut music = None;
            let mut input = None;
            let mut classifier = None;
            let mut silent = false;
            let mut realtime = false;
            let mut no_autoplay = false;

            let mut rest = args[1..].iter();
            while let Some(flag) = rest.next() {
                let mut value = |name: &str| {
                    rest.next()
                        .cloned()
                        .ok_or_else(|| AppError::Usage(format!("{} needs a value", name)))
                };
                match flag.as_str() {
                    "--config" => config = Some(PathBuf::from(value("--config")?)),
                    "--music" => music = Some(PathBuf::from(value("--music")?)),
                    "--frames" => input = Some(Input::Frames(PathBuf::from(value("--frames")?))),
                    "--script" => input = Some(Input::Script(PathBuf::from(value("--script")?))),
                    "--classifier" => {
                        let name = value("--classifier")?;
                        classifier = Some(ClassifierKind::parse(&name).ok_or_else(|| {
                            AppError::Usage(format!("unknown classifier: {}", name))
                        })?);
                    }
                    "--silent" => silent = true,
                    "--realtime" => realtime = true,
                    "--no-autoplay" => no_autoplay = true,
                    other => return Err(AppError::Usage(format!("unknown option: {}", other))),
                }
            }

            let input = input
                .ok_or_else(|| AppError::Usage("either --frames or --script is required".to_string()))?;
            Ok(Command::Run(RunArgs {
                config,
                music,
                input,
                classifier,
                silent,
                realtime,
                no_autoplay,
            }))
        }
        other => Err(AppError::Usage(format!("unknown command: {}", other))),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("gesture-player");

    let command = match parse_args(args.get(1..).unwrap_or_default()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            usage(program);
            std::process::exit(1);
        }
    };

    let result = match command {
        Command::Run(args) => run(args).map(|stats| {
            println!(
                "{} frame(s), {} action(s) dispatched, {} suppressed",
                stats.frames, stats.dispatched, stats.suppressed
            );
        }),
        Command::Check(dir) => {
            let dir = dir.unwrap_or_else(|| Config::default().music_dir);
            check::check_dir(&dir).map(|report| report.print()).map_err(AppError::from)
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: RunArgs) -> Result<RunStats, AppError> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(music) = args.music.clone() {
        config.music_dir = music;
    }
    if let Some(kind) = args.classifier {
        config.classifier = kind;
    }
    if args.no_autoplay {
        config.autoplay = false;
    }

    let playlist = Playlist::scan(&config.music_dir, &config.extensions)?;
    if playlist.is_empty() {
        log::warn!("no tracks in {}, gestures will do nothing", config.music_dir.display());
    }

    if args.silent {
        drive(SilentSink::new(), playlist, &config, &args)
    } else {
        drive(EngineSink::spawn(config.volume), playlist, &config, &args)
    }
}

fn drive<S: AudioSink>(
    sink: S,
    playlist: Playlist,
    config: &Config,
    args: &RunArgs,
) -> Result<RunStats, AppError> {
    let mut controller = MusicController::new(playlist, sink);
    let session = Session::new(DwellEngine::with_min_duration(
        config.action_table(),
        config.min_duration(),
    ));
    let mut app = App::new(session, &mut controller, LoopOptions { realtime: args.realtime });
    let exit = source::spawn_exit_listener();

    if config.autoplay {
        app.autoplay();
    }
    let stats = match &args.input {
        Input::Script(path) => {
            let mut source = LabelScript::open(path)?;
            app.run(&mut source, |frame| frame.label.clone(), &exit)
        }
        Input::Frames(path) => {
            let mut source = RecordedFrames::open(path)?;
            match config.classifier {
                ClassifierKind::Heuristic => {
                    let mut detector = RecordedDetector;
                    let mut classifier = HeuristicClassifier::new();
                    app.run(
                        &mut source,
                        |frame| classifier.classify(detector.detect_hands(frame).as_slice()),
                        &exit,
                    )
                }
                ClassifierKind::Model => {
                    let mut classifier = model_classifier(config);
                    app.run(&mut source, |frame| classifier.classify(frame), &exit)
                }
            }
        }
    };
    Ok(stats)
}

/// 配置了模型文件时以其存在为准，否则直接使用录制的模型输出
fn model_classifier(config: &Config) -> ModelClassifier<RecordedFrame> {
    match &config.model_asset {
        Some(asset) => ModelClassifier::open(asset, |_| Ok(RecordedRecognizer)),
        None => ModelClassifier::new(RecordedRecognizer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_run() {
        let command = parse_args(&args(&[
            "run",
            "--music",
            "songs",
            "--script",
            "demo.txt",
            "--classifier",
            "model",
            "--silent",
            "--no-autoplay",
        ]))
        .unwrap();

        assert_eq!(
            command,
            Command::Run(RunArgs {
                config: None,
                music: Some(PathBuf::from("songs")),
                input: Input::Script(PathBuf::from("demo.txt")),
                classifier: Some(ClassifierKind::Model),
                silent: true,
                realtime: false,
                no_autoplay: true,
            })
        );
    }

    #[test]
    fn test_parse_run_requires_input() {
        assert!(matches!(
            parse_args(&args(&["run", "--silent"])),
            Err(AppError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&args(&["run", "--frames"])),
            Err(AppError::Usage(_))
        ));
    }

    #[test]
    fn test_parse_check() {
        assert_eq!(parse_args(&args(&["check"])).unwrap(), Command::Check(None));
        assert_eq!(
            parse_args(&args(&["check", "music"])).unwrap(),
            Command::Check(Some(PathBuf::from("music")))
        );
        assert!(parse_args(&args(&["play"])).is_err());
    }

    #[test]
    fn test_model_classifier_degrades_without_asset() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            model_asset: Some(dir.path().join("gesture_recognizer.task")),
            ..Config::default()
        };
        assert!(model_classifier(&config).is_degraded());
        assert!(!model_classifier(&Config::default()).is_degraded());
    }
}
