use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tallymatch::draw::{Annotator, DrawConfig, RoiOverlay};
use tallymatch::{
    calculate_match_percentage, load_image, DetectConfig, Detection, Detector, DirectorySource,
    FileCountStore, FileTemplateStore, FrameSource, Image, InstanceOrder, Roi, Session,
};
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "TallyMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file. Defaults apply if it is missing.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cut a template out of a frame and store it.
    Capture {
        /// Frame image to cut from.
        frame: PathBuf,
        /// Selection corners `x1 y1 x2 y2`, in any order.
        #[arg(
            long,
            required = true,
            num_args = 4,
            value_names = ["X1", "Y1", "X2", "Y2"],
            allow_negative_numbers = true
        )]
        roi: Vec<i64>,
    },
    /// Replay a frame directory through a detector.
    Detect {
        /// Overrides `frames_dir`.
        #[arg(long)]
        frames: Option<PathBuf>,
        /// Overrides `output_dir`.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Overrides `mode`.
        #[arg(long, value_enum)]
        mode: Option<Mode>,
    },
    /// Inspect or change the persisted tally.
    Count {
        #[arg(value_enum, default_value_t = CountAction::Show)]
        action: CountAction,
    },
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
enum Mode {
    #[default]
    Single,
    MultiScale,
    Multi,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CountAction {
    Show,
    Increment,
    Reset,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OrderConfig {
    ScanOrder,
    ScoreDesc,
}

impl From<OrderConfig> for InstanceOrder {
    fn from(value: OrderConfig) -> Self {
        match value {
            OrderConfig::ScanOrder => InstanceOrder::ScanOrder,
            OrderConfig::ScoreDesc => InstanceOrder::ScoreDesc,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    threshold: f32,
    scale_range: [f64; 2],
    scale_steps: usize,
    max_detections: usize,
    nms: bool,
    overlap_threshold: f32,
    order: OrderConfig,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        Self {
            threshold: cfg.threshold,
            scale_range: [cfg.scale_range.0, cfg.scale_range.1],
            scale_steps: cfg.scale_steps,
            max_detections: cfg.max_detections,
            nms: cfg.nms,
            overlap_threshold: cfg.overlap_threshold,
            order: OrderConfig::ScanOrder,
        }
    }
}

impl From<&DetectConfigJson> for DetectConfig {
    fn from(value: &DetectConfigJson) -> Self {
        Self {
            threshold: value.threshold,
            scale_range: (value.scale_range[0], value.scale_range[1]),
            scale_steps: value.scale_steps,
            max_detections: value.max_detections,
            nms: value.nms,
            overlap_threshold: value.overlap_threshold,
            order: value.order.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    template_dir: PathBuf,
    count_path: PathBuf,
    frames_dir: PathBuf,
    output_dir: Option<PathBuf>,
    mode: Mode,
    font_path: Option<PathBuf>,
    /// Add detections to the persisted tally while replaying.
    tally: bool,
    detect: DetectConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            count_path: PathBuf::from("object_count.json"),
            frames_dir: PathBuf::from("frames"),
            output_dir: None,
            mode: Mode::Single,
            font_path: None,
            tally: false,
            detect: DetectConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    x1: usize,
    y1: usize,
    x2: usize,
    y2: usize,
    score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale: Option<f64>,
}

impl DetectionRecord {
    fn new(det: &Detection, scale: Option<f64>) -> Self {
        Self {
            x1: det.top_left.x,
            y1: det.top_left.y,
            x2: det.bottom_right.x,
            y2: det.bottom_right.y,
            score: det.score,
            scale,
        }
    }
}

#[derive(Debug, Serialize)]
struct FrameRecord {
    frame: String,
    mode: Mode,
    present: bool,
    match_percentage: f32,
    detections: Vec<DetectionRecord>,
}

#[derive(Debug, Serialize)]
struct Output {
    frames: Vec<FrameRecord>,
    count: u64,
}

type FileSession = Session<FileTemplateStore, FileCountStore>;

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn open_session(config: &Config) -> FileSession {
    let detector = Detector::new().with_config(DetectConfig::from(&config.detect));
    Session::open(
        FileTemplateStore::new(&config.template_dir),
        FileCountStore::new(&config.count_path),
    )
    .with_detector(detector)
}

fn run_capture(
    mut session: FileSession,
    frame_path: &Path,
    roi: &[i64],
) -> Result<(), Box<dyn std::error::Error>> {
    let [x1, y1, x2, y2] = <[i64; 4]>::try_from(roi).map_err(|_| "--roi takes four values")?;
    let frame = load_image(frame_path)?;
    let roi = Roi::from_corners((x1, y1), (x2, y2), frame.width(), frame.height())?;
    let template = session.capture_template(&frame, roi)?;
    let coords = template.roi().coords();
    println!("{}", serde_json::json!({ "roi_coords": coords }));
    session.shutdown()?;
    Ok(())
}

fn frame_name(source: &DirectorySource) -> String {
    source
        .current_path()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn detect_frame(
    session: &FileSession,
    mode: Mode,
    frame: &Image,
) -> Result<Vec<(Detection, Option<f64>)>, Box<dyn std::error::Error>> {
    let found = match mode {
        Mode::Single => session.detect(frame)?.into_iter().map(|d| (d, None)).collect(),
        Mode::MultiScale => session
            .detect_multi_scale(frame)?
            .into_iter()
            .map(|s| (s.detection, Some(s.scale)))
            .collect(),
        Mode::Multi => session
            .detect_multiple(frame)?
            .unwrap_or_default()
            .into_iter()
            .map(|d| (d, None))
            .collect(),
    };
    Ok(found)
}

fn run_detect(
    mut session: FileSession,
    config: &Config,
    mode: Mode,
    frames_dir: &Path,
    output_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(template) = session.template() else {
        return Err("no template stored; run `capture` first".into());
    };
    let overlay = RoiOverlay {
        roi: template.roi(),
        threshold: session.threshold(),
    };

    let mut annotator = Annotator::new(DrawConfig::default());
    if let Some(font_path) = &config.font_path {
        annotator = annotator.with_font_bytes(fs::read(font_path)?)?;
    }
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)?;
    }

    let mut source = DirectorySource::open(frames_dir)?;
    let mut records = Vec::new();
    let mut tally = 0u64;
    while let Some(frame) = source.read() {
        let name = frame_name(&source);
        let found = detect_frame(&session, mode, &frame)?;
        let best = found.first().map(|(d, _)| d);
        let present = match mode {
            Mode::Multi => !found.is_empty(),
            _ => session.is_present(best),
        };
        tracing::info!(frame = %name, present, hits = found.len(), "frame processed");

        if let Some(dir) = output_dir {
            let annotated = match mode {
                Mode::Multi => {
                    let dets: Vec<Detection> = found.iter().map(|(d, _)| *d).collect();
                    annotator.annotate_all(&frame, &dets)?
                }
                _ => annotator.annotate(&frame, best, Some(overlay))?,
            };
            annotated.image.save(dir.join(&name))?;
        }

        if present {
            tally += match mode {
                Mode::Multi => found.len() as u64,
                _ => 1,
            };
        }
        records.push(FrameRecord {
            frame: name,
            mode,
            present,
            match_percentage: calculate_match_percentage(best),
            detections: found
                .iter()
                .map(|(d, scale)| DetectionRecord::new(d, *scale))
                .collect(),
        });
    }

    if config.tally {
        session.add(tally)?;
    }
    let output = Output {
        frames: records,
        count: session.count(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    session.shutdown()?;
    Ok(())
}

fn run_count(
    mut session: FileSession,
    action: CountAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CountAction::Show => {}
        CountAction::Increment => {
            session.increment()?;
        }
        CountAction::Reset => session.reset()?,
    }
    println!("{}", serde_json::json!({ "count": session.count() }));
    session.shutdown()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("tallymatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config = load_config(&cli.config)?;
    let session = open_session(&config);

    match cli.command {
        Some(Command::Capture { frame, roi }) => run_capture(session, &frame, &roi),
        Some(Command::Detect {
            frames,
            output,
            mode,
        }) => {
            let frames_dir = frames.unwrap_or_else(|| config.frames_dir.clone());
            let output_dir = output.or_else(|| config.output_dir.clone());
            let mode = mode.unwrap_or(config.mode);
            run_detect(session, &config, mode, &frames_dir, output_dir.as_deref())
        }
        Some(Command::Count { action }) => run_count(session, action),
        None => Err("no command given; see --help".into()),
    }
}
