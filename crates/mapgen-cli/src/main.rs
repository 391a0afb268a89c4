use mapgen::acceptance::{self, CaseOutcome, Verdict};
use mapgen::{BoundingBox, CanvasSize, ScoreRecord};
use std::path::{Path, PathBuf};

const DEFAULT_GOLDEN_DIR: &str = "tests/golden";
const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

#[derive(Debug)]
enum CliError {
    Help,
    Usage(&'static str),
    InvalidArgument { flag: &'static str, value: String },
    CasesErrored(usize),
    Mapgen(mapgen::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Help => write!(f, "{}", usage()),
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::InvalidArgument { flag, value } => {
                write!(f, "invalid value for {flag}: `{value}`")
            }
            CliError::CasesErrored(n) => write!(f, "{n} acceptance case(s) errored"),
            CliError::Mapgen(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<mapgen::Error> for CliError {
    fn from(value: mapgen::Error) -> Self {
        Self::Mapgen(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Render,
    Score,
    OmapRoundtrip,
    AcceptanceRun,
    AcceptanceRunAll,
}

#[derive(Debug, Default)]
struct Args {
    command: Option<Command>,
    input: Option<PathBuf>,
    out: Option<PathBuf>,
    bbox: Option<[f64; 4]>,
    size: Option<[u32; 2]>,
    reference: Option<PathBuf>,
    candidate: Option<PathBuf>,
    threshold: Option<f64>,
    aoi: Option<String>,
    golden: Option<PathBuf>,
    artifacts: Option<PathBuf>,
}

/// Process exit status for a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    BelowThreshold,
}

fn usage() -> &'static str {
    "mapgen-cli\n\
\n\
USAGE:\n\
  mapgen-cli render --in <omap> --out <png> --bbox <xmin,ymin,xmax,ymax> --size <w,h>\n\
  mapgen-cli score --ref <png> --cand <png> [--out <json>] [--threshold <t>]\n\
  mapgen-cli omap roundtrip --in <omap> --out <omap>\n\
  mapgen-cli acceptance run --aoi <name> [--golden <dir>] [--artifacts <dir>]\n\
  mapgen-cli acceptance run-all [--golden <dir>] [--artifacts <dir>]\n\
\n\
NOTES:\n\
  - score prints the score record to stdout unless --out is given.\n\
  - acceptance defaults: --golden tests/golden, --artifacts artifacts.\n\
  - exit status: 0 success/pass, 1 invalid input or error, 2 below threshold.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, CliError> {
    it.next().ok_or(CliError::Usage(usage()))
}

fn parse_list<T: std::str::FromStr, const N: usize>(
    flag: &'static str,
    raw: &str,
) -> Result<[T; N], CliError> {
    let invalid = || CliError::InvalidArgument {
        flag,
        value: raw.to_string(),
    };
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<T>().map_err(|_| invalid()))
        .collect::<Result<Vec<T>, CliError>>()?;
    values.try_into().map_err(|_| invalid())
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Help),
            "render" if args.command.is_none() => args.command = Some(Command::Render),
            "score" if args.command.is_none() => args.command = Some(Command::Score),
            "omap" if args.command.is_none() => match next_value(&mut it)?.as_str() {
                "roundtrip" => args.command = Some(Command::OmapRoundtrip),
                _ => return Err(CliError::Usage(usage())),
            },
            "acceptance" if args.command.is_none() => match next_value(&mut it)?.as_str() {
                "run" => args.command = Some(Command::AcceptanceRun),
                "run-all" => args.command = Some(Command::AcceptanceRunAll),
                _ => return Err(CliError::Usage(usage())),
            },
            "--in" => args.input = Some(PathBuf::from(next_value(&mut it)?)),
            "--out" => args.out = Some(PathBuf::from(next_value(&mut it)?)),
            "--ref" => args.reference = Some(PathBuf::from(next_value(&mut it)?)),
            "--cand" => args.candidate = Some(PathBuf::from(next_value(&mut it)?)),
            "--golden" => args.golden = Some(PathBuf::from(next_value(&mut it)?)),
            "--artifacts" => args.artifacts = Some(PathBuf::from(next_value(&mut it)?)),
            "--aoi" => args.aoi = Some(next_value(&mut it)?.clone()),
            "--bbox" => args.bbox = Some(parse_list("--bbox", next_value(&mut it)?)?),
            "--size" => args.size = Some(parse_list("--size", next_value(&mut it)?)?),
            "--threshold" => {
                let raw = next_value(&mut it)?;
                let threshold = raw.trim().parse::<f64>().ok().filter(|t| t.is_finite());
                let Some(threshold) = threshold else {
                    return Err(CliError::InvalidArgument {
                        flag: "--threshold",
                        value: raw.clone(),
                    });
                };
                args.threshold = Some(threshold);
            }
            _ => return Err(CliError::Usage(usage())),
        }
    }

    if args.command.is_none() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn required<T>(value: Option<T>) -> Result<T, CliError> {
    value.ok_or(CliError::Usage(usage()))
}

fn run(args: Args) -> Result<Outcome, CliError> {
    match required(args.command)? {
        Command::Render => {
            let input = required(args.input)?;
            let out = required(args.out)?;
            let bbox = BoundingBox::from(required(args.bbox)?);
            let size = CanvasSize::from(required(args.size)?);
            mapgen::render_map_to_png(&input, &out, bbox, size)?;
            println!("Rendered {} to {}", input.display(), out.display());
            Ok(Outcome::Success)
        }
        Command::Score => {
            let reference = required(args.reference)?;
            let candidate = required(args.candidate)?;
            score(&reference, &candidate, args.out.as_deref(), args.threshold)
        }
        Command::OmapRoundtrip => {
            let input = required(args.input)?;
            let out = required(args.out)?;
            if let Some(diff) = mapgen::roundtrip_document(&input, &out)? {
                eprintln!("warning: round-trip changed document structure: {diff}");
            }
            println!("Round-tripped OMap: {} -> {}", input.display(), out.display());
            Ok(Outcome::Success)
        }
        Command::AcceptanceRun => {
            let aoi = required(args.aoi)?;
            let golden = args.golden.unwrap_or_else(|| DEFAULT_GOLDEN_DIR.into());
            let artifacts = args
                .artifacts
                .unwrap_or_else(|| DEFAULT_ARTIFACTS_DIR.into());
            let result = mapgen::run_aoi(golden.join(&aoi), artifacts.join(&aoi))?;
            let outcome = CaseOutcome::Completed(result);
            println!("{}", outcome.summary_line());
            Ok(match outcome.verdict() {
                Verdict::Pass => Outcome::Success,
                _ => Outcome::BelowThreshold,
            })
        }
        Command::AcceptanceRunAll => {
            let golden = args.golden.unwrap_or_else(|| DEFAULT_GOLDEN_DIR.into());
            let artifacts = args
                .artifacts
                .unwrap_or_else(|| DEFAULT_ARTIFACTS_DIR.into());
            let report = mapgen::run_all(&golden, &artifacts)?;
            for outcome in &report.outcomes {
                println!("{}", outcome.summary_line());
            }
            println!(
                "{} passed, {} failed, {} errored; summary: {}",
                report.count(Verdict::Pass),
                report.count(Verdict::Fail),
                report.count(Verdict::Error),
                artifacts.join(acceptance::SUMMARY_RECORD).display()
            );
            let errored = report.count(Verdict::Error);
            if errored > 0 {
                return Err(CliError::CasesErrored(errored));
            }
            Ok(if report.passed() {
                Outcome::Success
            } else {
                Outcome::BelowThreshold
            })
        }
    }
}

fn score(
    reference: &Path,
    candidate: &Path,
    out: Option<&Path>,
    threshold: Option<f64>,
) -> Result<Outcome, CliError> {
    let value = mapgen::score_files(reference, candidate)?;
    let record = ScoreRecord::new(value, reference, candidate, threshold);
    match out {
        Some(path) => {
            mapgen::io::write_json(path, &record)?;
            println!("SSIM: {value:.6}");
        }
        None => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(match record.pass {
        Some(false) => Outcome::BelowThreshold,
        _ => Outcome::Success,
    })
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Help) => {
            print!("{}", usage());
            return;
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(Outcome::Success) => {}
        Ok(Outcome::BelowThreshold) => std::process::exit(2),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
