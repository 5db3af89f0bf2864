use std::path::PathBuf;

pub const USAGE: &str = "usage: hurdle-cli <video> --height <cm> [--keypoints <csv>] [--config <yaml>] \
[--seed <n>] [--demo] [--output <dir>] [--verbose]";

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub video: PathBuf,
    pub height_cm: f64,
    pub keypoints: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub demo: bool,
    pub output_dir: Option<PathBuf>,
    pub verbose: bool,
}

impl CliArgs {
    /// Parse arguments following the binary name
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, String> {
        let mut args = args.into_iter();
        let mut video = None;
        let mut height_cm = None;
        let mut keypoints = None;
        let mut config = None;
        let mut seed = None;
        let mut demo = false;
        let mut output_dir = None;
        let mut verbose = false;

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| format!("{flag} expects a value"))
            };
            match arg.as_str() {
                "--height" => {
                    let raw = value("--height")?;
                    height_cm = Some(
                        raw.parse::<f64>()
                            .map_err(|_| format!("invalid obstacle height: {raw}"))?,
                    );
                }
                "--keypoints" => keypoints = Some(PathBuf::from(value("--keypoints")?)),
                "--config" => config = Some(PathBuf::from(value("--config")?)),
                "--seed" => {
                    let raw = value("--seed")?;
                    seed = Some(raw.parse::<u64>().map_err(|_| format!("invalid seed: {raw}"))?);
                }
                "--output" => output_dir = Some(PathBuf::from(value("--output")?)),
                "--demo" => demo = true,
                "--verbose" | "-v" => verbose = true,
                flag if flag.starts_with('-') => return Err(format!("unknown flag: {flag}")),
                _ if video.is_none() => video = Some(PathBuf::from(&arg)),
                _ => return Err(format!("unexpected argument: {arg}")),
            }
        }

        Ok(Self {
            video: video.ok_or("missing video path")?,
            height_cm: height_cm.ok_or("missing --height")?,
            keypoints,
            config,
            seed,
            demo,
            output_dir,
            verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<CliArgs, String> {
        CliArgs::parse(line.split_whitespace().map(String::from))
    }

    #[test]
    fn parses_full_command_line() {
        let args = parse(
            "run.mp4 --height 106.7 --keypoints run.csv --seed 7 --demo --output out --verbose",
        )
        .unwrap();
        assert_eq!(args.video, PathBuf::from("run.mp4"));
        assert_eq!(args.height_cm, 106.7);
        assert_eq!(args.keypoints, Some(PathBuf::from("run.csv")));
        assert_eq!(args.seed, Some(7));
        assert!(args.demo && args.verbose);
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn height_is_required() {
        assert_eq!(parse("run.mp4").unwrap_err(), "missing --height");
    }

    #[test]
    fn malformed_values_are_usage_errors() {
        assert!(parse("run.mp4 --height tall").is_err());
        assert!(parse("run.mp4 --height 100 --seed").is_err());
        assert!(parse("run.mp4 --height 100 --fast").is_err());
        assert!(parse("a.mp4 b.mp4 --height 100").is_err());
    }
}
