use std::env;
use std::process;

use hurdle_cli::args::{CliArgs, USAGE};
use hurdle_cli::output::write_outputs;
use hurdle_cli::types::ProcessingConfig;
use hurdle_cli::HurdleProcessor;

fn main() {
    let args = match CliArgs::parse(env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    let mut config = match &args.config {
        Some(path) => match ProcessingConfig::from_yaml_file(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {err}");
                process::exit(2);
            }
        },
        None => ProcessingConfig::default(),
    };
    config.demo |= args.demo;
    config.verbose |= args.verbose;
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    let filter = if config.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let output_dir = config.output_dir.clone();
    let processor = HurdleProcessor::new(config);
    let output = match processor.process_session(
        &args.video,
        args.keypoints.as_ref(),
        args.height_cm,
        args.seed,
    ) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("processing failed: {err}");
            process::exit(1);
        }
    };

    let paths = match write_outputs(&output, &output_dir) {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("failed to write results: {err}");
            process::exit(1);
        }
    };

    let result = &output.result;
    println!("session: {}", output.metadata.session_name);
    println!(
        "obstacle: {:.1} cm ({:?})",
        output.profile.height_cm, output.profile.category
    );
    println!("origin: {:?}", output.origin);
    println!("flight time (s): {:.3}", result.flight_time_sec);
    println!("takeoff distance (m): {:.2}", result.takeoff_distance_m);
    println!("landing distance (m): {:.2}", result.landing_distance_m);
    println!("takeoff contact (s): {:.3}", result.takeoff_contact_sec);
    println!("landing contact (s): {:.3}", result.landing_contact_sec);
    println!("clearance (cm): {:.1}", result.clearance_cm);
    println!("confidence: {:.2}", result.confidence);
    println!(
        "technique: {} ({:.0})",
        output.summary.rating,
        result.technical_score.unwrap_or_default()
    );
    for note in &output.notes {
        println!("- {}", note);
    }
    println!("json: {}", paths.json.display());
    println!("csv: {}", paths.csv.display());
}
