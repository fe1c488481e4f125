//! # Sprocket CLI
//!
//! Terminal front end for the sprocket cost calculator.
//!
//! ```text
//! sprocket                       # interactive prompts
//! sprocket calculate --chain-pitch 0.5in --teeth 40 --od 170 --pdf
//! sprocket pcd --chain-pitch 12.7 --teeth 40
//! ```
//!
//! Settings come from `sprocket.toml` (optional) and `SPROCKET__*`
//! environment variables.

mod cli;
mod config;
mod interactive;

use std::path::PathBuf;

use clap::Parser;
use sprocket_core::fields::MeasurementField;
use sprocket_core::form::{PcdMode, SprocketForm};
use sprocket_core::presenter::{format_length, pcd_preview_line, ResultView};
use sprocket_core::request::RateField;
use sprocket_core::units::{from_canonical, LengthUnit};
use sprocket_core::{logging, CalculationService, ServiceEnvelope, Session};
use tracing::debug;

use crate::cli::{CalculateArgs, Cli, Commands, LengthArg, PcdArg};
use crate::config::{load_config, ServiceMode};

/// Form built from `calculate` flags
fn form_from_args(args: &CalculateArgs) -> SprocketForm {
    let mut form = SprocketForm::new();
    form.chain_type = args.chain_type.trim().to_string();
    form.number_of_teeth = args.teeth;

    let lengths: [(MeasurementField, Option<LengthArg>); 6] = [
        (MeasurementField::ChainPitch, args.chain_pitch),
        (MeasurementField::ChainRollerDiameter, args.roller_diameter),
        (MeasurementField::OuterDiameter, args.od),
        (MeasurementField::HubDiameter, args.hub_dia),
        (MeasurementField::HubLength, args.hub_length),
        (MeasurementField::Zz, args.zz),
    ];
    for (field, length) in lengths {
        if let Some(length) = length {
            form.set_measurement(field, Some(length.value), length.unit);
        }
    }

    if let PcdArg::Manual(length) = args.pcd {
        form.pcd_mode = PcdMode::Manual;
        form.set_measurement(MeasurementField::ManualPcd, Some(length.value), length.unit);
    }

    let rates = [
        (RateField::SprocketRmcPerKg, args.sprocket_rmc),
        (RateField::SprocketPc, args.sprocket_pc),
        (RateField::SprocketHt, args.sprocket_ht),
        (RateField::HubRmcPerKg, args.hub_rmc),
        (RateField::HubPc, args.hub_pc),
        (RateField::HubHt, args.hub_ht),
    ];
    for (rate, value) in rates {
        form.rates.set(rate, value);
    }

    form
}

async fn calculate<S: CalculationService>(
    session: &Session<S>,
    args: &CalculateArgs,
    output_dir: PathBuf,
) -> anyhow::Result<()> {
    let form = form_from_args(args);

    let stored = match session.submit(&form).await {
        Ok(stored) => stored,
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&ServiceEnvelope::failure(e.user_message()))?);
            }
            anyhow::bail!(e.user_message());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ServiceEnvelope::ok(stored.result.clone()))?);
    } else {
        println!("{}", ResultView::build(&stored).to_text());
    }

    if args.pdf {
        let path = session.export_pdf(&output_dir)?;
        eprintln!("Saved {}", path.display());
    }
    if args.xlsx {
        let path = session.export_spreadsheet(&output_dir)?;
        eprintln!("Saved {}", path.display());
    }
    Ok(())
}

fn show_pcd(chain_pitch: LengthArg, teeth: f64) {
    let pitch_mm = chain_pitch.millimeters();
    println!("{}", pcd_preview_line(pitch_mm, teeth));
    let pcd_mm = sprocket_core::pcd::compute_automatic_pcd(pitch_mm, teeth);
    println!(
        "  = {}",
        format_length(from_canonical(pcd_mm, LengthUnit::Inches), LengthUnit::Inches)
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_with_default("warn");

    let cli = Cli::parse();
    let mut cfg = load_config(&cli.config)?;
    if cli.local {
        cfg.service.mode = ServiceMode::Local;
    }
    debug!(?cfg, "loaded configuration");

    let command = cli.command.unwrap_or(Commands::Interactive);
    if let Commands::Pcd { chain_pitch, teeth } = command {
        show_pcd(chain_pitch, teeth);
        return Ok(());
    }

    let session = Session::new(cfg.service.build()?);

    match command {
        Commands::Calculate(args) => {
            let output_dir = args.output_dir.clone().unwrap_or(cfg.export.output_dir);
            calculate(&session, &args, output_dir).await
        }
        _ => interactive::run(&session, &cfg.export.output_dir).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CalculateArgs {
        let mut argv = vec!["sprocket", "calculate"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Calculate(args)) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_form_from_args() {
        let form = form_from_args(&args(&[
            "--chain-pitch",
            "0.5in",
            "--teeth",
            "40",
            "--od",
            "170",
            "--chain-type",
            "Simplex",
            "--hub-pc",
            "80",
        ]));

        let request = form.submit().request;
        assert_eq!(request.chain_pitch, 12.7);
        assert_eq!(request.outer_diameter, 170.0);
        assert_eq!(request.number_of_teeth, 40);
        assert!((request.pcd - 161.70).abs() < 0.01);
        assert_eq!(request.chain_type, "Simplex");
        assert_eq!(request.rates.hub_pc, 80.0);
    }

    #[test]
    fn test_manual_pcd_flag() {
        let form = form_from_args(&args(&["--chain-pitch", "12.7", "--teeth", "40", "--pcd", "100in"]));
        assert_eq!(form.submit().request.pcd, 2540.0);
    }

    #[tokio::test]
    async fn test_calculate_local_writes_exports() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new(sprocket_core::LocalCalculationService);
        let args = args(&["--chain-pitch", "12.7", "--teeth", "40", "--xlsx"]);

        calculate(&session, &args, dir.path().to_path_buf()).await.unwrap();
        assert!(dir.path().join("12.7X40_report.xlsx").exists());
    }
}
