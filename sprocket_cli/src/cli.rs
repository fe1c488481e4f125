use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use sprocket_core::units::{LengthUnit, Millimeters};

#[derive(Parser, Debug)]
#[command(name = "sprocket", version, about = "Sprocket and hub cost calculator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "sprocket.toml", global = true)]
    pub config: PathBuf,

    /// Use the in-process cost engine instead of the configured service
    #[arg(long, global = true)]
    pub local: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Step through the inputs one prompt at a time (default)
    Interactive,

    /// Calculate costs from command line values
    Calculate(CalculateArgs),

    /// Show the automatic PCD for a chain pitch and tooth count
    Pcd {
        /// Chain pitch, e.g. `12.7`, `12.7mm`, `0.5in`
        #[arg(long)]
        chain_pitch: LengthArg,

        /// Number of teeth
        #[arg(long)]
        teeth: f64,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CalculateArgs {
    /// Chain pitch, e.g. `12.7`, `12.7mm`, `0.5in`
    #[arg(long)]
    pub chain_pitch: Option<LengthArg>,

    #[arg(long)]
    pub roller_diameter: Option<LengthArg>,

    /// Outer diameter
    #[arg(long)]
    pub od: Option<LengthArg>,

    #[arg(long)]
    pub hub_dia: Option<LengthArg>,

    #[arg(long)]
    pub hub_length: Option<LengthArg>,

    #[arg(long)]
    pub zz: Option<LengthArg>,

    #[arg(long)]
    pub teeth: Option<f64>,

    /// Chain type appended to the product name, e.g. `Simplex`
    #[arg(long, default_value = "")]
    pub chain_type: String,

    /// `auto`, or a manual PCD such as `160` or `6.3in`
    #[arg(long, default_value = "auto")]
    pub pcd: PcdArg,

    /// Sprocket raw material rate per kg
    #[arg(long)]
    pub sprocket_rmc: Option<f64>,

    /// Sprocket processing cost
    #[arg(long)]
    pub sprocket_pc: Option<f64>,

    /// Sprocket heat treatment cost
    #[arg(long)]
    pub sprocket_ht: Option<f64>,

    /// Hub raw material rate per kg
    #[arg(long)]
    pub hub_rmc: Option<f64>,

    #[arg(long)]
    pub hub_pc: Option<f64>,

    #[arg(long)]
    pub hub_ht: Option<f64>,

    /// Write the PDF report
    #[arg(long)]
    pub pdf: bool,

    /// Write the spreadsheet
    #[arg(long)]
    pub xlsx: bool,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Directory for exports (overrides `export.output_dir`)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// A length with an optional unit suffix; bare numbers are millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthArg {
    pub value: f64,
    pub unit: LengthUnit,
}

impl FromStr for LengthArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-' || c == 'e' || c == 'E'))
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(split);

        let value: f64 = number
            .parse()
            .map_err(|_| format!("'{}' is not a number", number))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("'{}' must be a non-negative number", s));
        }

        let unit = if suffix.trim().is_empty() {
            LengthUnit::Millimeters
        } else {
            suffix.parse().map_err(|_| format!("unknown unit '{}'", suffix.trim()))?
        };

        Ok(LengthArg { value, unit })
    }
}

impl LengthArg {
    pub fn millimeters(self) -> f64 {
        Millimeters::from_unit(self.value, self.unit).value()
    }
}

impl fmt::Display for LengthArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// PCD source given on the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PcdArg {
    Auto,
    Manual(LengthArg),
}

impl FromStr for PcdArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "automatic" => Ok(PcdArg::Auto),
            _ => s.parse().map(PcdArg::Manual),
        }
    }
}
