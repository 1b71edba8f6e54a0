use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "nutri-coach")]
#[command(about = "Food portion, nutrition and detection utilities")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Normalize a scanned barcode to EAN-13 form
    Barcode { raw: String },

    /// Estimate the serving weight of a food by name
    Portion { name: String },

    /// Parse a label serving size such as "2 cookies (30 g)"
    Serving { text: String },

    /// Scale a nutrient map (JSON object) to a serving size
    Scale {
        #[arg(long, help = "Per-gram nutrient map, e.g. '{\"calories\": 2}'")]
        per_gram: Option<String>,

        #[arg(long = "per-100g", help = "Per-100g nutrient map")]
        per_100g: Option<String>,

        #[arg(long)]
        grams: f64,
    },

    /// Resolve a serving weight from user input, label text and nutrition data
    Resolve {
        #[arg(long, help = "Serving weight chosen by the user")]
        grams: Option<f64>,

        #[arg(long, help = "File containing OCR text of the label")]
        ocr: Option<PathBuf>,

        #[arg(long, help = "Declared serving size, e.g. \"1 bar (40 g)\"")]
        serving_size: Option<String>,

        #[arg(long = "per-100g", help = "Per-100g nutrient map")]
        per_100g: Option<String>,

        #[arg(long, help = "Per-serving nutrient map")]
        per_serving: Option<String>,

        #[arg(long, help = "Product or food name")]
        name: Option<String>,

        #[arg(long, default_value_t = 30.0)]
        default_grams: f64,
    },

    /// Run ensemble detection on a base64-encoded image file
    Detect {
        #[arg(long, help = "File containing the base64 image payload")]
        image: PathBuf,

        #[arg(long, help = "Override detection.min_confidence")]
        min_conf: Option<f64>,

        #[arg(long, help = "Override detection.enable_gpt")]
        enable_gpt: Option<bool>,
    },
}
