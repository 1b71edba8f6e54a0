use clap::Parser;
use nutri_coach::core::nutrition::parse_nutrient_profile;
use nutri_coach::core::portion::parse_serving_size;
use nutri_coach::core::portion_resolver::{resolve_portion, PortionHints};
use nutri_coach::domain::model::DetectedFood;
use nutri_coach::domain::ports::DetectionConfigProvider;
use nutri_coach::utils::error::{ErrorSeverity, NutriError, Result};
use nutri_coach::utils::logger;
use nutri_coach::utils::validation::{validate_range, validate_required_field, Validate};
use nutri_coach::{
    compute_effective_nutrition, estimate_portion_from_name, normalize_barcode, CliConfig,
    CoachConfig, Command, DetectionFusionAdapter, DetectionHandoff, EphemeralStore, FusionOptions,
    HttpEnsembleDetector, ScalingInput,
};
use serde::Serialize;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match &cli.config {
        Some(path) => CoachConfig::from_file(path)?,
        None => CoachConfig::default(),
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI args: {:?}", cli);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(command: Command, config: &CoachConfig) -> Result<()> {
    match command {
        Command::Barcode { raw } => print_json(&normalize_barcode(&raw)),
        Command::Portion { name } => {
            println!("{}", estimate_portion_from_name(&name));
            Ok(())
        }
        Command::Serving { text } => match parse_serving_size(&text) {
            Some(grams) => {
                println!("{}", grams);
                Ok(())
            }
            None => Err(NutriError::InputError {
                message: format!("Could not parse a serving size from '{}'", text),
            }),
        },
        Command::Scale {
            per_gram,
            per_100g,
            grams,
        } => {
            let input = ScalingInput {
                base_per_gram: per_gram.as_deref().map(parse_nutrient_profile).transpose()?,
                base_per_100: per_100g.as_deref().map(parse_nutrient_profile).transpose()?,
                serving_g: grams,
            };
            print_json(&compute_effective_nutrition(&input))
        }
        Command::Resolve {
            grams,
            ocr,
            serving_size,
            per_100g,
            per_serving,
            name,
            default_grams,
        } => {
            let hints = PortionHints {
                user_grams: grams,
                user_display: None,
                ocr_text: ocr.map(std::fs::read_to_string).transpose()?,
                serving_size,
                per_100g: per_100g.as_deref().map(parse_nutrient_profile).transpose()?,
                per_serving: per_serving.as_deref().map(parse_nutrient_profile).transpose()?,
                product_name: name,
            };
            print_json(&resolve_portion(&hints, default_grams))
        }
        Command::Detect {
            image,
            min_conf,
            enable_gpt,
        } => {
            let endpoint = validate_required_field("detection.endpoint", &config.detection.endpoint)?;

            let mut detector = HttpEnsembleDetector::new(endpoint.as_str())
                .with_headers(config.headers());
            if let Some(timeout) = config.timeout() {
                detector = detector.with_timeout(timeout);
            }

            let mut options = FusionOptions::from_config(config);
            if let Some(min_conf) = min_conf {
                validate_range("--min-conf", min_conf, 0.0, 1.0)?;
                options.min_conf = min_conf;
            }
            if let Some(enable_gpt) = enable_gpt {
                options.enable_gpt = enable_gpt;
            }
            tracing::info!(
                "🔍 Detecting with min_conf={:.2}, enable_gpt={} (config default {})",
                options.min_conf,
                options.enable_gpt,
                config.enable_gpt()
            );

            let payload = std::fs::read_to_string(&image)?;

            let store: Arc<EphemeralStore<Vec<DetectedFood>>> =
                Arc::new(EphemeralStore::new(config.store_ttl()));
            let _sweeper = store.spawn_sweeper(config.sweep_interval());

            let adapter = DetectionFusionAdapter::new(detector);
            let handoff = DetectionHandoff::new(adapter, store, options)
                .with_min_score(config.canonical_min_score());
            let id = handoff.scan(payload.trim()).await?;
            let foods = handoff.take(&id).ok_or_else(|| NutriError::InputError {
                message: format!("Detection results {} expired before review", id),
            })?;
            print_json(&foods)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
