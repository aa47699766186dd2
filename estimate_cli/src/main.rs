//! # Groundwork CLI
//!
//! Terminal front end for the estimation engine. Prints the same JSON
//! envelope the HTTP boundary returns, or a short text summary with
//! `--human`.
//!
//! ```text
//! groundwork calculate --request job.json
//! echo '{"job_type": "patio", ...}' | groundwork calculate --request -
//! groundwork materials --type block
//! groundwork templates --job-type step_run
//! groundwork convert 20 6
//! ```
//!
//! Exit code is 0 on success and 2 when the engine rejects the input.
//! Logs go to stderr; set `RUST_LOG=debug` to see each pipeline stage.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use estimate_core::units::{feet_to_feet_inches, to_decimal_feet, FeetInches};
use estimate_core::{
    estimate, CalcError, CalcResult, CalculationResult, EstimateResponse, EstimatorSettings,
    JobSpecification, JobType, MaterialCatalog, MaterialType,
};

#[derive(Parser, Debug)]
#[command(name = "groundwork")]
#[command(author, version, about = "Landscaping materials and job estimator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Material catalog file (.json or .toml); defaults to the built-in catalog
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Estimator settings file (.toml)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Print a text summary instead of JSON
    #[arg(long, global = true)]
    pub human: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate a job from a JSON request
    Calculate {
        /// Request file, or "-" for stdin
        #[arg(long, short)]
        request: PathBuf,
    },

    /// List catalog materials
    Materials {
        /// Only show one material type (block, stone, brick, ...)
        #[arg(long = "type")]
        material_type: Option<String>,
    },

    /// Show measurement templates per job type
    Templates {
        #[arg(long)]
        job_type: Option<String>,
    },

    /// Convert feet + inches to decimal feet
    #[command(allow_negative_numbers = true)]
    Convert { feet: f64, inches: f64 },
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.log_json);

    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = e.error_code(), "{}", e);
            if cli.global.human {
                eprintln!("Error: {}", e);
            } else {
                let failure = EstimateResponse::from_error(&e);
                match to_json(&failure) {
                    Ok(json) => println!("{}", json),
                    Err(_) => eprintln!("Error: {}", e),
                }
            }
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> CalcResult<String> {
    let global = &cli.global;
    match &cli.command {
        Commands::Calculate { request } => {
            let spec = read_request(request)?;
            let catalog = load_catalog(global.catalog.as_deref())?;
            let settings = load_settings(global.settings.as_deref())?;
            let result = estimate(&spec, &catalog, &settings)?;
            if global.human {
                Ok(summarize(&result))
            } else {
                to_json(&EstimateResponse::from_result(Ok(result)))
            }
        }

        Commands::Materials { material_type } => {
            let catalog = load_catalog(global.catalog.as_deref())?;
            let materials = match material_type {
                Some(t) => catalog.by_type(MaterialType::from_str_flexible(t)?),
                None => catalog.iter().collect(),
            };
            if global.human {
                Ok(materials
                    .iter()
                    .map(|m| {
                        format!(
                            "{:<32} {:<10} ${:>8.2} / {:<7} {}",
                            m.id,
                            m.material_type.code(),
                            m.price_per_unit,
                            m.unit_of_measure.label(),
                            m.display_name
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n"))
            } else {
                to_json(&materials)
            }
        }

        Commands::Templates { job_type } => {
            let settings = load_settings(global.settings.as_deref())?;
            let job_types = match job_type {
                Some(t) => vec![JobType::from_str_flexible(t)?],
                None => JobType::ALL.to_vec(),
            };
            let templates: Vec<_> = job_types.iter().map(|t| t.template(&settings)).collect();
            if global.human {
                let mut out = Vec::new();
                for template in &templates {
                    out.push(format!("{} ({})", template.name, template.job_type.code()));
                    for field in &template.fields {
                        let requirement = match (field.required, field.default) {
                            (true, _) => "required".to_string(),
                            (false, Some(d)) => format!("optional, default {}", FeetInches::inches(d)),
                            (false, None) => "optional".to_string(),
                        };
                        out.push(format!("  {:<12} {:<18} {}", field.key, field.label, requirement));
                    }
                }
                Ok(out.join("\n"))
            } else {
                to_json(&templates)
            }
        }

        Commands::Convert { feet, inches } => {
            let decimal = to_decimal_feet(*feet, *inches)?;
            let display = feet_to_feet_inches(decimal).to_string();
            if global.human {
                Ok(format!("{} = {} ft", display, decimal.0))
            } else {
                to_json(&serde_json::json!({
                    "feet": feet,
                    "inches": inches,
                    "decimal_feet": decimal.0,
                    "display": display,
                }))
            }
        }
    }
}

fn read_request(path: &Path) -> CalcResult<JobSpecification> {
    let text = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| CalcError::file_error("read", "stdin", e.to_string()))?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?
    };
    serde_json::from_str(&text).map_err(|e| CalcError::serialization(format!("Invalid request JSON: {}", e)))
}

fn load_catalog(path: Option<&Path>) -> CalcResult<MaterialCatalog> {
    match path {
        Some(p) => MaterialCatalog::load(p),
        None => MaterialCatalog::standard().cloned(),
    }
}

fn load_settings(path: Option<&Path>) -> CalcResult<EstimatorSettings> {
    match path {
        Some(p) => EstimatorSettings::load(p),
        None => Ok(EstimatorSettings::default()),
    }
}

fn to_json<T: Serialize>(value: &T) -> CalcResult<String> {
    serde_json::to_string_pretty(value).map_err(CalcError::serialization)
}

fn summarize(result: &CalculationResult) -> String {
    let mut out = vec![format!("{} - {}", result.job_type(), result.material_id())];

    if let Some(area) = result.area_sqft() {
        out.push(format!("Area: {:.2} sq ft", area));
    }
    out.push(format!(
        "Total depth: {}",
        FeetInches::inches(result.total_depth_inches())
    ));

    out.push("Layers:".to_string());
    for layer in result.layers() {
        out.push(format!(
            "  {}. {:<36} {}",
            layer.order,
            layer.name,
            FeetInches::inches(layer.depth_in)
        ));
    }

    out.push("Materials:".to_string());
    for item in result.line_items() {
        out.push(format!(
            "  {:>8} {:<7} {:<40} @ ${:.2} = ${:.2}",
            item.quantity(),
            item.unit().label(),
            item.description(),
            item.cost_per_unit(),
            item.total_cost()
        ));
    }

    out.push(format!("Total cost: ${:.2}", result.total_cost()));
    out.push(format!("Total volume: {:.2} cu yd", result.total_volume_cu_yd()));
    if let Some(weight) = result.total_weight_lb() {
        out.push(format!("Total weight: {:.0} lb", weight));
    }
    out.push(format!("Labor: {} h", result.labor_hours()));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn test_parse_calculate() {
        let parsed = cli(&["groundwork", "calculate", "--request", "job.json", "--human"]);
        assert!(parsed.global.human);
        match parsed.command {
            Commands::Calculate { request } => assert_eq!(request, PathBuf::from("job.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_materials_type() {
        let parsed = cli(&["groundwork", "materials", "--type", "brick"]);
        assert!(matches!(
            parsed.command,
            Commands::Materials { material_type: Some(ref t) } if t == "brick"
        ));
    }

    #[test]
    fn test_parse_convert_negative() {
        let parsed = cli(&["groundwork", "convert", "-2", "6"]);
        assert!(matches!(parsed.command, Commands::Convert { feet, inches } if feet == -2.0 && inches == 6.0));
    }

    #[test]
    fn test_calculate_requires_request() {
        assert!(Cli::try_parse_from(["groundwork", "calculate"]).is_err());
    }

    #[test]
    fn test_convert_output() {
        let output = run(&cli(&["groundwork", "convert", "20", "6"])).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["decimal_feet"], 20.5);
        assert_eq!(json["display"], "20' 6\"");
    }

    #[test]
    fn test_convert_rejects_twelve_inches() {
        let err = run(&cli(&["groundwork", "convert", "4", "12"])).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_templates_for_one_job_type() {
        let output = run(&cli(&["groundwork", "templates", "--job-type", "step_run"])).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json.as_array().map(|a| a.len()), Some(1));
        assert_eq!(json[0]["fields"][0]["key"], "step_count");
    }

    #[test]
    fn test_materials_filter() {
        let output = run(&cli(&["groundwork", "materials", "--type", "brick", "--human"])).unwrap();
        assert!(output.contains("clay_brick_red"));
        assert!(!output.contains("concrete_block_8x8x16"));
    }

    #[test]
    fn test_calculate_from_file() {
        let path = std::env::temp_dir().join("groundwork_cli_request.json");
        std::fs::write(
            &path,
            r#"{"job_type": "retaining_wall", "material_id": "concrete_block_8x8x16",
                "measurements": {"length": 20, "height": 4, "depth": 1},
                "include_base": true, "include_cap": true}"#,
        )
        .unwrap();

        let args = ["groundwork", "calculate", "--request", path.to_str().unwrap()];
        let output = run(&cli(&args)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["result"]["total_cost"], 546.0);
        assert!(json["result"]["total_volume_cu_yd"].as_f64().unwrap() > 0.0);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_calculate_missing_file() {
        let err = run(&cli(&["groundwork", "calculate", "--request", "/nonexistent/job.json"])).unwrap_err();
        assert!(matches!(err, CalcError::FileError { .. }));
    }
}
