use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use dose_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "highcalc")]
#[command(about = "Cannabis high-level estimator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Load configuration from this file instead of the default path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show engine logs (info level)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record an inhalation session and show the updated level
    Log {
        /// Inhaled volume in liters
        #[arg(long)]
        volume: f64,

        /// THC concentration as a fraction (0.15 = 15%)
        #[arg(long)]
        thc: Option<f64>,

        /// Seconds the inhalation was held
        #[arg(long = "inhale")]
        inhale_seconds: f64,

        /// Strain (sativa, indica, hybrid; anything else is neutral)
        #[arg(long, default_value = "hybrid")]
        strain: String,

        /// Usage frequency (daily, weekly, monthly); defaults to the profile
        #[arg(long)]
        frequency: Option<String>,

        /// Body weight; defaults to the profile
        #[arg(long)]
        weight: Option<f64>,

        /// Unit of --weight (kg or lb)
        #[arg(long, default_value = "kg")]
        weight_unit: String,

        /// Hours since the session happened (default: now)
        #[arg(long)]
        hours_ago: Option<f64>,

        /// Score the session without recording it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the cumulative and current level (default)
    Status,

    /// Update the stored profile
    Profile {
        #[arg(long)]
        weight: Option<f64>,

        #[arg(long, default_value = "kg")]
        weight_unit: String,

        #[arg(long)]
        frequency: Option<String>,

        #[arg(long)]
        height_cm: Option<f64>,

        #[arg(long)]
        sex: Option<String>,
    },

    /// Clear the session history
    Clear,

    /// Export scored session history to CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

struct Paths {
    wal: PathBuf,
    profile: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        Self {
            wal: data_dir.join("log").join("sessions.wal"),
            profile: data_dir.join("profile.json"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        dose_core::logging::init_with_level("info");
    } else {
        dose_core::logging::init();
    }

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);

    match cli.command {
        Some(Commands::Log {
            volume,
            thc,
            inhale_seconds,
            strain,
            frequency,
            weight,
            weight_unit,
            hours_ago,
            dry_run,
        }) => {
            let args = LogArgs {
                volume,
                thc,
                inhale_seconds,
                strain,
                frequency,
                weight,
                weight_unit,
                hours_ago,
                dry_run,
            };
            cmd_log(&paths, &config, args)
        }
        Some(Commands::Status) | None => cmd_status(&paths, &config),
        Some(Commands::Profile {
            weight,
            weight_unit,
            frequency,
            height_cm,
            sex,
        }) => cmd_profile(&paths, weight, &weight_unit, frequency, height_cm, sex),
        Some(Commands::Clear) => cmd_clear(&paths),
        Some(Commands::Export { out }) => cmd_export(&paths, &config, &out),
    }
}

struct LogArgs {
    volume: f64,
    thc: Option<f64>,
    inhale_seconds: f64,
    strain: String,
    frequency: Option<String>,
    weight: Option<f64>,
    weight_unit: String,
    hours_ago: Option<f64>,
    dry_run: bool,
}

fn cmd_log(paths: &Paths, config: &Config, args: LogArgs) -> Result<()> {
    let profile = UserProfile::load(&paths.profile)?;
    let unit: WeightUnit = args.weight_unit.parse()?;

    let body_weight_kg = match (args.weight, profile.body_weight_kg) {
        (Some(weight), _) => unit.to_kg(weight),
        (None, Some(stored)) => stored,
        (None, None) => {
            return Err(Error::invalid(
                "body_weight_kg",
                "no --weight given and no weight stored in the profile",
            ))
        }
    };

    let frequency = match (args.frequency, profile.frequency.clone()) {
        (Some(f), _) => Frequency::from(f),
        (None, Some(stored)) => stored,
        (None, None) => Frequency::Unknown,
    };

    let input = SessionInput {
        volume_liters: args.volume,
        thc_concentration: args
            .thc
            .unwrap_or(config.scoring.default_thc_concentration),
        inhalation_seconds: args.inhale_seconds,
        strain: Strain::from(args.strain),
        frequency,
        body_weight_kg,
        physiology: profile.physiology(),
    };

    let now = Utc::now();
    let recorded_at = session_time(now, args.hours_ago)?;
    let session = SessionRecord::create(input, recorded_at)?;
    // Score before persisting so an unscorable session never reaches the log
    let session_score = score_session(&session, &config.scoring)?;

    let mut log = load_recent_sessions(&paths.wal, config.history.window_hours, now)?;
    log.push(session.clone());
    let report = evaluate(log.as_slice(), &config.scoring, Some(now))?;

    println!("\nSession score: {:.2}", session_score);

    if args.dry_run {
        println!("[Dry run - session not recorded]");
    } else {
        let mut sink = JsonlSink::new(&paths.wal);
        sink.append(&session)?;
        tracing::info!("Recorded session {} to {:?}", session.id, sink.path());
        println!("✓ Session recorded");
    }

    display_report(&report);
    Ok(())
}

/// When a session happened, given how many hours ago it was
fn session_time(now: DateTime<Utc>, hours_ago: Option<f64>) -> Result<DateTime<Utc>> {
    let Some(hours) = hours_ago else {
        return Ok(now);
    };
    if !hours.is_finite() || hours < 0.0 {
        return Err(Error::invalid(
            "hours_ago",
            format!("{} must be a finite number >= 0", hours),
        ));
    }

    // `as` saturates, and the checked ops reject anything past chrono's range
    let millis = (hours * 3_600_000.0).round() as i64;
    Duration::try_milliseconds(millis)
        .and_then(|elapsed| now.checked_sub_signed(elapsed))
        .ok_or_else(|| Error::invalid("hours_ago", format!("{} hours is out of range", hours)))
}

fn cmd_status(paths: &Paths, config: &Config) -> Result<()> {
    let now = Utc::now();
    let log = load_recent_sessions(&paths.wal, config.history.window_hours, now)?;
    let report = evaluate(log.as_slice(), &config.scoring, Some(now))?;

    display_report(&report);
    Ok(())
}

fn cmd_profile(
    paths: &Paths,
    weight: Option<f64>,
    weight_unit: &str,
    frequency: Option<String>,
    height_cm: Option<f64>,
    sex: Option<String>,
) -> Result<()> {
    let unit: WeightUnit = weight_unit.parse()?;

    let profile = UserProfile::update(&paths.profile, |profile| {
        if let Some(weight) = weight {
            let kg = unit.to_kg(weight);
            if !kg.is_finite() || kg <= 0.0 {
                return Err(Error::invalid("body_weight_kg", format!("{} must be positive", kg)));
            }
            profile.body_weight_kg = Some(kg);
        }
        if let Some(frequency) = frequency {
            profile.frequency = Some(Frequency::from(frequency));
        }
        if let Some(height_cm) = height_cm {
            if !height_cm.is_finite() || height_cm <= 0.0 {
                return Err(Error::invalid(
                    "height_cm",
                    format!("{} must be positive", height_cm),
                ));
            }
            profile.height_cm = Some(height_cm);
        }
        if let Some(sex) = sex {
            profile.sex = Some(Sex::from(sex));
        }
        Ok(())
    })?;

    println!("Profile");
    match profile.body_weight_kg {
        Some(kg) => println!("  Body weight: {:.1} kg", kg),
        None => println!("  Body weight: (not set)"),
    }
    match profile.frequency {
        Some(ref f) => println!("  Frequency:   {}", f),
        None => println!("  Frequency:   (not set)"),
    }
    if let Some(height_cm) = profile.height_cm {
        println!("  Height:      {:.0} cm", height_cm);
    }
    if let Some(ref sex) = profile.sex {
        println!("  Sex:         {}", sex.as_str());
    }

    Ok(())
}

fn cmd_clear(paths: &Paths) -> Result<()> {
    let removed = dose_core::wal::clear_sessions(&paths.wal)?;
    println!("✓ Cleared {} sessions", removed);
    println!("Cumulative High Level: 0.00");
    Ok(())
}

fn cmd_export(paths: &Paths, config: &Config, out: &Path) -> Result<()> {
    let log = load_valid_sessions(&paths.wal)?;
    let count = dose_core::csv_export::export_sessions(log.as_slice(), &config.scoring, out)?;

    println!("✓ Exported {} sessions", count);
    println!("  CSV: {}", out.display());
    Ok(())
}

fn display_report(report: &ScoreReport) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", report.tier.label().to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Cumulative High Level: {:.2}", report.raw_score);
    println!(
        "  Normalized: {:.2} / 100 (band {} - {})",
        report.normalized_score,
        report.tier.band(),
        report.tier
    );
    println!("  Sessions: {}", report.session_count);

    if let Some(ref decay) = report.decay {
        println!();
        println!(
            "  Current level: {:.2} ({})",
            decay.current_normalized, decay.current_tier
        );
        if decay.hours_until_unsaturated > 0.0 {
            println!(
                "  Saturated for another {}",
                format_hours(decay.hours_until_unsaturated)
            );
        }
        match decay.hours_until_zero {
            Some(hours) => println!("  Clears in ~{}", format_hours(hours)),
            None => println!("  Nothing to clear"),
        }
    }

    println!();
}

fn format_hours(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    format!("{}h {:02}m", total_minutes / 60, total_minutes % 60)
}
