use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use visa_core::view::ResultView;
use visa_core::{
    export_report, validate_step, ApplicationData, EligibilityResult, PdfReport, ScoreDelta, Step,
    Wizard,
};
use visa_runtime::{
    parse_result, AssessmentError, AssessmentRequest, Assessor, CompletionConfig, FixedAssessor,
    LlmAssessor, ProviderError, ProviderRegistry, Session,
};

use crate::config::AppConfig;
use crate::render::{render_errors, render_result, RECOVERY_SCREEN};
use crate::repl::Repl;
use crate::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "visa-sim",
    about = "Simulate a UK Standard Visitor visa eligibility assessment",
    version
)]
struct Cli {
    /// Replay a saved result file instead of calling the AI service
    #[arg(long, global = true, value_name = "RESULT_JSON")]
    replay: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk through the application step by step (default command)
    Wizard(WizardArgs),
    /// Assess an application file in one shot
    Assess(AssessArgs),
    /// Print validation errors for each step of an application file
    Validate {
        /// Application file (YAML or JSON)
        application: PathBuf,
    },
    /// Write the PDF report for a saved result
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
struct WizardArgs {
    /// Prefill the form from an application file
    #[arg(long, value_name = "FILE")]
    from: Option<PathBuf>,
    /// Directory for exported reports
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// Application file (YAML or JSON)
    application: PathBuf,
    /// Earlier result to compare against (runs a what-if assessment)
    #[arg(long, value_name = "RESULT_JSON")]
    baseline: Option<PathBuf>,
    /// Print the raw result JSON instead of the formatted view
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Application file (YAML or JSON)
    application: PathBuf,
    /// Result file (JSON)
    result: PathBuf,
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    telemetry::init(&config.telemetry).context("failed to initialise logging")?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Wizard(WizardArgs::default()));

    match command {
        Command::Wizard(args) => {
            // A missing API key should not stop the form from being filled
            // in; submissions then fail with the usual notice.
            let assessor = match build_assessor(&config, cli.replay.as_deref()) {
                Ok(assessor) => assessor,
                Err(e) if cli.replay.is_none() => {
                    tracing::warn!(error = %format!("{:#}", e), "Assessment service unavailable");
                    Arc::new(Unavailable(format!("{:#}", e)))
                }
                Err(e) => return Err(e),
            };
            run_wizard(assessor, args).await
        }
        Command::Assess(args) => {
            let assessor = build_assessor(&config, cli.replay.as_deref())?;
            run_assess(assessor.as_ref(), args).await
        }
        Command::Validate { application } => run_validate(&application),
        Command::Export(args) => run_export(args),
    }
}

/// The configured model assessor, or a replay of a saved result.
pub fn build_assessor(config: &AppConfig, replay: Option<&Path>) -> Result<Arc<dyn Assessor>> {
    if let Some(path) = replay {
        let assessor = FixedAssessor::from_json(&read(path)?)
            .with_context(|| format!("invalid result file {}", path.display()))?;
        tracing::info!(file = %path.display(), "Replaying saved result");
        return Ok(Arc::new(assessor));
    }

    let provider_config = config.provider.to_json();
    let provider = ProviderRegistry::with_defaults()
        .create(&config.provider.kind, &provider_config)
        .context("failed to configure the assessment provider")?;
    let completion = CompletionConfig::from_json(&provider_config)?;
    let assessor = LlmAssessor::new(provider, completion)?.with_retry(config.provider.retry_policy());

    tracing::info!(provider = %config.provider.kind, model = %config.provider.model, "Assessor ready");
    Ok(Arc::new(assessor))
}

/// Stands in when no provider could be built.
struct Unavailable(String);

#[async_trait]
impl Assessor for Unavailable {
    async fn assess(&self, _: &AssessmentRequest) -> Result<EligibilityResult, AssessmentError> {
        Err(ProviderError::NotConfigured(self.0.clone()).into())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

async fn run_wizard(assessor: Arc<dyn Assessor>, args: WizardArgs) -> Result<()> {
    let prefill = args.from.as_deref().map(load_application).transpose()?;

    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "Unhandled defect");
    }));

    // One reader for the whole run so lines buffered before a crash are not lost.
    let stdin = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin())));

    loop {
        let wizard = match &prefill {
            Some(data) => Wizard::new().with_data(data.clone()),
            None => Wizard::new(),
        };
        let session = Session::new(wizard, assessor.clone());
        let out_dir = args.out_dir.clone();

        let input = stdin.clone();
        let task = tokio::spawn(async move {
            let mut input = input.lock_owned().await;
            let mut repl = Repl::new(session, &mut *input, std::io::stdout()).with_export_dir(out_dir);
            repl.run().await
        });

        match task.await {
            Ok(outcome) => return outcome.context("terminal I/O failed"),
            Err(e) if e.is_panic() => {
                print!("{}", RECOVERY_SCREEN);
                let mut input = stdin.lock().await;
                if !confirm_restart(&mut *input).await? {
                    return Ok(());
                }
            }
            Err(e) => return Err(e).context("wizard task was cancelled"),
        }
    }
}

async fn confirm_restart<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<bool> {
    println!("Restart the application? [y/N]");
    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn run_assess(assessor: &dyn Assessor, args: AssessArgs) -> Result<()> {
    let data = load_application(&args.application)?;
    let baseline = args.baseline.as_deref().map(load_result).transpose()?;

    let request = AssessmentRequest::new(
        data,
        baseline.as_ref().map(EligibilityResult::baseline_summary),
        Local::now().date_naive(),
    );
    let result = assessor.assess(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let delta = baseline.as_ref().map(|b| ScoreDelta::between(b, &result));
        print!("{}", render_result(&ResultView::build(&result, delta)));
    }
    Ok(())
}

fn run_validate(path: &Path) -> Result<()> {
    let data = load_application(path)?;
    let mut failing = 0;

    for step in Step::FORM_STEPS {
        let errors = validate_step(&data, step);
        if errors.is_empty() {
            println!("Step {} {}: ok", step.number(), step.title());
        } else {
            failing += 1;
            println!("Step {} {}:", step.number(), step.title());
            print!("{}", render_errors(&errors));
        }
    }

    if failing > 0 {
        bail!("{} step(s) have validation errors", failing);
    }
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<()> {
    let data = load_application(&args.application)?;
    let result = load_result(&args.result)?;
    let path = export_report(
        &PdfReport,
        &args.out_dir,
        &data,
        Some(&result),
        Local::now().date_naive(),
    )?;
    println!("Report saved to {}", path.display());
    Ok(())
}

fn load_application(path: &Path) -> Result<ApplicationData> {
    ApplicationData::from_file(path)
        .with_context(|| format!("failed to load application {}", path.display()))
}

fn load_result(path: &Path) -> Result<EligibilityResult> {
    parse_result(&read(path)?).with_context(|| format!("invalid result file {}", path.display()))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const RESULT: &str = r#"{"score": 64, "riskLevel": "Medium", "summary": "Fair.",
        "strengths": [], "weaknesses": [], "recommendations": [], "guidanceReferences": []}"#;

    #[tokio::test]
    async fn test_restart_prompt_reads_shared_input() {
        let mut input: &[u8] = b"yes\nset personalInfo.givenName Ada\n";
        assert!(confirm_restart(&mut input).await.unwrap());
        assert_eq!(input, b"set personalInfo.givenName Ada\n");

        let mut input: &[u8] = b"n\n";
        assert!(!confirm_restart(&mut input).await.unwrap());
        let mut input: &[u8] = b"";
        assert!(!confirm_restart(&mut input).await.unwrap());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_assess_with_global_replay() {
        let cli = Cli::try_parse_from([
            "visa-sim", "assess", "app.yaml", "--baseline", "before.json", "--replay", "r.json",
        ])
        .unwrap();
        assert_eq!(cli.replay, Some(PathBuf::from("r.json")));
        match cli.command {
            Some(Command::Assess(args)) => {
                assert_eq!(args.application, PathBuf::from("app.yaml"));
                assert_eq!(args.baseline, Some(PathBuf::from("before.json")));
                assert!(!args.json);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_subcommand_defaults_to_wizard() {
        let cli = Cli::try_parse_from(["visa-sim"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[tokio::test]
    async fn test_replay_assessor_returns_saved_result() {
        let dir = std::env::temp_dir().join(format!("visa-sim-replay-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("result.json");
        fs::write(&path, RESULT).unwrap();

        let config = AppConfig::from_lookup(|_| None).unwrap();
        let assessor = build_assessor(&config, Some(&path)).unwrap();
        let request = AssessmentRequest::new(
            ApplicationData::default(),
            None,
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        );
        let result = assessor.assess(&request).await.unwrap();

        assert_eq!(result.score, 64.0);
        assert_eq!(assessor.name(), "replay");
        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_unavailable_assessor_fails_with_generic_error() {
        let request = AssessmentRequest::new(
            ApplicationData::default(),
            None,
            chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        );
        let err = Unavailable("no key".to_string()).assess(&request).await.unwrap_err();
        assert!(err.to_string().starts_with("Could not complete visa assessment"));
    }

    fn demo(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
    }

    #[test]
    fn test_demo_application_passes_every_step() {
        let data = load_application(&demo("application.yaml")).unwrap();
        assert_eq!(data.travel_details.duration_days, 14);
        assert!(run_validate(&demo("application.yaml")).is_ok());
    }

    #[test]
    fn test_export_writes_named_pdf() {
        let out_dir = std::env::temp_dir().join(format!("visa-sim-export-{}", std::process::id()));
        fs::create_dir_all(&out_dir).unwrap();

        run_export(ExportArgs {
            application: demo("application.yaml"),
            result: demo("result.json"),
            out_dir: out_dir.clone(),
        })
        .unwrap();

        let written: Vec<_> = fs::read_dir(&out_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with("UK_Visa_Assessment_Sharma_"));
        assert!(fs::read(out_dir.join(&written[0])).unwrap().starts_with(b"%PDF-1.4"));
        fs::remove_dir_all(&out_dir).ok();
    }

    #[test]
    fn test_missing_replay_file_is_error() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert!(build_assessor(&config, Some(Path::new("/nonexistent/result.json"))).is_err());
    }
}
