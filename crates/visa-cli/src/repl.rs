//! Interactive wizard over a line-oriented terminal.

use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use visa_core::application::{ACCOMMODATION_TYPES, COUNTRIES, MARITAL_STATUSES, RESIDENTIAL_STATUSES};
use visa_core::view::{code_sent_notice, review_copy, VERIFIED_NOTICE};
use visa_core::{Navigation, WizardError};
use visa_runtime::Session;

use crate::render::{render_errors, render_step};

const HELP: &str = "\
Commands:
  show                     redraw the current step
  set <path> <value>       set a field, e.g. set finances.monthlyIncome 2500
  next | back              move between steps
  choices <list>           countries, marital, accommodation, residential
  send-code                send the email verification code (review step)
  verify <code>            enter the verification code
  submit                   run the assessment (review step)
  what-if                  edit your answers and compare against this score
  new                      start a new application
  export [dir]             save the PDF report
  quit                     leave
";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Show,
    Set { path: String, value: String },
    Next,
    Back,
    Choices(String),
    SendCode,
    Verify(String),
    Submit,
    WhatIf,
    New,
    Export(Option<PathBuf>),
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "show" => Command::Show,
            "set" => {
                let (path, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if path.is_empty() {
                    return Err("usage: set <path> <value>".to_string());
                }
                Command::Set {
                    path: path.to_string(),
                    value: value.trim().to_string(),
                }
            }
            "next" => Command::Next,
            "back" => Command::Back,
            "choices" => Command::Choices(rest.to_ascii_lowercase()),
            "send-code" => Command::SendCode,
            "verify" if !rest.is_empty() => Command::Verify(rest.to_string()),
            "verify" => return Err("usage: verify <code>".to_string()),
            "submit" => Command::Submit,
            "what-if" => Command::WhatIf,
            "new" => Command::New,
            "export" => Command::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}'; type help", other)),
        };
        Ok(Some(command))
    }
}

/// Drives a [`Session`] from text commands.
pub struct Repl<R, W> {
    session: Session,
    input: R,
    output: W,
    export_dir: PathBuf,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(session: Session, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
            export_dir: PathBuf::from("."),
        }
    }

    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = dir;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_parts(self) -> (Session, W) {
        (self.session, self.output)
    }

    /// Read commands until `quit` or end of input.
    pub async fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "UK Visitor Visa Eligibility Simulator (type help for commands)")?;
        self.show()?;

        let mut line = String::new();
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line).await? == 0 {
                break;
            }

            match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.execute(command).await?,
                Ok(None) => {}
                Err(message) => writeln!(self.output, "{}", message)?,
            }
        }
        Ok(())
    }

    pub async fn execute(&mut self, command: Command) -> io::Result<()> {
        tracing::debug!(?command, step = %self.session.wizard().step(), "Command");

        match command {
            Command::Help => write!(self.output, "{}", HELP),
            Command::Show => self.show(),
            Command::Set { path, value } => {
                match self.session.wizard_mut().set_field_from_input(&path, &value) {
                    Ok(()) => writeln!(self.output, "ok"),
                    Err(e) => self.fail(&e),
                }
            }
            Command::Next => {
                let outcome = self.session.wizard_mut().next();
                self.navigated(outcome)
            }
            Command::Back => {
                let outcome = self.session.wizard_mut().previous();
                self.navigated(outcome)
            }
            Command::Choices(list) => self.choices(&list),
            Command::SendCode => match self.session.wizard_mut().send_code() {
                Ok(code) => {
                    let email = self.session.wizard().data().personal_info.email.clone();
                    writeln!(self.output, "{}", code_sent_notice(&email, &code))
                }
                Err(e) => self.fail(&e),
            },
            Command::Verify(code) => match self.session.wizard_mut().verify_code(&code) {
                Ok(()) => {
                    writeln!(self.output, "{}", VERIFIED_NOTICE)?;
                    let action = review_copy(self.session.wizard().is_simulation_mode()).action;
                    writeln!(self.output, "  [{}] run: submit", action)
                }
                Err(e) => self.fail(&e),
            },
            Command::Submit => self.submit().await,
            Command::WhatIf => {
                let outcome = self.session.wizard_mut().enter_simulation();
                self.navigated(outcome)
            }
            Command::New => match self.session.wizard_mut().reset() {
                Ok(_) => self.show(),
                Err(e) => self.fail(&e),
            },
            Command::Export(dir) => {
                let dir = dir.unwrap_or_else(|| self.export_dir.clone());
                match self.session.export(&dir) {
                    Ok(path) => writeln!(self.output, "Report saved to {}", path.display()),
                    Err(e) => writeln!(self.output, "{}", e.notice()),
                }
            }
            Command::Quit => Ok(()),
        }
    }

    async fn submit(&mut self) -> io::Result<()> {
        let action = review_copy(self.session.wizard().is_simulation_mode()).action;
        writeln!(self.output, "{}: analyzing...", action)?;
        self.output.flush()?;

        match self.session.submit().await {
            Ok(_) => self.show(),
            Err(e) => writeln!(self.output, "{}", e.notice()),
        }
    }

    fn navigated(&mut self, outcome: Result<Navigation, WizardError>) -> io::Result<()> {
        match outcome {
            Ok(nav) if nav.scroll_to_top() => self.show(),
            Ok(_) => writeln!(self.output, "Already on the first step."),
            Err(e) => self.fail(&e),
        }
    }

    fn fail(&mut self, error: &WizardError) -> io::Result<()> {
        writeln!(self.output, "{}", error)?;
        if let WizardError::StepInvalid { errors, .. } = error {
            write!(self.output, "{}", render_errors(errors))?;
        }
        Ok(())
    }

    fn choices(&mut self, list: &str) -> io::Result<()> {
        let items: &[&str] = match list {
            "countries" | "nationality" => COUNTRIES,
            "marital" => MARITAL_STATUSES,
            "accommodation" => ACCOMMODATION_TYPES,
            "residential" => RESIDENTIAL_STATUSES,
            _ => {
                return writeln!(
                    self.output,
                    "usage: choices <countries|marital|accommodation|residential>"
                )
            }
        };
        writeln!(self.output, "{}", items.join(", "))
    }

    fn show(&mut self) -> io::Result<()> {
        write!(self.output, "{}", render_step(self.session.wizard()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use visa_core::{CodeSource, EligibilityResult, RiskLevel, Step, Wizard};
    use visa_runtime::FixedAssessor;

    struct Code;

    impl CodeSource for Code {
        fn next_code(&mut self) -> String {
            "246810".to_string()
        }
    }

    fn session() -> Session {
        let result = EligibilityResult {
            score: 82.0,
            risk_level: RiskLevel::Low,
            summary: "Strong ties to home.".to_string(),
            strengths: vec!["Permanent job".to_string()],
            weaknesses: vec![],
            recommendations: vec![],
            guidance_references: vec![],
            scenario_delta_explanation: None,
        };
        Session::new(
            Wizard::with_code_source(Box::new(Code)),
            Arc::new(FixedAssessor::new(result)),
        )
        .with_today(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    async fn run_script(script: &str) -> (Session, String) {
        let mut repl = Repl::new(session(), script.as_bytes(), Vec::new());
        repl.run().await.unwrap();
        let (session, out) = repl.into_parts();
        (session, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("set personalInfo.givenName Mary Jane").unwrap(),
            Some(Command::Set {
                path: "personalInfo.givenName".to_string(),
                value: "Mary Jane".to_string(),
            })
        );
        assert_eq!(Command::parse("  ").unwrap(), None);
        assert_eq!(Command::parse("EXPORT out").unwrap(), Some(Command::Export(Some("out".into()))));
        assert!(Command::parse("verify").is_err());
        assert!(Command::parse("fly").is_err());
    }

    #[tokio::test]
    async fn test_next_blocked_on_invalid_step() {
        let (session, out) = run_script("next\n").await;
        assert_eq!(session.wizard().step(), Step::PersonalIdentity);
        assert!(out.contains("Please fix"));
        assert!(out.contains("nationality: Nationality is required"));
    }

    #[tokio::test]
    async fn test_full_run_to_results() {
        let script = "\
set personalInfo.givenName Ada
set personalInfo.familyName Lovelace
set personalInfo.nationality India
set personalInfo.email ada@example.com
next
next
next
next
submit
send-code
verify 111111
verify 246810
submit
quit
";
        let (session, out) = run_script(script).await;

        assert_eq!(session.wizard().step(), Step::Results);
        assert!(out.contains("Please verify your email first"));
        assert!(out.contains("your code is 246810"));
        assert!(out.contains("Invalid verification code"));
        assert!(out.contains(VERIFIED_NOTICE));
        assert!(out.contains("Score: 82/100 (good)"));
        assert!(out.contains("LOW RISK PROFILE"));
    }

    #[tokio::test]
    async fn test_choices_and_back_on_first_step() {
        let (_, out) = run_script("choices marital\nback\n").await;
        assert!(out.contains("Single, Married, Civil Partnership"));
        assert!(out.contains("Already on the first step."));
    }

    #[tokio::test]
    async fn test_export_without_result_reports_failure() {
        let (session, out) = run_script("export\n").await;
        assert!(out.contains("Export failed"));
        assert_eq!(session.wizard().step(), Step::PersonalIdentity);
    }
}
