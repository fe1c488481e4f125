//! Prompt-driven flow: one question per input, then the result table and
//! optional exports.

use std::io::{self, BufRead, Write};
use std::path::Path;

use sprocket_core::fields::MeasurementField;
use sprocket_core::form::{FormEdit, PcdMode, SprocketForm};
use sprocket_core::presenter::{pcd_preview_line, ResultView};
use sprocket_core::request::RateField;
use sprocket_core::units::LengthUnit;
use sprocket_core::{CalculationService, Session};

use crate::cli::LengthArg;

/// Line-oriented prompt over any reader/writer pair
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Ask a question; `None` on end of input
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    /// Ask for a length such as `12.7` or `0.5in`. Blank or unreadable input counts as empty.
    fn ask_length(&mut self, field: MeasurementField) -> io::Result<Option<LengthArg>> {
        let answer = self.ask(&format!("{} (mm, or add 'in') []: ", field.label()))?;
        Ok(answer.and_then(|text| text.parse().ok()))
    }

    fn ask_yes_no(&mut self, prompt: &str) -> io::Result<bool> {
        let answer = self.ask(prompt)?.unwrap_or_default();
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    /// Fill a form from answers. Unanswered fields stay empty and count as 0.
    pub fn fill_form(&mut self) -> io::Result<SprocketForm> {
        let mut form = SprocketForm::new();

        if let Some(chain_type) = self.ask("Chain type (e.g. Simplex) []: ")? {
            form.apply(FormEdit::ChainType(chain_type));
        }

        set_length(&mut form, MeasurementField::ChainPitch, self.ask_length(MeasurementField::ChainPitch)?);
        let teeth = self.ask("Number of teeth []: ")?.unwrap_or_default();
        let update = form.apply(FormEdit::Teeth(teeth));
        if update.pcd_suggestion.is_some() {
            let pitch = form.measurement(MeasurementField::ChainPitch).canonical();
            let line = pcd_preview_line(pitch, form.number_of_teeth.unwrap_or(0.0));
            self.say(&line)?;
        }

        let manual = self.ask("PCD: press Enter for automatic, or type a value (mm, or add 'in'): ")?;
        if let Some(length) = manual.and_then(|text| text.parse::<LengthArg>().ok()) {
            form.apply(FormEdit::SelectPcd(PcdMode::Manual));
            set_length(&mut form, MeasurementField::ManualPcd, Some(length));
        }

        for field in [
            MeasurementField::ChainRollerDiameter,
            MeasurementField::OuterDiameter,
            MeasurementField::HubDiameter,
            MeasurementField::HubLength,
            MeasurementField::Zz,
        ] {
            let length = self.ask_length(field)?;
            set_length(&mut form, field, length);
        }

        for rate in RateField::ALL {
            if let Some(text) = self.ask(&format!("{} []: ", rate.label()))? {
                form.apply(FormEdit::rate(rate, text));
            }
        }

        Ok(form)
    }
}

fn set_length(form: &mut SprocketForm, field: MeasurementField, length: Option<LengthArg>) {
    match length {
        Some(length) => {
            form.apply(FormEdit::unit(field, length.unit));
            form.apply(FormEdit::measurement(field, length.value.to_string()));
        }
        None => form.set_measurement(field, None, LengthUnit::Millimeters),
    }
}

/// Run the whole interactive session on stdin/stdout.
pub async fn run<S: CalculationService>(session: &Session<S>, output_dir: &Path) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    prompter.say("Sprocket Cost Calculator")?;
    prompter.say("========================")?;
    prompter.say("")?;

    loop {
        let form = prompter.fill_form()?;
        prompter.say("")?;
        prompter.say("Calculating...")?;

        match session.submit(&form).await {
            Ok(stored) => {
                prompter.say("")?;
                prompter.say(&ResultView::build(&stored).to_text())?;

                if prompter.ask_yes_no("Export PDF report? [y/N]: ")? {
                    match session.export_pdf(output_dir) {
                        Ok(path) => prompter.say(&format!("Saved {}", path.display()))?,
                        Err(e) => prompter.say(&e.user_message())?,
                    }
                }
                if prompter.ask_yes_no("Export spreadsheet? [y/N]: ")? {
                    match session.export_spreadsheet(output_dir) {
                        Ok(path) => prompter.say(&format!("Saved {}", path.display()))?,
                        Err(e) => prompter.say(&e.user_message())?,
                    }
                }
            }
            Err(e) => prompter.say(&e.user_message())?,
        }

        prompter.say("")?;
        if !prompter.ask_yes_no("Calculate another? [y/N]: ")? {
            return Ok(());
        }
        prompter.say("")?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn fill(answers: &str) -> (SprocketForm, String) {
        let mut output = Vec::new();
        let form = {
            let mut prompter = Prompter::new(Cursor::new(answers.as_bytes()), &mut output);
            prompter.fill_form().unwrap()
        };
        (form, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_fill_form_with_units() {
        let answers = "Simplex\n0.5in\n40\n\n8.51\n170\n60\n40\n7.2\n95\n120\n35\n90\n80\n20\n";
        let (form, output) = fill(answers);

        assert!(output.contains("Automatic PCD: 161.70 mm"));
        assert_eq!(form.chain_type, "Simplex");
        assert_eq!(form.measurement(MeasurementField::ChainPitch).unit, LengthUnit::Inches);
        assert_eq!(form.pcd_mode, PcdMode::Automatic);

        let submission = form.submit();
        assert_eq!(submission.request.chain_pitch, 12.7);
        assert_eq!(submission.request.outer_diameter, 170.0);
        assert_eq!(submission.request.rates.hub_ht, 20.0);
    }

    #[test]
    fn test_manual_pcd_answer() {
        let answers = "\n12.7\n40\n100in\n";
        let (form, _) = fill(answers);

        assert_eq!(form.pcd_mode, PcdMode::Manual);
        assert_eq!(form.submit().request.pcd, 2540.0);
    }

    #[test]
    fn test_end_of_input_leaves_zeros() {
        let (form, _) = fill("");
        let request = form.submit().request;
        assert_eq!(request.chain_pitch, 0.0);
        assert_eq!(request.number_of_teeth, 0);
        assert_eq!(request.pcd, 0.0);
    }
}
