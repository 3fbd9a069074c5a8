//! HTML to PDF rendering.
//!
//! The renderer writes the filled HTML into a temporary directory, runs an
//! external converter (wkhtmltopdf, weasyprint, ...) and reads the PDF back.

use std::fs;
use std::process::Command;
use tempfile::tempdir;

use super::GeneratorError;

const INPUT_FILE: &str = "document.html";
const OUTPUT_FILE: &str = "document.pdf";

/// Turns filled HTML into PDF bytes.
pub trait PdfRenderer: Send + Sync {
    fn render_pdf(&self, html: &str) -> Result<Vec<u8>, GeneratorError>;
}

/// Runs `<program> [args..] <input.html> <output.pdf>`.
#[derive(Debug, Clone)]
pub struct CommandPdfRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandPdfRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace separated command line such as
    /// `wkhtmltopdf --quiet`. Returns `None` for a blank line.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl PdfRenderer for CommandPdfRenderer {
    fn render_pdf(&self, html: &str) -> Result<Vec<u8>, GeneratorError> {
        let temp_dir = tempdir().map_err(GeneratorError::TempDir)?;
        let input_path = temp_dir.path().join(INPUT_FILE);
        let output_path = temp_dir.path().join(OUTPUT_FILE);

        fs::write(&input_path, html).map_err(GeneratorError::WriteHtml)?;

        log::debug!("Running PDF renderer '{}'", self.program);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&input_path)
            .arg(&output_path)
            .current_dir(temp_dir.path())
            .status()
            .map_err(GeneratorError::RendererIo)?;

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            log::error!("PDF renderer '{}' exited with status {}", self.program, code);
            return Err(GeneratorError::RendererExit(code));
        }

        fs::read(&output_path).map_err(GeneratorError::ReadPdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command_line() {
        let renderer = CommandPdfRenderer::from_command_line("wkhtmltopdf --quiet -s A4").unwrap();
        assert_eq!(renderer.program(), "wkhtmltopdf");
        assert_eq!(renderer.args, vec!["--quiet", "-s", "A4"]);
        assert!(CommandPdfRenderer::from_command_line("   ").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_render_with_copy_command() {
        let renderer = CommandPdfRenderer::new("cp", Vec::new());
        let bytes = renderer.render_pdf("<p>hello</p>").unwrap();
        assert_eq!(bytes, b"<p>hello</p>");
    }

    #[cfg(unix)]
    #[test]
    fn test_render_failing_command() {
        let renderer = CommandPdfRenderer::new("false", Vec::new());
        assert!(matches!(
            renderer.render_pdf("<p></p>"),
            Err(GeneratorError::RendererExit(_))
        ));
    }

    #[test]
    fn test_render_missing_program() {
        let renderer = CommandPdfRenderer::new("definitely-not-a-pdf-renderer-xyz", Vec::new());
        assert!(matches!(
            renderer.render_pdf("<p></p>"),
            Err(GeneratorError::RendererIo(_))
        ));
    }
}
