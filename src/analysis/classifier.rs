use crate::config::ClassifierConfig;
use crate::material::Material;
use crate::session::Classification;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Image classification model
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Predict the material shown in the image at `image`
    async fn classify(&self, image: &Path) -> Result<Classification>;
}

/// Prediction as printed by the external model runner
#[derive(Debug, Deserialize)]
struct RawPrediction {
    label: String,
    confidence: f32,
}

/// Runs the model as an external process.
///
/// The process is invoked as `<command> <args...> <image path>` and must
/// print `{"label": "...", "confidence": 0.93}` on stdout.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    command: String,
    args: Vec<String>,
}

impl CommandClassifier {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    fn parse_output(stdout: &[u8]) -> Result<Classification> {
        let raw: RawPrediction =
            serde_json::from_slice(stdout).context("Classifier printed invalid JSON")?;

        let Some(label) = Material::from_label(&raw.label) else {
            bail!("Classifier returned unknown label {:?}", raw.label);
        };
        if !(0.0..=1.0).contains(&raw.confidence) {
            bail!("Classifier confidence {} outside [0, 1]", raw.confidence);
        }

        Ok(Classification {
            label,
            confidence: raw.confidence,
        })
    }
}

#[async_trait]
impl Classifier for CommandClassifier {
    async fn classify(&self, image: &Path) -> Result<Classification> {
        debug!("Classifying {} with {}", image.display(), self.command);

        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(image)
            .output()
            .await
            .with_context(|| format!("Failed to run classifier {}", self.command))?;

        if !output.status.success() {
            bail!(
                "Classifier exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let classification = Self::parse_output(&output.stdout)?;
        info!(
            "Prediction: {} ({})",
            classification.label,
            classification.confidence_percentage()
        );
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_output() {
        let c = CommandClassifier::parse_output(br#"{"label": "Plastico", "confidence": 0.93}"#)
            .unwrap();
        assert_eq!(c.label, Material::Plastic);
        assert_eq!(c.confidence, 0.93);
    }

    #[test]
    fn test_parse_rejects_bad_output() {
        assert!(CommandClassifier::parse_output(b"Plastico 0.93").is_err());
        assert!(
            CommandClassifier::parse_output(br#"{"label": "Madera", "confidence": 0.5}"#).is_err()
        );
        assert!(
            CommandClassifier::parse_output(br#"{"label": "Papel", "confidence": 1.5}"#).is_err()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_external_command() {
        let classifier = CommandClassifier::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"echo '{"label": "Latas", "confidence": 0.61}'"#.to_string(),
            ],
        );

        let c = classifier.classify(Path::new("ignored.jpg")).await.unwrap();
        assert_eq!(c.label, Material::Cans);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_an_error() {
        let classifier = CommandClassifier::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);
        assert!(classifier.classify(Path::new("x.jpg")).await.is_err());
    }
}
