pub mod providers;

use std::path::PathBuf;

use image::DynamicImage;
use log::{info, warn};

use crate::{
    Candidate, ComparisonRequest, QualityAssessor,
    analysis::pose::Keypoint,
    error::Result,
    report::ComparisonReport,
};

#[derive(Debug, Clone, Copy)]
pub struct CorrectionRequest<'a> {
    pub background: &'a DynamicImage,
    pub mask: &'a DynamicImage,
    pub original: &'a DynamicImage,
    pub prompt: &'a str,
}

pub trait CorrectionProvider: Send + Sync {
    fn name(&self) -> &str;

    fn label(&self) -> &str {
        self.name()
    }

    // Ok(None) and Err both mean no candidate was produced
    fn correct(&self, request: &CorrectionRequest<'_>) -> Result<Option<DynamicImage>>;
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: Option<PathBuf>,
    pub report_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            report_file_name: "correction_comparison.json".to_string(),
        }
    }
}

pub struct CorrectionPipeline {
    providers: Vec<Box<dyn CorrectionProvider>>,
    assessor: QualityAssessor,
    config: PipelineConfig,
}

impl CorrectionPipeline {
    pub fn new(assessor: QualityAssessor) -> Self {
        Self {
            providers: Vec::new(),
            assessor,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_provider<P: CorrectionProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn run(
        &self,
        request: &CorrectionRequest<'_>,
        style_reference: Option<&DynamicImage>,
        keypoints: Option<&[Keypoint]>,
    ) -> Result<ComparisonReport> {
        let alternates = self.providers.iter().map(|provider| {
            let image = match provider.correct(request) {
                Ok(Some(image)) => {
                    info!("{} correction completed", provider.name());
                    Some(image)
                }
                Ok(None) => {
                    warn!("{} correction produced no image", provider.name());
                    None
                }
                Err(err) => {
                    warn!("{} correction failed: {}", provider.name(), err);
                    None
                }
            };

            Candidate {
                name: provider.name().to_string(),
                label: Some(provider.label().to_string()),
                image,
            }
        });

        let mut comparison = ComparisonRequest::new(request.background, request.mask, request.original.clone());
        for alternate in alternates {
            comparison = comparison.with_alternate(alternate);
        }
        if let Some(style) = style_reference {
            comparison = comparison.with_style_reference(style);
        }
        if let Some(points) = keypoints {
            comparison = comparison.with_keypoints(points);
        }

        let report = self.assessor.compare(&comparison)?;

        if let Some(dir) = &self.config.output_dir {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(&self.config.report_file_name);
            report.save_json(&path)?;
            info!("comparison report written to {}", path.display());
        }

        Ok(report)
    }
}
